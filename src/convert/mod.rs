pub mod pipeline;
pub mod reconcile;

pub use pipeline::*;
pub use reconcile::*;
