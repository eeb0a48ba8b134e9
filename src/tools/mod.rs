pub mod launcher;
pub mod locator;

pub use launcher::*;
pub use locator::*;
