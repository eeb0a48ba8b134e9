pub mod config;
pub mod request;


pub use config::*;
pub use request::*;
