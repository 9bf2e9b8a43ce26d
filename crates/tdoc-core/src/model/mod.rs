pub mod service;
pub mod types;

pub use service::*;
pub use types::*;
