pub mod cost;
pub mod types;

pub use cost::*;
pub use types::*;
