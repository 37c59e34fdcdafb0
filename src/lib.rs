pub mod common;
pub mod data;
pub mod error;
pub mod functions;

pub use data::Database;
pub use error::{Error, Result};
