pub mod error;
pub mod schema;
pub mod stmt;

pub use error::{Error, ErrorCategory};

pub type Result<T, E = Error> = std::result::Result<T, E>;
