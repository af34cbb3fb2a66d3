pub mod app;
pub mod db;
pub mod spec;

pub use spec::Cardinality;
