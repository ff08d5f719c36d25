pub mod aggregate;
pub mod error;
pub mod model;
pub mod parser;
