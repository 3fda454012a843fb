//! Configuration document and run options
//!
//! Parsing, mandatory-field schema and the fixed default tables.

pub mod defaults;
pub mod schema;
pub mod spec;
pub mod types;
