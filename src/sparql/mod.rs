//! SPARQL statement generation
//!
//! Everything in here is a pure transform: no statement is executed by this
//! module.

pub mod describe;
pub mod statements;

pub use describe::{describe, Description};
pub use statements::{delete_statement, describe_query, insert_statement, subject_node};
