//! RDF store implementations and interfaces

pub mod embedded;

pub use embedded::EmbeddedTriplestore;
