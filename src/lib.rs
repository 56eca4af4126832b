//! # ldsync
//!
//! ldsync keeps the index of an external SPARQL triplestore consistent with
//! the resources held in an authoritative linked-data object repository.
//!
//! A change notification for a repository resource is normalized into a
//! [`ChangeEvent`], then a [`SyncPipeline`] run fetches the resource's current
//! RDF, removes the stale triples from the triplestore and inserts the current
//! ones, in that order.
//!
//! ## Features
//!
//! - Header-map normalization covering the common repository event vocabularies
//! - SPARQL 1.1 Update generation for delete and insert of a resource's triples
//! - HTTP clients for the repository and the triplestore update endpoint
//! - A webhook server and a one-shot CLI
//! - An embedded oxigraph triplestore for tests and local demos
//!
//! ## Example
//!
//! ```rust
//! use ldsync::events::normalizer::normalize;
//! use ldsync::Operation;
//! use std::collections::HashMap;
//!
//! fn example() -> ldsync::Result<()> {
//!     let mut headers = HashMap::new();
//!     headers.insert("identifier".to_string(), "/objects/123".to_string());
//!     headers.insert("base_url".to_string(), "http://repo/rest".to_string());
//!     headers.insert("operation".to_string(), "DELETE".to_string());
//!
//!     let event = normalize(&headers)?;
//!     assert_eq!(event.operation, Operation::Delete);
//!     assert_eq!(event.subject_uri(), "http://repo/rest/objects/123");
//!     Ok(())
//! }
//! # example().unwrap();
//! ```

#![warn(clippy::pedantic)]
#![allow(clippy::missing_errors_doc)]
#![allow(clippy::missing_panics_doc)]
#![allow(clippy::must_use_candidate)]
#![allow(clippy::uninlined_format_args)]
#![allow(clippy::module_name_repetitions)]
#![allow(clippy::doc_markdown)]

/// Core data structures and types
pub mod core;

/// Module for configuration management
pub mod config;

/// Inbound change events and their normalization
pub mod events;

/// SPARQL statement generation
pub mod sparql;

/// HTTP clients for the repository and the triplestore
pub mod clients;

/// The synchronization pipeline
pub mod pipeline;

/// Per-identifier serialization of sync runs
pub mod registry;

/// Embedded triplestore implementations
pub mod store;

/// HTTP webhook ingress
pub mod http;

pub mod logging;

pub mod error {
    //! Error types and result definitions

    use thiserror::Error;

    /// Result type alias for ldsync operations
    pub type Result<T> = std::result::Result<T, SyncError>;

    /// Main error type for ldsync.
    ///
    /// Input validation errors are surfaced before any network call and are not
    /// worth retrying. `Fetch`, `Delete` and `Insert` come from the network and
    /// can be retried by re-submitting the whole event.
    #[derive(Error, Debug, Clone, PartialEq, Eq)]
    pub enum SyncError {
        /// The event carried no repository base URL
        #[error("Missing base URL in change event")]
        MissingBaseUrl,

        /// The event carried no resource identifier
        #[error("Missing identifier in change event")]
        MissingIdentifier,

        /// The event named an operation we do not recognize
        #[error("Unknown operation: {0}")]
        UnknownOperation(String),

        /// Retrieving the resource from the repository failed
        #[error("Fetch failed{}: {message}", status_suffix(.status))]
        Fetch { status: Option<u16>, message: String },

        /// The fetched representation could not be parsed as RDF
        #[error("Invalid document: {0}")]
        InvalidDocument(String),

        /// A subject or endpoint IRI was malformed
        #[error("Invalid IRI: {0}")]
        InvalidIri(String),

        /// The SPARQL DELETE was rejected or never acknowledged
        #[error("Delete failed{}: {message}", status_suffix(.status))]
        Delete { status: Option<u16>, message: String },

        /// The SPARQL INSERT was rejected or never acknowledged
        #[error("Insert failed{}: {message}", status_suffix(.status))]
        Insert { status: Option<u16>, message: String },

        /// A read query against the triplestore failed
        #[error("Query failed{}: {message}", status_suffix(.status))]
        Query { status: Option<u16>, message: String },

        /// Configuration error
        #[error("Configuration error: {0}")]
        Config(String),
    }

    fn status_suffix(status: &Option<u16>) -> String {
        match status {
            Some(code) => format!(" with status {}", code),
            None => String::new(),
        }
    }

    impl SyncError {
        /// Whether re-submitting the same event may succeed.
        pub fn is_retryable(&self) -> bool {
            matches!(
                self,
                SyncError::Fetch { .. }
                    | SyncError::Delete { .. }
                    | SyncError::Insert { .. }
                    | SyncError::Query { .. }
            )
        }

        /// Name of the stage that produced this error.
        pub fn stage(&self) -> &'static str {
            match self {
                SyncError::MissingBaseUrl
                | SyncError::MissingIdentifier
                | SyncError::UnknownOperation(_) => "normalize",
                SyncError::Fetch { .. } => "fetch",
                SyncError::InvalidDocument(_) | SyncError::InvalidIri(_) => "describe",
                SyncError::Delete { .. } => "delete",
                SyncError::Insert { .. } => "insert",
                SyncError::Query { .. } => "query",
                SyncError::Config(_) => "config",
            }
        }

        /// HTTP status reported by the upstream, if any.
        pub fn status(&self) -> Option<u16> {
            match self {
                SyncError::Fetch { status, .. }
                | SyncError::Delete { status, .. }
                | SyncError::Insert { status, .. }
                | SyncError::Query { status, .. } => *status,
                _ => None,
            }
        }
    }
}

// Re-export commonly used types
pub use crate::core::{
    ChangeEvent, Operation, OperationKind, RdfFormat, ResourceDocument, SparqlOperation,
    SyncResult,
};
pub use config::SyncConfig;
pub use error::{Result, SyncError};
pub use pipeline::{SyncPipeline, SyncStage};
