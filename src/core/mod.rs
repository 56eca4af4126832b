//! Core data structures and types for ldsync

use serde::{Deserialize, Serialize};
use std::fmt;

/// Kind of mutation a repository resource went through.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Operation {
    Create,
    Update,
    Delete,
}

impl Operation {
    /// Create and Update both re-index the resource from its current state.
    pub fn requires_fetch(&self) -> bool {
        !matches!(self, Operation::Delete)
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Operation::Create => "CREATE",
            Operation::Update => "UPDATE",
            Operation::Delete => "DELETE",
        }
    }
}

impl fmt::Display for Operation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Canonical description of a change in the repository.
///
/// Built by [`crate::events::normalizer::normalize`] and consumed by one
/// pipeline run. The fields are public for reading and pattern matching, but the
/// event is never mutated after construction.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChangeEvent {
    /// Repository-relative path, e.g. `/objects/123`
    pub identifier: String,
    /// Repository REST root, e.g. `http://localhost:8080/fcrepo4/rest`
    pub base_url: String,
    pub operation: Operation,
}

impl ChangeEvent {
    pub fn new(identifier: &str, base_url: &str, operation: Operation) -> Self {
        Self { identifier: identifier.to_string(), base_url: base_url.to_string(), operation }
    }

    /// Full URI of the resource, which is also its subject in the triplestore.
    pub fn subject_uri(&self) -> String {
        let base = self.base_url.trim_end_matches('/');
        let path = self.identifier.trim_start_matches('/');
        if path.is_empty() {
            base.to_string()
        } else {
            format!("{}/{}", base, path)
        }
    }
}

/// The fetched RDF serialization of a resource.
#[derive(Debug, Clone)]
pub struct ResourceDocument {
    pub identifier: String,
    pub media_type: String,
    pub body: Vec<u8>,
}

impl ResourceDocument {
    pub fn new(identifier: &str, media_type: &str, body: Vec<u8>) -> Self {
        Self { identifier: identifier.to_string(), media_type: media_type.to_string(), body }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum OperationKind {
    Delete,
    Insert,
}

impl fmt::Display for OperationKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            OperationKind::Delete => f.write_str("DELETE"),
            OperationKind::Insert => f.write_str("INSERT"),
        }
    }
}

/// A SPARQL update ready to be posted to the triplestore.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SparqlOperation {
    pub kind: OperationKind,
    pub statement: String,
    pub target_endpoint: String,
}

impl SparqlOperation {
    pub fn delete(statement: String, target_endpoint: &str) -> Self {
        Self { kind: OperationKind::Delete, statement, target_endpoint: target_endpoint.to_string() }
    }

    pub fn insert(statement: String, target_endpoint: &str) -> Self {
        Self { kind: OperationKind::Insert, statement, target_endpoint: target_endpoint.to_string() }
    }
}

/// Outcome of a successful pipeline run.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SyncResult {
    pub identifier: String,
    pub operation: Operation,
    /// Triples inserted for create/update runs. Unknown for deletes.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub triples_changed: Option<usize>,
}

pub mod format;
pub use format::RdfFormat;
