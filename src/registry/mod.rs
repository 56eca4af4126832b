//! Per-identifier serialization of sync runs

pub mod identifier_locks;

pub use identifier_locks::{IdentifierGuard, IdentifierLocks};
