//! Inbound change events
//!
//! Events reach ldsync as loosely typed header maps (webhook bodies, message
//! properties, CLI flags). This module turns them into a [`crate::ChangeEvent`].

pub mod normalizer;

pub use normalizer::{normalize, parse_operation};
