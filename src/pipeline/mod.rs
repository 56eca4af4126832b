//! The synchronization pipeline
//!
//! A run moves through `FETCH → DESCRIBE → DELETE → INSERT → DONE`. Delete
//! events start at `DELETE` and finish right after it. Runs hold no durable
//! checkpoint: a failed run is retried by re-submitting the whole event.

pub mod sync_pipeline;

pub use sync_pipeline::{SyncPipeline, SyncStage};
