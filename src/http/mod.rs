//! HTTP API module for ldsync
//!
//! Provides the webhook endpoint through which the repository (or whatever
//! relays its events) submits changes to be synchronized.

pub mod server;

pub use server::{create_server, start_server, AppState, ErrorResponse, SuccessResponse};
