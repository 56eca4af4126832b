//! HTTP clients for the repository and the triplestore
//!
//! The pipeline only talks to the outside world through [`ResourceFetcher`] and
//! [`SparqlUpdater`], so runs can be driven by the reqwest-backed clients here
//! or by in-process doubles.

use crate::config::Credentials;
use crate::core::{ChangeEvent, ResourceDocument, SparqlOperation};
use crate::error::Result;
use async_trait::async_trait;
use reqwest::RequestBuilder;

pub mod repository;
pub mod triplestore;

pub use repository::HttpRepository;
pub use triplestore::HttpTriplestore;

/// Retrieves the current representation of a repository resource.
#[async_trait]
pub trait ResourceFetcher: Send + Sync {
    async fn fetch(&self, event: &ChangeEvent) -> Result<ResourceDocument>;
}

/// Executes a SPARQL update and returns once the store acknowledged it.
#[async_trait]
pub trait SparqlUpdater: Send + Sync {
    async fn update(&self, operation: &SparqlOperation) -> Result<()>;
}

fn add_auth_header(request: RequestBuilder, credentials: Option<&Credentials>) -> RequestBuilder {
    match credentials {
        Some(Credentials::Bearer(token)) => request.bearer_auth(token),
        Some(Credentials::Basic { username, password }) => {
            request.basic_auth(username, password.as_ref())
        }
        None => request,
    }
}

/// Message for a failed `send()`, naming timeouts explicitly.
fn transport_message(err: &reqwest::Error) -> String {
    if err.is_timeout() {
        format!("request timed out: {}", err)
    } else if err.is_connect() {
        format!("connection failed: {}", err)
    } else {
        err.to_string()
    }
}

/// Drain the body of a non-2xx response for the error message.
async fn error_body(response: reqwest::Response) -> String {
    let status = response.status();
    let body = response.text().await.unwrap_or_else(|_| "Unknown error".to_string());
    if body.trim().is_empty() {
        status.to_string()
    } else {
        body
    }
}
