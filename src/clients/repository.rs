//! Client for the authoritative object repository

use super::{add_auth_header, error_body, transport_message, ResourceFetcher};
use crate::config::{Credentials, SyncConfig};
use crate::core::{ChangeEvent, RdfFormat, ResourceDocument};
use crate::error::{Result, SyncError};
use async_trait::async_trait;
use reqwest::header::{ACCEPT, CONTENT_TYPE};
use reqwest::Client;
use tracing::debug;

/// Fetches resources with a plain `GET {base_url}{identifier}`.
///
/// The `Accept` header is always the configured serialization. Whatever the
/// event or the caller would prefer, the pipeline only ever parses this format
/// (or the one the repository labels its answer with).
pub struct HttpRepository {
    client: Client,
    accept: RdfFormat,
    auth: Option<Credentials>,
}

impl HttpRepository {
    pub fn new(config: &SyncConfig) -> Result<Self> {
        let client = Client::builder()
            .timeout(config.timeout())
            .build()
            .map_err(|e| SyncError::Config(e.to_string()))?;

        Ok(Self { client, accept: config.accept, auth: config.repository_auth.clone() })
    }

    pub fn accept(&self) -> RdfFormat {
        self.accept
    }
}

#[async_trait]
impl ResourceFetcher for HttpRepository {
    async fn fetch(&self, event: &ChangeEvent) -> Result<ResourceDocument> {
        let url = event.subject_uri();
        debug!(url = %url, accept = self.accept.media_type(), "fetching resource");

        let request = self.client.get(&url).header(ACCEPT, self.accept.media_type());
        let response = add_auth_header(request, self.auth.as_ref())
            .send()
            .await
            .map_err(|e| SyncError::Fetch { status: None, message: transport_message(&e) })?;

        let status = response.status();
        if !status.is_success() {
            let message = error_body(response).await;
            return Err(SyncError::Fetch { status: Some(status.as_u16()), message });
        }

        let media_type = response
            .headers()
            .get(CONTENT_TYPE)
            .and_then(|value| value.to_str().ok())
            .unwrap_or(self.accept.media_type())
            .to_string();

        let body = response
            .bytes()
            .await
            .map_err(|e| SyncError::Fetch { status: None, message: transport_message(&e) })?;

        Ok(ResourceDocument::new(&event.identifier, &media_type, body.to_vec()))
    }
}
