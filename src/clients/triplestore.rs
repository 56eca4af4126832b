//! HTTP client for a SPARQL 1.1 protocol endpoint (Fuseki, Oxigraph, Blazegraph...)

use super::{add_auth_header, error_body, transport_message, SparqlUpdater};
use crate::config::{Credentials, StoreFlavor, SyncConfig};
use crate::core::{OperationKind, SparqlOperation};
use crate::error::{Result, SyncError};
use async_trait::async_trait;
use reqwest::header::{ACCEPT, CONTENT_TYPE};
use reqwest::{Client, RequestBuilder};
use tracing::debug;

pub struct HttpTriplestore {
    client: Client,
    flavor: StoreFlavor,
    auth: Option<Credentials>,
    query_url: Option<String>,
}

impl HttpTriplestore {
    pub fn new(config: &SyncConfig) -> Result<Self> {
        let client = Client::builder()
            .timeout(config.timeout())
            .build()
            .map_err(|e| SyncError::Config(e.to_string()))?;

        Ok(Self {
            client,
            flavor: config.store_flavor,
            auth: config.triplestore_auth.clone(),
            query_url: config.triplestore_query_url.clone(),
        })
    }

    /// Run a read query and return the raw response body.
    pub async fn query(&self, sparql: &str, accept: &str) -> Result<String> {
        let url = self.query_url.as_deref().ok_or_else(|| {
            SyncError::Config("no triplestore query URL configured".to_string())
        })?;

        let request = match self.flavor {
            StoreFlavor::Form => self.client.post(url).form(&[("query", sparql)]),
            StoreFlavor::SparqlUpdate => self
                .client
                .post(url)
                .header(CONTENT_TYPE, "application/sparql-query")
                .body(sparql.to_string()),
        };

        let response = add_auth_header(request.header(ACCEPT, accept), self.auth.as_ref())
            .send()
            .await
            .map_err(|e| SyncError::Query { status: None, message: transport_message(&e) })?;

        let status = response.status();
        if !status.is_success() {
            let message = error_body(response).await;
            return Err(SyncError::Query { status: Some(status.as_u16()), message });
        }

        response
            .text()
            .await
            .map_err(|e| SyncError::Query { status: None, message: transport_message(&e) })
    }

    /// Check if the store answers queries
    pub async fn ping(&self) -> Result<bool> {
        match self.query("ASK { }", "application/sparql-results+json").await {
            Ok(_) => Ok(true),
            Err(SyncError::Config(msg)) => Err(SyncError::Config(msg)),
            Err(_) => Ok(false),
        }
    }

    fn update_request(&self, operation: &SparqlOperation) -> RequestBuilder {
        let request = match self.flavor {
            StoreFlavor::Form => self
                .client
                .post(&operation.target_endpoint)
                .form(&[("update", operation.statement.as_str())]),
            StoreFlavor::SparqlUpdate => self
                .client
                .post(&operation.target_endpoint)
                .header(CONTENT_TYPE, "application/sparql-update")
                .body(operation.statement.clone()),
        };
        add_auth_header(request, self.auth.as_ref())
    }
}

fn stage_error(kind: OperationKind, status: Option<u16>, message: String) -> SyncError {
    match kind {
        OperationKind::Delete => SyncError::Delete { status, message },
        OperationKind::Insert => SyncError::Insert { status, message },
    }
}

#[async_trait]
impl SparqlUpdater for HttpTriplestore {
    async fn update(&self, operation: &SparqlOperation) -> Result<()> {
        debug!(
            kind = %operation.kind,
            endpoint = %operation.target_endpoint,
            bytes = operation.statement.len(),
            "posting SPARQL update"
        );

        let response = self
            .update_request(operation)
            .send()
            .await
            .map_err(|e| stage_error(operation.kind, None, transport_message(&e)))?;

        let status = response.status();
        if !status.is_success() {
            let message = error_body(response).await;
            return Err(stage_error(operation.kind, Some(status.as_u16()), message));
        }

        Ok(())
    }
}
