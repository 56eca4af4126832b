//! Configuration structures and utilities

use crate::core::RdfFormat;
use crate::error::{Result, SyncError};
use clap::Args;
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// How the update statement is carried in the POST body.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum StoreFlavor {
    /// Raw body with `Content-Type: application/sparql-update`
    SparqlUpdate,
    /// `application/x-www-form-urlencoded` with an `update=` field (Fuseki, Jena)
    Form,
}

impl StoreFlavor {
    pub fn from_string(flavor: &str) -> Option<StoreFlavor> {
        match flavor.to_lowercase().as_str() {
            "sparql-update" | "direct" | "oxigraph" => Some(StoreFlavor::SparqlUpdate),
            "form" | "jena" | "fuseki" => Some(StoreFlavor::Form),
            _ => None,
        }
    }
}

/// Credentials attached to outbound requests.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum Credentials {
    Bearer(String),
    Basic { username: String, password: Option<String> },
}

/// Configuration for a sync pipeline
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SyncConfig {
    pub triplestore_update_url: String,
    /// Only needed by callers that read the index back
    pub triplestore_query_url: Option<String>,
    pub store_flavor: StoreFlavor,
    /// Serialization requested from the repository, regardless of the event
    pub accept: RdfFormat,
    pub timeout_secs: u64,
    pub repository_auth: Option<Credentials>,
    pub triplestore_auth: Option<Credentials>,
}

impl Default for SyncConfig {
    fn default() -> Self {
        Self {
            triplestore_update_url: "http://localhost:3030/test/update".to_string(),
            triplestore_query_url: Some("http://localhost:3030/test/query".to_string()),
            store_flavor: StoreFlavor::SparqlUpdate,
            accept: RdfFormat::NTriples,
            timeout_secs: 30,
            repository_auth: None,
            triplestore_auth: None,
        }
    }
}

impl SyncConfig {
    pub fn new(triplestore_update_url: &str) -> Self {
        Self {
            triplestore_update_url: triplestore_update_url.to_string(),
            triplestore_query_url: None,
            ..Self::default()
        }
    }

    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }

    pub fn validate(&self) -> Result<()> {
        let url = self.triplestore_update_url.trim();
        if url.is_empty() {
            return Err(SyncError::Config("triplestore update URL is empty".to_string()));
        }
        if !(url.starts_with("http://") || url.starts_with("https://")) {
            return Err(SyncError::Config(format!(
                "triplestore update URL must be http(s): {}",
                url
            )));
        }
        if self.timeout_secs == 0 {
            return Err(SyncError::Config("timeout must be at least one second".to_string()));
        }
        Ok(())
    }
}

/// Pipeline options shared by the binaries
#[derive(Args, Debug, Clone)]
pub struct PipelineArgs {
    /// SPARQL update endpoint of the triplestore
    #[arg(
        long,
        env = "LDSYNC_TRIPLESTORE_UPDATE_URL",
        default_value = "http://localhost:3030/test/update"
    )]
    pub triplestore_update_url: String,

    /// SPARQL query endpoint of the triplestore
    #[arg(long, env = "LDSYNC_TRIPLESTORE_QUERY_URL")]
    pub triplestore_query_url: Option<String>,

    /// How updates are posted: sparql-update or form
    #[arg(long, env = "LDSYNC_STORE_FLAVOR", default_value = "sparql-update")]
    pub store_flavor: String,

    /// Serialization requested from the repository: ntriples, turtle or rdfxml
    #[arg(long, env = "LDSYNC_ACCEPT", default_value = "ntriples")]
    pub accept: String,

    /// Timeout for every outbound request, in seconds
    #[arg(long, env = "LDSYNC_TIMEOUT_SECS", default_value = "30")]
    pub timeout_secs: u64,

    /// Bearer token sent to the repository
    #[arg(long, env = "LDSYNC_REPOSITORY_TOKEN")]
    pub repository_token: Option<String>,

    /// Bearer token sent to the triplestore
    #[arg(long, env = "LDSYNC_TRIPLESTORE_TOKEN")]
    pub triplestore_token: Option<String>,
}

impl PipelineArgs {
    pub fn into_config(self) -> Result<SyncConfig> {
        let store_flavor = StoreFlavor::from_string(&self.store_flavor).ok_or_else(|| {
            SyncError::Config(format!("unknown store flavor: {}", self.store_flavor))
        })?;
        let accept = RdfFormat::from_string(&self.accept)
            .ok_or_else(|| SyncError::Config(format!("unsupported RDF format: {}", self.accept)))?;

        let config = SyncConfig {
            triplestore_update_url: self.triplestore_update_url,
            triplestore_query_url: self.triplestore_query_url,
            store_flavor,
            accept,
            timeout_secs: self.timeout_secs,
            repository_auth: self.repository_token.map(Credentials::Bearer),
            triplestore_auth: self.triplestore_token.map(Credentials::Bearer),
        };
        config.validate()?;
        Ok(config)
    }
}
