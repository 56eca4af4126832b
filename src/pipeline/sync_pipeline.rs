use crate::clients::{HttpRepository, HttpTriplestore, ResourceFetcher, SparqlUpdater};
use crate::config::SyncConfig;
use crate::core::{ChangeEvent, ResourceDocument, SparqlOperation, SyncResult};
use crate::error::Result;
use crate::events::normalizer::normalize;
use crate::sparql::{delete_statement, describe, insert_statement, subject_node, Description};
use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;
use tracing::{debug, info, warn};

/// Observable stage of a pipeline run.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SyncStage {
    Fetch,
    Describe,
    Delete,
    Insert,
    Done,
}

impl fmt::Display for SyncStage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            SyncStage::Fetch => "FETCH",
            SyncStage::Describe => "DESCRIBE",
            SyncStage::Delete => "DELETE",
            SyncStage::Insert => "INSERT",
            SyncStage::Done => "DONE",
        };
        f.write_str(name)
    }
}

/// Run state, carrying what the next stage consumes.
enum RunState {
    Fetch,
    Describe(ResourceDocument),
    /// `None` for delete events, which never fetch
    Delete(Option<Description>),
    Insert(Description),
    Done(Option<usize>),
}

impl RunState {
    fn stage(&self) -> SyncStage {
        match self {
            RunState::Fetch => SyncStage::Fetch,
            RunState::Describe(_) => SyncStage::Describe,
            RunState::Delete(_) => SyncStage::Delete,
            RunState::Insert(_) => SyncStage::Insert,
            RunState::Done(_) => SyncStage::Done,
        }
    }
}

/// Keeps the triplestore's copy of one resource in line with the repository.
///
/// The pipeline is shareable across tasks; every call to
/// [`SyncPipeline::synchronize`] is an independent sequential run.
pub struct SyncPipeline {
    config: SyncConfig,
    fetcher: Arc<dyn ResourceFetcher>,
    updater: Arc<dyn SparqlUpdater>,
}

impl SyncPipeline {
    /// Pipeline backed by the HTTP repository and triplestore clients.
    pub fn new(config: SyncConfig) -> Result<Self> {
        config.validate()?;
        let fetcher = Arc::new(HttpRepository::new(&config)?);
        let updater = Arc::new(HttpTriplestore::new(&config)?);
        Ok(Self { config, fetcher, updater })
    }

    pub fn with_clients(
        config: SyncConfig,
        fetcher: Arc<dyn ResourceFetcher>,
        updater: Arc<dyn SparqlUpdater>,
    ) -> Self {
        Self { config, fetcher, updater }
    }

    pub fn config(&self) -> &SyncConfig {
        &self.config
    }

    /// Normalize a header map and synchronize the resulting event.
    pub async fn synchronize_headers(&self, headers: &HashMap<String, String>) -> Result<SyncResult> {
        let event = normalize(headers)?;
        self.synchronize(&event).await
    }

    /// Bring the triplestore in line with the repository for one event.
    ///
    /// The DELETE is acknowledged before the INSERT is sent. Any failure aborts
    /// the run; nothing after the failing stage is attempted.
    pub async fn synchronize(&self, event: &ChangeEvent) -> Result<SyncResult> {
        let outcome = self.run(event).await;
        match &outcome {
            Ok(result) => info!(
                identifier = %event.identifier,
                operation = %event.operation,
                triples_changed = ?result.triples_changed,
                "resource synchronized"
            ),
            Err(e) => warn!(
                identifier = %event.identifier,
                operation = %event.operation,
                stage = e.stage(),
                retryable = e.is_retryable(),
                error = %e,
                "sync run aborted"
            ),
        }
        outcome
    }

    async fn run(&self, event: &ChangeEvent) -> Result<SyncResult> {
        let update_url = self.config.triplestore_update_url.as_str();
        let mut state =
            if event.operation.requires_fetch() { RunState::Fetch } else { RunState::Delete(None) };

        loop {
            debug!(identifier = %event.identifier, stage = %state.stage(), "sync stage");

            state = match state {
                RunState::Fetch => RunState::Describe(self.fetcher.fetch(event).await?),
                RunState::Describe(document) => {
                    let description = describe(event, &document, self.config.accept)?;
                    debug!(
                        identifier = %event.identifier,
                        triples = description.triples.len(),
                        query = %description.query,
                        "resource described"
                    );
                    RunState::Delete(Some(description))
                }
                RunState::Delete(description) => {
                    let subject = match &description {
                        Some(d) => d.subject.clone(),
                        None => subject_node(&event.subject_uri())?,
                    };
                    let operation = SparqlOperation::delete(delete_statement(&subject), update_url);
                    self.updater.update(&operation).await?;
                    match description {
                        Some(d) => RunState::Insert(d),
                        None => RunState::Done(None),
                    }
                }
                RunState::Insert(description) => match insert_statement(&description.triples) {
                    Some(statement) => {
                        let operation = SparqlOperation::insert(statement, update_url);
                        self.updater.update(&operation).await?;
                        RunState::Done(Some(description.triples.len()))
                    }
                    None => RunState::Done(Some(0)),
                },
                RunState::Done(triples_changed) => {
                    return Ok(SyncResult {
                        identifier: event.identifier.clone(),
                        operation: event.operation,
                        triples_changed,
                    });
                }
            };
        }
    }
}
