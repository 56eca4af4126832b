//! In-memory triplestore speaking the SPARQL 1.1 protocol.
//!
//! Backed by an oxigraph [`Store`] and served by axum on a local port. Tests
//! construct one per case and shut it down (or drop it) at the end, so no
//! server outlives the test that started it.
//!
//! # Example
//!
//! ```ignore
//! let store = EmbeddedTriplestore::start("/test").await?;
//! let config = SyncConfig::new(&store.update_url());
//! // ... run the pipeline ...
//! assert_eq!(store.triple_count()?, 1);
//! store.shutdown().await;
//! ```

use axum::{
    extract::{FromRequest, Query, Request, State},
    http::{header::CONTENT_TYPE, StatusCode},
    response::{IntoResponse, Response},
    routing::post,
    Form, Router,
};
use oxigraph::model::vocab::xsd;
use oxigraph::model::{NamedOrBlankNode, Term};
use oxigraph::sparql::{QueryResults, SparqlEvaluator};
use oxigraph::store::Store;
use serde_json::{json, Map, Value};
use std::collections::HashMap;
use std::io;
use std::net::SocketAddr;
use std::sync::Arc;
use tokio::net::TcpListener;
use tokio::sync::oneshot;
use tokio::task::JoinHandle;
use tracing::{debug, error, info};

const FORM_CONTENT_TYPE: &str = "application/x-www-form-urlencoded";

struct StoreState {
    store: Store,
}

pub struct EmbeddedTriplestore {
    store: Store,
    addr: SocketAddr,
    prefix: String,
    shutdown: Option<oneshot::Sender<()>>,
    handle: Option<JoinHandle<()>>,
}

impl EmbeddedTriplestore {
    /// Start on an ephemeral localhost port.
    pub async fn start(prefix: &str) -> io::Result<Self> {
        Self::bind("127.0.0.1:0", prefix).await
    }

    pub async fn bind(addr: &str, prefix: &str) -> io::Result<Self> {
        let store = Store::new().map_err(io::Error::other)?;
        let prefix = normalize_prefix(prefix);

        let listener = TcpListener::bind(addr).await?;
        let addr = listener.local_addr()?;
        let app = create_router(store.clone(), &prefix);

        let (shutdown_tx, shutdown_rx) = oneshot::channel::<()>();
        let handle = tokio::spawn(async move {
            let server = axum::serve(listener, app).with_graceful_shutdown(async {
                let _ = shutdown_rx.await;
            });
            if let Err(e) = server.await {
                error!(error = %e, "embedded triplestore stopped");
            }
        });

        info!(address = %addr, prefix = %prefix, "embedded triplestore listening");

        Ok(Self { store, addr, prefix, shutdown: Some(shutdown_tx), handle: Some(handle) })
    }

    pub fn local_addr(&self) -> SocketAddr {
        self.addr
    }

    pub fn base_url(&self) -> String {
        format!("http://{}{}", self.addr, self.prefix)
    }

    pub fn query_url(&self) -> String {
        format!("{}/query", self.base_url())
    }

    pub fn update_url(&self) -> String {
        format!("{}/update", self.base_url())
    }

    /// Direct access to the backing store, bypassing HTTP.
    pub fn store(&self) -> &Store {
        &self.store
    }

    pub fn triple_count(&self) -> io::Result<usize> {
        self.store.len().map_err(io::Error::other)
    }

    /// Number of stored triples whose subject is `uri`.
    pub fn subject_triple_count(&self, uri: &str) -> io::Result<usize> {
        let mut count = 0;
        for quad in self.store.iter() {
            let quad = quad.map_err(io::Error::other)?;
            if matches!(&quad.subject, NamedOrBlankNode::NamedNode(n) if n.as_str() == uri) {
                count += 1;
            }
        }
        Ok(count)
    }

    /// Stop accepting requests and wait for the server task to finish.
    pub async fn shutdown(mut self) {
        if let Some(tx) = self.shutdown.take() {
            let _ = tx.send(());
        }
        if let Some(handle) = self.handle.take() {
            let _ = handle.await;
        }
        info!(address = %self.addr, "embedded triplestore stopped");
    }
}

impl Drop for EmbeddedTriplestore {
    fn drop(&mut self) {
        if let Some(tx) = self.shutdown.take() {
            let _ = tx.send(());
        }
        if let Some(handle) = self.handle.take() {
            handle.abort();
        }
    }
}

fn normalize_prefix(prefix: &str) -> String {
    let trimmed = prefix.trim().trim_matches('/');
    if trimmed.is_empty() {
        String::new()
    } else {
        format!("/{}", trimmed)
    }
}

/// Router exposing `{prefix}/query` and `{prefix}/update` for `store`.
pub fn create_router(store: Store, prefix: &str) -> Router {
    let state = Arc::new(StoreState { store });

    Router::new()
        .route(&format!("{}/query", prefix), post(query_post).get(query_get))
        .route(&format!("{}/update", prefix), post(update_post))
        .with_state(state)
}

async fn query_get(
    State(state): State<Arc<StoreState>>,
    Query(params): Query<HashMap<String, String>>,
) -> Response {
    match params.get("query") {
        Some(query) => run_blocking(state.store.clone(), query.clone(), evaluate_query).await,
        None => (StatusCode::BAD_REQUEST, "missing query parameter").into_response(),
    }
}

async fn query_post(State(state): State<Arc<StoreState>>, request: Request) -> Response {
    match read_operation(request, "query").await {
        Ok(query) => run_blocking(state.store.clone(), query, evaluate_query).await,
        Err(response) => response,
    }
}

async fn update_post(State(state): State<Arc<StoreState>>, request: Request) -> Response {
    match read_operation(request, "update").await {
        Ok(update) => run_blocking(state.store.clone(), update, apply_update).await,
        Err(response) => response,
    }
}

/// Store evaluation is synchronous; keep it off the async workers.
async fn run_blocking(
    store: Store,
    operation: String,
    evaluate: fn(&Store, &str) -> Response,
) -> Response {
    match tokio::task::spawn_blocking(move || evaluate(&store, &operation)).await {
        Ok(response) => response,
        Err(e) => (StatusCode::INTERNAL_SERVER_ERROR, e.to_string()).into_response(),
    }
}

fn apply_update(store: &Store, update: &str) -> Response {
    debug!(update = %update, "applying SPARQL update");
    let prepared = match SparqlEvaluator::new().parse_update(update) {
        Ok(prepared) => prepared,
        Err(e) => return (StatusCode::BAD_REQUEST, e.to_string()).into_response(),
    };
    match prepared.on_store(store).execute() {
        Ok(()) => StatusCode::NO_CONTENT.into_response(),
        Err(e) => (StatusCode::INTERNAL_SERVER_ERROR, e.to_string()).into_response(),
    }
}

/// Pull the operation out of either a form field or the raw body.
async fn read_operation(request: Request, field: &str) -> Result<String, Response> {
    let is_form = request
        .headers()
        .get(CONTENT_TYPE)
        .and_then(|value| value.to_str().ok())
        .is_some_and(|value| value.starts_with(FORM_CONTENT_TYPE));

    if is_form {
        let Form(fields) = Form::<HashMap<String, String>>::from_request(request, &())
            .await
            .map_err(IntoResponse::into_response)?;
        fields.get(field).cloned().ok_or_else(|| {
            (StatusCode::BAD_REQUEST, format!("missing {} field", field)).into_response()
        })
    } else {
        String::from_request(request, &()).await.map_err(IntoResponse::into_response)
    }
}

fn evaluate_query(store: &Store, query: &str) -> Response {
    let parsed = match SparqlEvaluator::new().parse_query(query) {
        Ok(parsed) => parsed,
        Err(e) => return (StatusCode::BAD_REQUEST, e.to_string()).into_response(),
    };
    let results = match parsed.on_store(store).execute() {
        Ok(results) => results,
        Err(e) => return (StatusCode::INTERNAL_SERVER_ERROR, e.to_string()).into_response(),
    };

    let rendered = match results {
        QueryResults::Graph(triples) => {
            let mut body = String::new();
            for triple in triples {
                match triple {
                    Ok(triple) => body.push_str(&format!("{} .\n", triple)),
                    Err(e) => {
                        return (StatusCode::INTERNAL_SERVER_ERROR, e.to_string()).into_response()
                    }
                }
            }
            Ok(("application/n-triples", body))
        }
        QueryResults::Boolean(value) => Ok((
            "application/sparql-results+json",
            json!({ "head": {}, "boolean": value }).to_string(),
        )),
        QueryResults::Solutions(solutions) => {
            let vars: Vec<String> =
                solutions.variables().iter().map(|v| v.as_str().to_string()).collect();
            let mut bindings = Vec::new();
            let mut failure = None;
            for solution in solutions {
                match solution {
                    Ok(solution) => {
                        let mut binding = Map::new();
                        for (var, term) in solution.iter() {
                            binding.insert(var.as_str().to_string(), term_json(term));
                        }
                        bindings.push(Value::Object(binding));
                    }
                    Err(e) => {
                        failure = Some(e.to_string());
                        break;
                    }
                }
            }
            match failure {
                Some(message) => Err(message),
                None => Ok((
                    "application/sparql-results+json",
                    json!({ "head": { "vars": vars }, "results": { "bindings": bindings } })
                        .to_string(),
                )),
            }
        }
    };

    match rendered {
        Ok((content_type, body)) => ([(CONTENT_TYPE, content_type)], body).into_response(),
        Err(message) => (StatusCode::INTERNAL_SERVER_ERROR, message).into_response(),
    }
}

/// SPARQL 1.1 JSON results encoding of one term.
fn term_json(term: &Term) -> Value {
    match term {
        Term::NamedNode(node) => json!({ "type": "uri", "value": node.as_str() }),
        Term::BlankNode(node) => json!({ "type": "bnode", "value": node.as_str() }),
        Term::Literal(literal) => {
            let mut value = json!({ "type": "literal", "value": literal.value() });
            if let Some(language) = literal.language() {
                value["xml:lang"] = json!(language);
            } else if literal.datatype() != xsd::STRING {
                value["datatype"] = json!(literal.datatype().as_str());
            }
            value
        }
        #[allow(unreachable_patterns)]
        other => json!({ "type": "triple", "value": other.to_string() }),
    }
}
