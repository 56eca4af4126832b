//! Shared fixtures for the integration tests
//!
//! `RepositoryFixture` stands in for the object repository: an axum server on
//! an ephemeral port that serves whatever documents a test registers and
//! records every request it receives.

#![allow(dead_code)]

use axum::{
    extract::State,
    http::{header, HeaderMap, Method, StatusCode, Uri},
    response::{IntoResponse, Response},
    Router,
};
use ldsync::{ChangeEvent, Operation};
use oxigraph::model::{GraphName, Literal, NamedNode, Quad};
use oxigraph::store::Store;
use std::collections::HashMap;
use std::net::SocketAddr;
use std::sync::{Arc, Mutex};
use tokio::net::TcpListener;
use tokio::task::JoinHandle;

pub const REST_PREFIX: &str = "/rest";
pub const DC_TITLE: &str = "http://purl.org/dc/elements/1.1/title";

#[derive(Debug, Clone)]
struct Resource {
    status: u16,
    content_type: String,
    body: String,
}

#[derive(Debug, Clone)]
pub struct RecordedRequest {
    pub method: String,
    pub path: String,
    pub accept: Option<String>,
}

#[derive(Default)]
struct FixtureState {
    resources: Mutex<HashMap<String, Resource>>,
    requests: Mutex<Vec<RecordedRequest>>,
}

pub struct RepositoryFixture {
    addr: SocketAddr,
    state: Arc<FixtureState>,
    handle: JoinHandle<()>,
}

impl RepositoryFixture {
    pub async fn start() -> Self {
        let state = Arc::new(FixtureState::default());
        let app = Router::new().fallback(serve_resource).with_state(Arc::clone(&state));

        let listener = TcpListener::bind("127.0.0.1:0").await.expect("bind to ephemeral port");
        let addr = listener.local_addr().expect("get local addr");
        let handle = tokio::spawn(async move {
            axum::serve(listener, app).await.expect("repository fixture");
        });

        Self { addr, state, handle }
    }

    /// Repository REST root, as carried in change events.
    pub fn base_url(&self) -> String {
        format!("http://{}{}", self.addr, REST_PREFIX)
    }

    pub fn subject_uri(&self, identifier: &str) -> String {
        format!("{}{}", self.base_url(), identifier)
    }

    pub fn event(&self, identifier: &str, operation: Operation) -> ChangeEvent {
        ChangeEvent::new(identifier, &self.base_url(), operation)
    }

    pub fn put(&self, identifier: &str, content_type: &str, body: &str) {
        self.state.resources.lock().unwrap().insert(
            format!("{}{}", REST_PREFIX, identifier),
            Resource { status: 200, content_type: content_type.to_string(), body: body.to_string() },
        );
    }

    pub fn fail(&self, identifier: &str, status: u16) {
        self.state.resources.lock().unwrap().insert(
            format!("{}{}", REST_PREFIX, identifier),
            Resource { status, content_type: "text/plain".to_string(), body: "failure".to_string() },
        );
    }

    pub fn requests(&self) -> Vec<RecordedRequest> {
        self.state.requests.lock().unwrap().clone()
    }
}

impl Drop for RepositoryFixture {
    fn drop(&mut self) {
        self.handle.abort();
    }
}

async fn serve_resource(
    State(state): State<Arc<FixtureState>>,
    method: Method,
    uri: Uri,
    headers: HeaderMap,
) -> Response {
    state.requests.lock().unwrap().push(RecordedRequest {
        method: method.to_string(),
        path: uri.path().to_string(),
        accept: headers.get(header::ACCEPT).and_then(|v| v.to_str().ok()).map(str::to_string),
    });

    let resource = state.resources.lock().unwrap().get(uri.path()).cloned();
    match resource {
        Some(resource) => {
            let status = StatusCode::from_u16(resource.status).unwrap_or(StatusCode::OK);
            (status, [(header::CONTENT_TYPE, resource.content_type)], resource.body).into_response()
        }
        None => (StatusCode::NOT_FOUND, "Not Found").into_response(),
    }
}

/// Turtle for a resource with a single `dc:title`, using the resource as base.
pub fn turtle_document(title: &str) -> String {
    format!("@prefix dc: <http://purl.org/dc/elements/1.1/> .\n<> dc:title \"{}\" .\n", title)
}

/// Put a `dc:title` triple straight into the store, bypassing HTTP.
pub fn seed_title(store: &Store, subject: &str, title: &str) {
    let quad = Quad::new(
        NamedNode::new(subject).unwrap(),
        NamedNode::new(DC_TITLE).unwrap(),
        Literal::new_simple_literal(title),
        GraphName::DefaultGraph,
    );
    store.insert(&quad).unwrap();
}

/// Titles stored for `subject`, sorted.
pub fn titles(store: &Store, subject: &str) -> Vec<String> {
    let mut titles: Vec<String> = store
        .iter()
        .map(Result::unwrap)
        .filter(|q| q.subject.to_string() == format!("<{}>", subject))
        .filter(|q| q.predicate.as_str() == DC_TITLE)
        .map(|q| match q.object {
            oxigraph::model::Term::Literal(l) => l.value().to_string(),
            other => other.to_string(),
        })
        .collect();
    titles.sort();
    titles
}
