// Test doubles for the renderer, the publisher and the Grafana render endpoint
use crate::application::panel_publisher::{PanelPublisher, PublishError};
use crate::application::panel_renderer::PanelRenderer;
use crate::domain::outcome::{FailureKind, FetchFailure, FetchOutcome};
use crate::domain::panel::Panel;
use crate::domain::record::OutgoingRecord;
use crate::domain::window::FetchWindow;
use async_trait::async_trait;
use axum::body::Body;
use axum::extract::{Query, State};
use axum::http::{header, Response, StatusCode, Uri};
use axum::response::IntoResponse;
use axum::routing::get;
use axum::Router;
use bytes::Bytes;
use rand::RngCore;
use std::collections::{HashMap, HashSet};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tokio::task::JoinHandle;

/// Random bytes behind a PNG signature
pub fn random_png(len: usize) -> Bytes {
    let mut body = vec![0u8; len];
    rand::thread_rng().fill_bytes(&mut body);
    let signature = b"\x89PNG\r\n\x1a\n";
    let n = signature.len().min(len);
    body[..n].copy_from_slice(&signature[..n]);
    Bytes::from(body)
}

/// Publisher that keeps what it receives, optionally rejecting some keys
#[derive(Default)]
pub struct RecordingPublisher {
    records: Mutex<Vec<OutgoingRecord>>,
    rejected_keys: HashSet<String>,
}

impl RecordingPublisher {
    pub fn failing_for<'a>(keys: impl IntoIterator<Item = &'a str>) -> Self {
        Self {
            records: Mutex::default(),
            rejected_keys: keys.into_iter().map(str::to_string).collect(),
        }
    }

    pub fn records(&self) -> Vec<OutgoingRecord> {
        self.records.lock().unwrap().clone()
    }
}

#[async_trait]
impl PanelPublisher for RecordingPublisher {
    async fn publish(&self, record: OutgoingRecord) -> Result<(), PublishError> {
        if self.rejected_keys.contains(&record.key) {
            return Err(PublishError::Rejected {
                status: 500,
                message: format!("rejected {}", record.key),
            });
        }
        self.records.lock().unwrap().push(record);
        Ok(())
    }
}

/// Renderer answering from a table of images keyed by panel name.
/// Panels missing from the table fail with a 404.
#[derive(Default)]
pub struct StaticRenderer {
    images: HashMap<String, Bytes>,
    panics_for: Option<String>,
    stall: bool,
    delay: Option<Duration>,
    in_flight: AtomicUsize,
    max_in_flight: AtomicUsize,
    calls: Mutex<Vec<(String, FetchWindow)>>,
}

impl StaticRenderer {
    pub fn new<'a>(images: impl IntoIterator<Item = (&'a str, Bytes)>) -> Self {
        Self {
            images: images
                .into_iter()
                .map(|(name, image)| (name.to_string(), image))
                .collect(),
            ..Self::default()
        }
    }

    pub fn empty() -> Self {
        Self::default()
    }

    pub fn panicking_for(mut self, panel: &str) -> Self {
        self.panics_for = Some(panel.to_string());
        self
    }

    /// Every render waits forever
    pub fn stalling(mut self) -> Self {
        self.stall = true;
        self
    }

    /// Every render takes `delay` of tokio time
    pub fn delayed(mut self, delay: Duration) -> Self {
        self.delay = Some(delay);
        self
    }

    /// Most renders ever running at the same time
    pub fn max_in_flight(&self) -> usize {
        self.max_in_flight.load(Ordering::SeqCst)
    }

    pub fn calls(&self) -> Vec<String> {
        self.calls.lock().unwrap().iter().map(|(name, _)| name.clone()).collect()
    }

    pub fn windows(&self) -> Vec<FetchWindow> {
        self.calls.lock().unwrap().iter().map(|(_, window)| *window).collect()
    }
}

#[async_trait]
impl PanelRenderer for StaticRenderer {
    async fn render(&self, _dashboard_id: &str, panel: &Panel, window: &FetchWindow) -> FetchOutcome {
        self.calls.lock().unwrap().push((panel.name.clone(), *window));

        if self.stall {
            futures::future::pending::<()>().await;
        }
        if let Some(delay) = self.delay {
            let running = self.in_flight.fetch_add(1, Ordering::SeqCst) + 1;
            self.max_in_flight.fetch_max(running, Ordering::SeqCst);
            tokio::time::sleep(delay).await;
            self.in_flight.fetch_sub(1, Ordering::SeqCst);
        }
        if self.panics_for.as_deref() == Some(panel.name.as_str()) {
            panic!("renderer blew up on {}", panel.name);
        }

        match self.images.get(&panel.name) {
            Some(image) => FetchOutcome::Success(image.clone()),
            None => FetchOutcome::Failure(FetchFailure::new(
                FailureKind::Status,
                Some(404),
                format!("no image for {}", panel.name),
            )),
        }
    }
}

#[derive(Debug, Clone)]
pub struct RecordedRequest {
    pub path: String,
    pub query: HashMap<String, String>,
}

#[derive(Debug, Clone)]
pub struct StubResponse {
    pub status: u16,
    pub content_type: Option<&'static str>,
    pub location: Option<&'static str>,
    pub body: Bytes,
    pub delay: Option<Duration>,
}

impl StubResponse {
    pub fn png(body: Bytes) -> Self {
        Self {
            status: 200,
            content_type: Some("image/png"),
            location: None,
            body,
            delay: None,
        }
    }

    pub fn with_content_type(mut self, content_type: Option<&'static str>) -> Self {
        self.content_type = content_type;
        self
    }

    pub fn redirect(location: &'static str) -> Self {
        Self {
            status: 302,
            content_type: None,
            location: Some(location),
            body: Bytes::new(),
            delay: None,
        }
    }

    pub fn status(status: u16, body: impl Into<Bytes>) -> Self {
        Self {
            status,
            content_type: Some("text/plain"),
            location: None,
            body: body.into(),
            delay: None,
        }
    }

    /// Hold the response back for `delay` after the request is recorded
    pub fn delayed(mut self, delay: Duration) -> Self {
        self.delay = Some(delay);
        self
    }
}

#[derive(Clone)]
struct StubState {
    responses: Arc<HashMap<String, StubResponse>>,
    requests: Arc<Mutex<Vec<RecordedRequest>>>,
}

/// In-process stand-in for Grafana's `/render/d-solo` endpoint.
/// Responses are keyed by panel name; every request that reaches the
/// server is recorded, including ones outside the render route.
pub struct StubGrafana {
    pub base_url: String,
    requests: Arc<Mutex<Vec<RecordedRequest>>>,
    handle: JoinHandle<()>,
}

impl StubGrafana {
    pub async fn start(responses: HashMap<String, StubResponse>) -> Self {
        let requests = Arc::new(Mutex::new(Vec::new()));
        let state = StubState {
            responses: Arc::new(responses),
            requests: requests.clone(),
        };

        let router = Router::new()
            .route("/render/d-solo/:dashboard/:panel", get(render))
            .fallback(unexpected)
            .with_state(state);

        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        let handle = tokio::spawn(async move {
            axum::serve(listener, router).await.unwrap();
        });

        Self {
            base_url: format!("http://{}", addr),
            requests,
            handle,
        }
    }

    pub fn requests(&self) -> Vec<RecordedRequest> {
        self.requests.lock().unwrap().clone()
    }
}

impl Drop for StubGrafana {
    fn drop(&mut self) {
        self.handle.abort();
    }
}

async fn render(
    State(state): State<StubState>,
    axum::extract::Path((_dashboard, panel)): axum::extract::Path<(String, String)>,
    Query(query): Query<HashMap<String, String>>,
    uri: Uri,
) -> Response<Body> {
    state.requests.lock().unwrap().push(RecordedRequest {
        path: uri.path().to_string(),
        query,
    });

    let Some(stub) = state.responses.get(&panel) else {
        return StatusCode::NOT_FOUND.into_response();
    };
    if let Some(delay) = stub.delay {
        tokio::time::sleep(delay).await;
    }

    let mut response = Response::builder().status(stub.status);
    if let Some(content_type) = stub.content_type {
        response = response.header(header::CONTENT_TYPE, content_type);
    }
    if let Some(location) = stub.location {
        response = response.header(header::LOCATION, location);
    }
    response.body(Body::from(stub.body.clone())).unwrap()
}

async fn unexpected(State(state): State<StubState>, uri: Uri) -> StatusCode {
    state.requests.lock().unwrap().push(RecordedRequest {
        path: uri.path().to_string(),
        query: HashMap::new(),
    });
    StatusCode::NOT_FOUND
}
