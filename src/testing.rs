//! Test doubles for the transport seams and an in-process SignalR server.

// ============================================================================
// Imports
// ============================================================================

use std::collections::VecDeque;
use std::net::{IpAddr, Ipv4Addr, SocketAddr};
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::time::Duration;

use async_trait::async_trait;
use axum::Router;
use axum::extract::ws::{Message as WsMessage, WebSocket, WebSocketUpgrade};
use axum::extract::{OriginalUri, State};
use axum::http::{StatusCode, Uri, header};
use axum::response::{IntoResponse, Response};
use axum::routing::get;
use parking_lot::Mutex;
use serde_json::Value;
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::TcpListener;
use tokio::sync::{Notify, Semaphore};
use url::Url;

use crate::error::{Error, Result};
use crate::transport::{Connection, Dialer, Frame, HttpResponse, HttpTransport};

// ============================================================================
// Constants
// ============================================================================

/// Negotiate body used across tests.
pub(crate) const NEGOTIATE_BODY: &str = r#"{"ConnectionToken":"hello world","ConnectionId":"1234-ABC","URL":"/signalr","ProtocolVersion":"1337"}"#;

/// Start body for a successful start.
pub(crate) const STARTED_BODY: &str = r#"{"Response":"started"}"#;

/// Init frame for an activated session.
pub(crate) const INIT_FRAME: &str = r#"{"S":1}"#;

/// Upper bound for any single wait in tests.
pub(crate) const TEST_TIMEOUT: Duration = Duration::from_secs(5);

// ============================================================================
// Logging
// ============================================================================

/// Installs a test-friendly tracing subscriber once.
pub(crate) fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::new("signalr_client=debug"))
        .with_test_writer()
        .try_init();
}

/// Polls `check` until it holds or the test timeout elapses.
pub(crate) async fn eventually(mut check: impl FnMut() -> bool) {
    tokio::time::timeout(TEST_TIMEOUT, async {
        while !check() {
            tokio::time::sleep(Duration::from_millis(10)).await;
        }
    })
    .await
    .expect("condition should hold in time");
}

// ============================================================================
// FakeConnection
// ============================================================================

/// Scripted [`Connection`] that records writes.
///
/// Reads pop queued frames and wait for more once the queue is empty.
/// Writes after `close` fail with [`Error::ConnectionClosed`].
#[derive(Default)]
pub(crate) struct FakeConnection {
    frames: Mutex<VecDeque<Result<Frame>>>,
    arrived: Notify,
    written: Mutex<Vec<Value>>,
    write_error: Mutex<Option<Error>>,
    write_gate: Mutex<Option<Arc<Semaphore>>>,
    held_writes: AtomicUsize,
    closed: AtomicBool,
}

impl FakeConnection {
    /// Creates a connection that will yield `frames` in order.
    pub(crate) fn with_frames(frames: impl IntoIterator<Item = Result<Frame>>) -> Arc<Self> {
        let conn = Self::default();
        conn.frames.lock().extend(frames);
        Arc::new(conn)
    }

    /// Creates a connection whose first frame is the init frame.
    pub(crate) fn started() -> Arc<Self> {
        Self::with_frames([Ok(Frame::text(INIT_FRAME))])
    }

    /// Queues another read result.
    pub(crate) fn push(&self, frame: Result<Frame>) {
        self.frames.lock().push_back(frame);
        self.arrived.notify_one();
    }

    /// Makes the next write fail with `err`.
    pub(crate) fn fail_next_write(&self, err: Error) {
        *self.write_error.lock() = Some(err);
    }

    /// Parks every following write until [`FakeConnection::release_writes`].
    pub(crate) fn hold_writes(&self) {
        *self.write_gate.lock() = Some(Arc::new(Semaphore::new(0)));
    }

    /// Lets parked and future writes through.
    pub(crate) fn release_writes(&self) {
        if let Some(gate) = self.write_gate.lock().take() {
            gate.close();
        }
    }

    /// Returns how many writes reached the gate.
    pub(crate) fn held_writes(&self) -> usize {
        self.held_writes.load(Ordering::SeqCst)
    }

    /// Returns every value written so far.
    pub(crate) fn written(&self) -> Vec<Value> {
        self.written.lock().clone()
    }

    /// Returns `true` once `close` was called.
    pub(crate) fn is_closed(&self) -> bool {
        self.closed.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl Connection for FakeConnection {
    async fn read_frame(&self) -> Result<Frame> {
        loop {
            let next = self.frames.lock().pop_front();
            if let Some(frame) = next {
                return frame;
            }
            self.arrived.notified().await;
        }
    }

    async fn write_json(&self, value: &Value) -> Result<()> {
        let gate = self.write_gate.lock().clone();
        if let Some(gate) = gate {
            self.held_writes.fetch_add(1, Ordering::SeqCst);
            // Closed on release.
            let _ = gate.acquire().await;
        }

        let failure = self.write_error.lock().take();
        if let Some(err) = failure {
            return Err(err);
        }
        if self.is_closed() {
            return Err(Error::ConnectionClosed);
        }
        self.written.lock().push(value.clone());
        Ok(())
    }

    async fn close(&self) -> Result<()> {
        self.closed.store(true, Ordering::SeqCst);
        Ok(())
    }
}

// ============================================================================
// FakeHttp
// ============================================================================

/// Scripted [`HttpTransport`] answering by path suffix.
#[derive(Default)]
pub(crate) struct FakeHttp {
    replies: Mutex<Vec<(&'static str, VecDeque<HttpResponse>)>>,
    requests: Mutex<Vec<Url>>,
}

impl FakeHttp {
    /// Creates a transport with no scripted replies.
    pub(crate) fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    /// Creates a transport answering negotiate and start successfully.
    pub(crate) fn handshake() -> Arc<Self> {
        let http = Self::new();
        http.reply("/negotiate", 200, NEGOTIATE_BODY);
        http.reply("/start", 200, STARTED_BODY);
        http
    }

    /// Queues a reply for paths ending in `suffix`.
    ///
    /// Replies are used in order; the last one repeats for later requests.
    pub(crate) fn reply(&self, suffix: &'static str, status: u16, body: &str) {
        let mut replies = self.replies.lock();
        let response = HttpResponse::new(status, body);
        match replies.iter_mut().find(|(s, _)| *s == suffix) {
            Some((_, queue)) => queue.push_back(response),
            None => replies.push((suffix, VecDeque::from([response]))),
        }
    }

    /// Returns how many requests hit paths ending in `suffix`.
    pub(crate) fn hits(&self, suffix: &str) -> usize {
        self.requests
            .lock()
            .iter()
            .filter(|url| url.path().ends_with(suffix))
            .count()
    }

    /// Returns all requested URLs.
    pub(crate) fn requests(&self) -> Vec<Url> {
        self.requests.lock().clone()
    }
}

#[async_trait]
impl HttpTransport for FakeHttp {
    async fn get(&self, url: &Url, _headers: &[(String, String)]) -> Result<HttpResponse> {
        self.requests.lock().push(url.clone());

        let mut replies = self.replies.lock();
        let queue = replies
            .iter_mut()
            .find(|(suffix, _)| url.path().ends_with(suffix))
            .map(|(_, queue)| queue)
            .ok_or(Error::ConnectionClosed)?;

        if queue.len() > 1 {
            queue.pop_front().ok_or(Error::ConnectionClosed)
        } else {
            queue.front().cloned().ok_or(Error::ConnectionClosed)
        }
    }
}

// ============================================================================
// FakeDialer
// ============================================================================

/// Scripted [`Dialer`] handing out queued connections.
#[derive(Default)]
pub(crate) struct FakeDialer {
    connections: Mutex<VecDeque<Result<Arc<dyn Connection>>>>,
    dials: Mutex<Vec<Url>>,
}

impl FakeDialer {
    /// Creates a dialer yielding `connections` in order.
    pub(crate) fn with(
        connections: impl IntoIterator<Item = Result<Arc<dyn Connection>>>,
    ) -> Arc<Self> {
        let dialer = Self::default();
        dialer.connections.lock().extend(connections);
        Arc::new(dialer)
    }

    /// Returns how many upgrades were attempted.
    pub(crate) fn dials(&self) -> usize {
        self.dials.lock().len()
    }

    /// Returns the URL of the most recent upgrade.
    pub(crate) fn last_url(&self) -> Option<Url> {
        self.dials.lock().last().cloned()
    }
}

#[async_trait]
impl Dialer for FakeDialer {
    async fn dial(&self, url: &Url, _headers: &[(String, String)]) -> Result<Arc<dyn Connection>> {
        self.dials.lock().push(url.clone());
        self.connections
            .lock()
            .pop_front()
            .unwrap_or(Err(Error::ConnectionClosed))
    }
}

// ============================================================================
// ScriptedServer
// ============================================================================

/// Behaviour of one accepted WebSocket.
#[derive(Debug, Clone, Default)]
pub(crate) struct WsSession {
    /// Text frames sent right after the upgrade.
    pub frames: Vec<String>,
    /// Close the socket once the frames are sent.
    pub close_after: bool,
}

impl WsSession {
    /// Sends `frames` then keeps reading until the client leaves.
    pub(crate) fn open<'a>(frames: impl IntoIterator<Item = &'a str>) -> Self {
        Self {
            frames: frames.into_iter().map(str::to_string).collect(),
            close_after: false,
        }
    }

    /// Sends `frames` then closes.
    pub(crate) fn closing<'a>(frames: impl IntoIterator<Item = &'a str>) -> Self {
        Self {
            close_after: true,
            ..Self::open(frames)
        }
    }
}

/// What the server answers on each endpoint.
#[derive(Debug, Clone)]
pub(crate) struct Script {
    /// Status and body for `/negotiate`.
    pub negotiate: (u16, String),
    /// Status and body for `/start`.
    pub start: (u16, String),
    /// One entry per `/connect`; further upgrades are refused with 500.
    pub sessions: Vec<WsSession>,
}

impl Default for Script {
    fn default() -> Self {
        Self {
            negotiate: (200, NEGOTIATE_BODY.to_string()),
            start: (200, STARTED_BODY.to_string()),
            sessions: Vec::new(),
        }
    }
}

/// Shared state between the router and the test.
struct ServerState {
    script: Script,
    connects: AtomicUsize,
    hits: Mutex<Vec<String>>,
    received: Mutex<Vec<String>>,
    received_notify: Notify,
}

impl ServerState {
    fn record(&self, uri: &Uri) {
        self.hits.lock().push(uri.path().to_string());
    }
}

/// A SignalR endpoint on `127.0.0.1` with a random port.
///
/// HTTP handshake calls and WebSocket upgrades share the port, the way a
/// real server exposes them. Routes answer at the root and under
/// `/signalr`.
pub(crate) struct ScriptedServer {
    addr: SocketAddr,
    state: Arc<ServerState>,
}

impl ScriptedServer {
    /// Binds to a random port and starts serving.
    pub(crate) async fn spawn(script: Script) -> Self {
        let state = Arc::new(ServerState {
            script,
            connects: AtomicUsize::new(0),
            hits: Mutex::new(Vec::new()),
            received: Mutex::new(Vec::new()),
            received_notify: Notify::new(),
        });

        let router = Router::new()
            .merge(signalr_routes())
            .nest("/signalr", signalr_routes())
            .with_state(Arc::clone(&state));

        let listener = TcpListener::bind(SocketAddr::new(IpAddr::V4(Ipv4Addr::LOCALHOST), 0))
            .await
            .expect("bind should succeed");
        let addr = listener.local_addr().expect("local addr");

        tokio::spawn(async move {
            axum::serve(listener, router)
                .await
                .expect("scripted server failed");
        });

        Self { addr, state }
    }

    /// Returns `host:port` as the client's `host` setting.
    pub(crate) fn host(&self) -> String {
        self.addr.to_string()
    }

    /// Returns a `ws://` URL for `path`.
    pub(crate) fn ws_url(&self, path: &str) -> Url {
        Url::parse(&format!("ws://{}{path}", self.addr)).expect("url")
    }

    /// Returns how many requests hit paths ending in `suffix`.
    pub(crate) fn hits(&self, suffix: &str) -> usize {
        self.state
            .hits
            .lock()
            .iter()
            .filter(|path| path.ends_with(suffix))
            .count()
    }

    /// Returns every text frame received from clients.
    pub(crate) fn received(&self) -> Vec<String> {
        self.state.received.lock().clone()
    }

    /// Waits until at least `count` frames were received.
    pub(crate) async fn wait_received(&self, count: usize) {
        tokio::time::timeout(TEST_TIMEOUT, async {
            loop {
                let notified = self.state.received_notify.notified();
                if self.state.received.lock().len() >= count {
                    return;
                }
                notified.await;
            }
        })
        .await
        .expect("server should receive frames");
    }
}

fn signalr_routes() -> Router<Arc<ServerState>> {
    Router::new()
        .route("/negotiate", get(handle_negotiate))
        .route("/start", get(handle_start))
        .route("/connect", get(handle_connect))
}

async fn handle_negotiate(
    State(state): State<Arc<ServerState>>,
    OriginalUri(uri): OriginalUri,
) -> Response {
    state.record(&uri);
    scripted_reply(&state.script.negotiate)
}

async fn handle_start(
    State(state): State<Arc<ServerState>>,
    OriginalUri(uri): OriginalUri,
) -> Response {
    state.record(&uri);
    scripted_reply(&state.script.start)
}

/// Upgrades into the next scripted session, or refuses with 500.
async fn handle_connect(
    ws: WebSocketUpgrade,
    State(state): State<Arc<ServerState>>,
    OriginalUri(uri): OriginalUri,
) -> Response {
    state.record(&uri);

    let index = state.connects.fetch_add(1, Ordering::SeqCst);
    match state.script.sessions.get(index).cloned() {
        Some(session) => ws.on_upgrade(move |socket| play_session(socket, session, state)),
        None => StatusCode::INTERNAL_SERVER_ERROR.into_response(),
    }
}

fn scripted_reply((status, body): &(u16, String)) -> Response {
    let status = StatusCode::from_u16(*status).expect("scripted status must be a valid code");
    (
        status,
        [(header::CONTENT_TYPE, "application/json")],
        body.clone(),
    )
        .into_response()
}

/// Plays a scripted session on an upgraded socket.
async fn play_session(mut socket: WebSocket, session: WsSession, state: Arc<ServerState>) {
    for frame in session.frames {
        if socket.send(WsMessage::Text(frame.into())).await.is_err() {
            return;
        }
    }

    if session.close_after {
        let _ = socket.send(WsMessage::Close(None)).await;
        return;
    }

    while let Some(Ok(message)) = socket.recv().await {
        match message {
            WsMessage::Text(text) => {
                state.received.lock().push(text.as_str().to_owned());
                state.received_notify.notify_waiters();
            }
            WsMessage::Close(_) => break,
            _ => {}
        }
    }
}

// ============================================================================
// RawStatusServer
// ============================================================================

/// Answers every request with a fixed, possibly invalid, status line.
///
/// Covers status codes no conforming HTTP server can emit, such as `9001`.
pub(crate) struct RawStatusServer {
    addr: SocketAddr,
    hits: Arc<AtomicUsize>,
}

impl RawStatusServer {
    /// Serves `HTTP/1.1 {status_line}` on a random port.
    pub(crate) async fn spawn(status_line: &'static str) -> Self {
        let listener = TcpListener::bind(SocketAddr::new(IpAddr::V4(Ipv4Addr::LOCALHOST), 0))
            .await
            .expect("bind should succeed");
        let addr = listener.local_addr().expect("local addr");
        let hits = Arc::new(AtomicUsize::new(0));

        let counter = Arc::clone(&hits);
        tokio::spawn(async move {
            while let Ok((mut stream, _)) = listener.accept().await {
                counter.fetch_add(1, Ordering::SeqCst);
                tokio::spawn(async move {
                    let mut buf = [0u8; 4096];
                    let _ = stream.read(&mut buf).await;
                    let response =
                        format!("HTTP/1.1 {status_line}\r\nContent-Length: 0\r\n\r\n");
                    let _ = stream.write_all(response.as_bytes()).await;
                    let _ = stream.shutdown().await;
                });
            }
        });

        Self { addr, hits }
    }

    /// Returns `host:port` as the client's `host` setting.
    pub(crate) fn host(&self) -> String {
        self.addr.to_string()
    }

    /// Returns how many connections were accepted.
    pub(crate) fn hits(&self) -> usize {
        self.hits.load(Ordering::SeqCst)
    }
}
