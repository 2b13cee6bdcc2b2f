//! Client handle and shared session state.
//!
//! A [`Client`] is a cheap `Arc` handle. Clones share the negotiated
//! session, the current connection, the message pump and the outward
//! [`Messages`] queue.

// ============================================================================
// Imports
// ============================================================================

use std::fmt;
use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use parking_lot::{Mutex, RwLock};
use tokio::sync::mpsc::UnboundedSender;
use tokio_util::sync::CancellationToken;
use tracing::debug;

use crate::error::{Error, Result};
use crate::protocol::{Message, NegotiateResponse};
use crate::transport::{Connection, Dialer, HttpTransport, ReqwestTransport, WsDialer};

use super::builder::ClientBuilder;
use super::options::{ClientOptions, Scheme};
use super::pump::{self, Messages, PumpHandle};

// ============================================================================
// ConnectionState
// ============================================================================

/// Lifecycle state of a [`Client`].
///
/// ```text
/// Uninitialized -> Negotiated -> Connected -> Running <-> Reconnecting
///                                                          |
///                                  Disconnected <----------+
/// ```
///
/// Any state moves to `Closed` through [`Client::close`].
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub enum ConnectionState {
    /// Nothing negotiated yet.
    #[default]
    Uninitialized,
    /// Token and id obtained.
    Negotiated,
    /// WebSocket upgraded, start not yet confirmed.
    Connected,
    /// Started; the current connection is live.
    Running,
    /// Replacing a dropped connection.
    Reconnecting,
    /// A reconnect failed; no current connection.
    Disconnected,
    /// Closed by the caller.
    Closed,
}

impl fmt::Display for ConnectionState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Uninitialized => "uninitialized",
            Self::Negotiated => "negotiated",
            Self::Connected => "connected",
            Self::Running => "running",
            Self::Reconnecting => "reconnecting",
            Self::Disconnected => "disconnected",
            Self::Closed => "closed",
        };
        f.write_str(name)
    }
}

// ============================================================================
// Types
// ============================================================================

/// Identifiers handed out by the negotiate phase.
#[derive(Debug, Default)]
pub(crate) struct Session {
    /// Opaque token echoed on connect and start.
    pub connection_token: String,
    /// Server-assigned connection id.
    pub connection_id: String,
    /// Full negotiate response.
    pub negotiated: Option<NegotiateResponse>,
}

/// Internal shared state for a client.
pub(crate) struct ClientInner {
    /// Immutable configuration.
    pub options: ClientOptions,
    /// Negotiate and start requests.
    pub http: Arc<dyn HttpTransport>,
    /// WebSocket upgrades.
    pub dialer: Arc<dyn Dialer>,
    /// Negotiated identifiers.
    pub session: RwLock<Session>,
    /// Current connection; held across writes.
    pub connection: tokio::sync::Mutex<Option<Arc<dyn Connection>>>,
    /// Lifecycle state.
    pub state: RwLock<ConnectionState>,
    /// Producer side of the outward queue.
    pub messages_tx: UnboundedSender<Result<Message>>,
    /// Consumer side of the outward queue.
    pub messages: Messages,
    /// Running pump, if any.
    pub pump: Mutex<Option<PumpHandle>>,
    /// External cancellation signal.
    pub shutdown: CancellationToken,
}

// ============================================================================
// Client
// ============================================================================

/// A SignalR persistent connection.
///
/// # Example
///
/// ```no_run
/// # use signalr_client::Client;
/// # async fn example() -> signalr_client::Result<()> {
/// let client = Client::new("example.com", "1.5", "/signalr", "[]");
/// client.init().await?;
///
/// let messages = client.messages();
/// if let Some(message) = messages.recv().await {
///     println!("{:?}", message?);
/// }
///
/// client.close().await?;
/// # Ok(())
/// # }
/// ```
#[derive(Clone)]
pub struct Client {
    /// Shared inner state.
    pub(crate) inner: Arc<ClientInner>,
}

// ============================================================================
// Client - Display
// ============================================================================

impl fmt::Debug for Client {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Client")
            .field("host", &self.inner.options.host)
            .field("endpoint", &self.inner.options.endpoint)
            .field("scheme", &self.inner.options.scheme)
            .field("state", &self.state())
            .finish_non_exhaustive()
    }
}

// ============================================================================
// Client - Constructors
// ============================================================================

impl Client {
    /// Creates a client with default scheme (HTTPS), retries and wait.
    ///
    /// Nothing is validated or sent until [`Client::init`] or one of the
    /// phase methods runs.
    #[must_use]
    pub fn new(
        host: impl Into<String>,
        protocol: impl Into<String>,
        endpoint: impl Into<String>,
        connection_data: impl Into<String>,
    ) -> Self {
        Self::from_parts(
            ClientOptions::new(host, protocol, endpoint, connection_data),
            Arc::new(ReqwestTransport::default()),
            Arc::new(WsDialer::default()),
            CancellationToken::new(),
        )
    }

    /// Creates a builder exposing every setting.
    #[inline]
    #[must_use]
    pub fn builder(
        host: impl Into<String>,
        protocol: impl Into<String>,
        endpoint: impl Into<String>,
        connection_data: impl Into<String>,
    ) -> ClientBuilder {
        ClientBuilder::new(ClientOptions::new(host, protocol, endpoint, connection_data))
    }

    /// Assembles a client from validated parts.
    pub(crate) fn from_parts(
        options: ClientOptions,
        http: Arc<dyn HttpTransport>,
        dialer: Arc<dyn Dialer>,
        shutdown: CancellationToken,
    ) -> Self {
        let (messages_tx, messages) = pump::channel();

        debug!(host = %options.host, endpoint = %options.endpoint, scheme = %options.scheme, "Client created");

        Self {
            inner: Arc::new(ClientInner {
                options,
                http,
                dialer,
                session: RwLock::new(Session::default()),
                connection: tokio::sync::Mutex::new(None),
                state: RwLock::new(ConnectionState::Uninitialized),
                messages_tx,
                messages,
                pump: Mutex::new(None),
                shutdown,
            }),
        }
    }
}

// ============================================================================
// Client - Accessors
// ============================================================================

impl Client {
    /// Returns the server host.
    #[inline]
    #[must_use]
    pub fn host(&self) -> &str {
        &self.inner.options.host
    }

    /// Returns the client protocol version.
    #[inline]
    #[must_use]
    pub fn protocol(&self) -> &str {
        &self.inner.options.protocol
    }

    /// Returns the endpoint path prefix.
    #[inline]
    #[must_use]
    pub fn endpoint(&self) -> &str {
        &self.inner.options.endpoint
    }

    /// Returns the opaque connection data.
    #[inline]
    #[must_use]
    pub fn connection_data(&self) -> &str {
        &self.inner.options.connection_data
    }

    /// Returns the scheme used for every phase.
    #[inline]
    #[must_use]
    pub fn scheme(&self) -> Scheme {
        self.inner.options.scheme
    }

    /// Returns the negotiate attempt bound.
    #[inline]
    #[must_use]
    pub fn max_negotiate_retries(&self) -> u32 {
        self.inner.options.max_negotiate_retries
    }

    /// Returns the wait between negotiate attempts.
    #[inline]
    #[must_use]
    pub fn retry_wait_duration(&self) -> Duration {
        self.inner.options.retry_wait_duration
    }

    /// Returns the full configuration.
    #[inline]
    #[must_use]
    pub fn options(&self) -> &ClientOptions {
        &self.inner.options
    }

    /// Returns the connection token, empty until negotiated.
    #[must_use]
    pub fn connection_token(&self) -> String {
        self.inner.session.read().connection_token.clone()
    }

    /// Returns the connection id, empty until negotiated.
    #[must_use]
    pub fn connection_id(&self) -> String {
        self.inner.session.read().connection_id.clone()
    }

    /// Returns the last negotiate response.
    #[must_use]
    pub fn negotiate_response(&self) -> Option<NegotiateResponse> {
        self.inner.session.read().negotiated.clone()
    }

    /// Returns the lifecycle state.
    #[inline]
    #[must_use]
    pub fn state(&self) -> ConnectionState {
        *self.inner.state.read()
    }

    /// Returns a handle to the outward message queue.
    ///
    /// All handles share one receiver; each message is delivered once.
    #[inline]
    #[must_use]
    pub fn messages(&self) -> Messages {
        self.inner.messages.clone()
    }

    /// Returns the current connection, if started.
    pub async fn connection(&self) -> Option<Arc<dyn Connection>> {
        self.inner.connection.lock().await.clone()
    }

    /// Returns the client's cancellation token.
    #[inline]
    #[must_use]
    pub fn cancellation_token(&self) -> &CancellationToken {
        &self.inner.shutdown
    }
}

// ============================================================================
// Client - Internal
// ============================================================================

impl Client {
    /// Races `fut` against the cancellation token.
    pub(crate) async fn cancellable<T, F>(&self, fut: F) -> Result<T>
    where
        F: Future<Output = Result<T>>,
    {
        tokio::select! {
            biased;
            () = self.inner.shutdown.cancelled() => Err(Error::Cancelled),
            result = fut => result,
        }
    }

    /// Sets the lifecycle state.
    pub(crate) fn set_state(&self, state: ConnectionState) {
        let mut current = self.inner.state.write();
        let previous = *current;
        if previous != state {
            debug!(from = %previous, to = %state, "State changed");
            *current = state;
        }
    }

    /// Moves to `to` only when the current state is one of `from`.
    pub(crate) fn advance(&self, from: &[ConnectionState], to: ConnectionState) {
        let mut current = self.inner.state.write();
        let previous = *current;
        if from.contains(&previous) {
            debug!(from = %previous, to = %to, "State changed");
            *current = to;
        }
    }

    /// Forgets the negotiated session.
    pub(crate) fn reset_session(&self) {
        *self.inner.session.write() = Session::default();
        self.set_state(ConnectionState::Uninitialized);
    }

    /// Publishes an item on the outward queue.
    pub(crate) fn publish(&self, item: Result<Message>) {
        // The client holds a receiver, so the queue outlives every sender.
        let _ = self.inner.messages_tx.send(item);
    }
}

// ============================================================================
// Tests
// ============================================================================
