//! Client configuration.
//!
//! # Example
//!
//! ```ignore
//! use std::time::Duration;
//! use signalr_client::{ClientOptions, Scheme};
//!
//! let options = ClientOptions::new("example.com", "1.5", "/signalr", "[]")
//!     .with_scheme(Scheme::Http)
//!     .with_max_negotiate_retries(3)
//!     .with_retry_wait_duration(Duration::from_secs(5));
//! ```

// ============================================================================
// Imports
// ============================================================================

use std::fmt;
use std::time::Duration;

// ============================================================================
// Constants
// ============================================================================

/// Default bound on negotiate attempts while the server answers 503.
pub const DEFAULT_MAX_NEGOTIATE_RETRIES: u32 = 5;

/// Default wait between negotiate attempts.
pub const DEFAULT_RETRY_WAIT_DURATION: Duration = Duration::from_secs(60);

// ============================================================================
// Scheme
// ============================================================================

/// Transport security for every phase.
///
/// One setting drives both the HTTP calls and the WebSocket upgrade so they
/// can never disagree.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub enum Scheme {
    /// Plain `http://` and `ws://`.
    Http,
    /// TLS `https://` and `wss://`.
    #[default]
    Https,
}

impl Scheme {
    /// Scheme for the negotiate and start requests.
    #[inline]
    #[must_use]
    pub const fn http(self) -> &'static str {
        match self {
            Self::Http => "http",
            Self::Https => "https",
        }
    }

    /// Scheme for the WebSocket upgrade.
    #[inline]
    #[must_use]
    pub const fn ws(self) -> &'static str {
        match self {
            Self::Http => "ws",
            Self::Https => "wss",
        }
    }
}

impl fmt::Display for Scheme {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.http())
    }
}

// ============================================================================
// ReconnectMode
// ============================================================================

/// What a reconnect does with the negotiated session.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub enum ReconnectMode {
    /// Keep the connection token and redo connect + start.
    #[default]
    ReuseToken,
    /// Negotiate a fresh token before connect + start.
    ///
    /// The reconnect makes a single negotiate request; a 503 fails the
    /// reconnect at once instead of waiting out the retry schedule.
    Renegotiate,
}

// ============================================================================
// ClientOptions
// ============================================================================

/// Connection settings for a [`Client`](super::Client).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClientOptions {
    /// Server host, optionally with port (`example.com:8080`).
    pub host: String,

    /// Client protocol version sent as `clientProtocol`.
    pub protocol: String,

    /// Path prefix of the SignalR endpoint (`/signalr`).
    pub endpoint: String,

    /// Opaque string sent as `connectionData`.
    pub connection_data: String,

    /// HTTP/HTTPS, mirrored to WS/WSS.
    pub scheme: Scheme,

    /// Upper bound on negotiate attempts while the server answers 503.
    pub max_negotiate_retries: u32,

    /// Wait between negotiate attempts.
    pub retry_wait_duration: Duration,

    /// Extra headers sent with every request and the upgrade.
    pub headers: Vec<(String, String)>,

    /// Whether reconnects reuse the token or negotiate again.
    pub reconnect_mode: ReconnectMode,
}

// ============================================================================
// Constructors
// ============================================================================

impl ClientOptions {
    /// Creates options with default scheme, retries and wait.
    #[must_use]
    pub fn new(
        host: impl Into<String>,
        protocol: impl Into<String>,
        endpoint: impl Into<String>,
        connection_data: impl Into<String>,
    ) -> Self {
        Self {
            host: host.into(),
            protocol: protocol.into(),
            endpoint: endpoint.into(),
            connection_data: connection_data.into(),
            scheme: Scheme::default(),
            max_negotiate_retries: DEFAULT_MAX_NEGOTIATE_RETRIES,
            retry_wait_duration: DEFAULT_RETRY_WAIT_DURATION,
            headers: Vec::new(),
            reconnect_mode: ReconnectMode::default(),
        }
    }
}

// ============================================================================
// Builder Methods
// ============================================================================

impl ClientOptions {
    /// Sets the scheme.
    #[inline]
    #[must_use]
    pub fn with_scheme(mut self, scheme: Scheme) -> Self {
        self.scheme = scheme;
        self
    }

    /// Sets the negotiate attempt bound.
    #[inline]
    #[must_use]
    pub fn with_max_negotiate_retries(mut self, retries: u32) -> Self {
        self.max_negotiate_retries = retries;
        self
    }

    /// Sets the wait between negotiate attempts.
    #[inline]
    #[must_use]
    pub fn with_retry_wait_duration(mut self, wait: Duration) -> Self {
        self.retry_wait_duration = wait;
        self
    }

    /// Adds a header to every request.
    #[inline]
    #[must_use]
    pub fn with_header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.headers.push((name.into(), value.into()));
        self
    }

    /// Sets the reconnect mode.
    #[inline]
    #[must_use]
    pub fn with_reconnect_mode(mut self, mode: ReconnectMode) -> Self {
        self.reconnect_mode = mode;
        self
    }
}

// ============================================================================
// Validation
// ============================================================================

impl ClientOptions {
    /// Validates the options.
    ///
    /// # Errors
    ///
    /// Returns an error message if validation fails.
    pub fn validate(&self) -> Result<(), String> {
        self.validate_address()?;

        if self.max_negotiate_retries == 0 {
            return Err("max_negotiate_retries must be at least 1".to_string());
        }

        for (name, value) in &self.headers {
            if name.is_empty() || !name.bytes().all(|b| b.is_ascii_graphic() && b != b':') {
                return Err(format!("invalid header name '{name}'"));
            }
            if value.bytes().any(|b| b == b'\r' || b == b'\n') {
                return Err(format!("invalid header value for '{name}'"));
            }
        }

        Ok(())
    }

    /// Checks that `host` and `endpoint` join into a well-formed base URL.
    pub(crate) fn validate_address(&self) -> Result<(), String> {
        if self.host.trim().is_empty() {
            return Err("host must not be empty".to_string());
        }

        if !self.endpoint.is_empty() && !self.endpoint.starts_with('/') {
            return Err(format!(
                "endpoint must start with '/' (got '{}')",
                self.endpoint
            ));
        }

        Ok(())
    }
}

// ============================================================================
// Tests
// ============================================================================
