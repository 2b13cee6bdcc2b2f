//! Handshake response types.
//!
//! The negotiate and start phases answer over plain HTTP with small JSON
//! objects; the connect phase is confirmed by the first WebSocket frame.

// ============================================================================
// Imports
// ============================================================================

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::error::{Error, Result};

// ============================================================================
// Constants
// ============================================================================

/// `Response` value the server sends when `/start` succeeds.
const STARTED: &str = "started";

/// `S` value of the init frame for an activated session.
const INITIALIZED: i64 = 1;

// ============================================================================
// NegotiateResponse
// ============================================================================

/// Body of a successful `/negotiate` call.
///
/// # Format
///
/// ```json
/// {
///   "Url": "/signalr",
///   "ConnectionToken": "...",
///   "ConnectionId": "1234-ABC",
///   "KeepAliveTimeout": 20.0,
///   "DisconnectTimeout": 30.0,
///   "ProtocolVersion": "1.5"
/// }
/// ```
///
/// Only the token and id are required; timeouts are reported in seconds
/// and kept for callers that want them.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NegotiateResponse {
    /// Opaque token echoed on every later request.
    #[serde(rename = "ConnectionToken")]
    pub connection_token: String,

    /// Server-assigned connection id.
    #[serde(rename = "ConnectionId")]
    pub connection_id: String,

    /// Endpoint path as the server sees it.
    #[serde(rename = "Url", alias = "URL", default)]
    pub url: String,

    /// Protocol version the server speaks.
    #[serde(rename = "ProtocolVersion", default)]
    pub protocol_version: String,

    /// Interval after which a silent connection is considered dead.
    #[serde(rename = "KeepAliveTimeout", default)]
    pub keep_alive_timeout: Option<f64>,

    /// How long the server keeps the session after a disconnect.
    #[serde(rename = "DisconnectTimeout", default)]
    pub disconnect_timeout: Option<f64>,

    /// Long-poll connection timeout.
    #[serde(rename = "ConnectionTimeout", default)]
    pub connection_timeout: Option<f64>,

    /// Whether the server accepts the WebSocket transport.
    #[serde(rename = "TryWebSockets", default)]
    pub try_websockets: Option<bool>,

    /// Time the server allows for a transport to connect.
    #[serde(rename = "TransportConnectTimeout", default)]
    pub transport_connect_timeout: Option<f64>,

    /// Delay between long-poll requests.
    #[serde(rename = "LongPollDelay", default)]
    pub long_poll_delay: Option<f64>,
}

// ============================================================================
// StartResponse
// ============================================================================

/// Body of a `/start` call.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct StartResponse {
    /// `"started"` on success.
    #[serde(rename = "Response", default)]
    pub response: String,
}

impl StartResponse {
    /// Returns `true` if the server acknowledged the start.
    #[inline]
    #[must_use]
    pub fn is_started(&self) -> bool {
        self.response == STARTED
    }

    /// Converts a non-`started` answer into [`Error::StartRejected`].
    ///
    /// # Errors
    ///
    /// Returns [`Error::StartRejected`] carrying the received value.
    pub fn ensure_started(self) -> Result<()> {
        if self.is_started() {
            Ok(())
        } else {
            Err(Error::start_rejected(self.response))
        }
    }
}

// ============================================================================
// InitMessage
// ============================================================================

/// The first frame read after the upgrade.
///
/// Any integer other than `1`, or a missing field, means the server did not
/// activate the session.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct InitMessage {
    /// Activation flag.
    #[serde(rename = "S", default)]
    pub initialized: Option<Value>,
}

impl InitMessage {
    /// Checks the activation flag.
    ///
    /// # Errors
    ///
    /// Returns [`Error::UnexpectedInitValue`] with the received value.
    pub fn ensure_initialized(self) -> Result<()> {
        match self.initialized {
            Some(value) if value.as_i64() == Some(INITIALIZED) => Ok(()),
            Some(value) => Err(Error::unexpected_init_value(value)),
            None => Err(Error::unexpected_init_value(Value::Null)),
        }
    }
}

// ============================================================================
// Tests
// ============================================================================
