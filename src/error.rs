//! Error types for the SignalR client.
//!
//! Every fallible operation returns [`Result<T>`] which uses [`Error`].
//! Variants form a closed set so callers can match on the failure kind
//! instead of inspecting message text, while the `Display` output keeps
//! the wording servers and operators already grep for.
//!
//! # Usage
//!
//! ```ignore
//! use signalr_client::{Client, Error};
//!
//! match client.send(&payload).await {
//!     Err(Error::ConnectionNotSet) => { /* reconnecting, try later */ }
//!     Err(e) => return Err(e),
//!     Ok(()) => {}
//! }
//! ```
//!
//! # Error Categories
//!
//! | Category | Variants |
//! |----------|----------|
//! | Configuration | [`Error::Config`], [`Error::Url`] |
//! | Transient | [`Error::RetriesExhausted`] |
//! | HTTP status | [`Error::Status`], [`Error::MalformedStatus`] |
//! | Protocol | [`Error::StartRejected`], [`Error::UnexpectedFrameType`], [`Error::UnexpectedInitValue`] |
//! | Transport | [`Error::WebSocket`], [`Error::Http`], [`Error::ConnectionClosed`] |
//! | Precondition | [`Error::ConnectionNotSet`] |
//! | External | [`Error::Json`], [`Error::Cancelled`] |

// ============================================================================
// Imports
// ============================================================================

use std::result::Result as StdResult;

use reqwest::StatusCode;
use serde_json::Value;
use thiserror::Error;
use tokio_tungstenite::tungstenite::Error as WsError;

use crate::transport::FrameKind;

// ============================================================================
// Result Alias
// ============================================================================

/// Result type alias using crate [`enum@Error`].
pub type Result<T> = StdResult<T, Error>;

// ============================================================================
// Error Enum
// ============================================================================

/// Main error type for the crate.
#[derive(Error, Debug)]
pub enum Error {
    // ========================================================================
    // Configuration Errors
    // ========================================================================
    /// Client configuration is invalid.
    #[error("Configuration error: {message}")]
    Config {
        /// Description of the configuration error.
        message: String,
    },

    /// A handshake URL could not be built from host and endpoint.
    #[error("invalid URL: {0}")]
    Url(#[from] url::ParseError),

    // ========================================================================
    // HTTP Status Errors
    // ========================================================================
    /// Server kept answering `503 Service Unavailable` during negotiation.
    #[error("retries exhausted after {attempts} attempts: {last}")]
    RetriesExhausted {
        /// Number of negotiate requests made.
        attempts: u32,
        /// Status error from the final attempt.
        #[source]
        last: Box<Error>,
    },

    /// Non-success HTTP status with a well-formed code.
    ///
    /// Displays as `"{code} {reason}"`, e.g. `404 Not Found`.
    #[error("{code} {reason}")]
    Status {
        /// Numeric status code.
        code: u16,
        /// Reason phrase for the code.
        reason: String,
    },

    /// Status code outside the HTTP range.
    ///
    /// Usually points at a misbehaving proxy rather than the SignalR server.
    /// `code` is `None` when the HTTP stack rejected the status line before
    /// a number could be read from it.
    #[error("malformed HTTP status code{}", display_code(.code))]
    MalformedStatus {
        /// The code as received, if it could be parsed.
        code: Option<u16>,
    },

    // ========================================================================
    // Protocol Errors
    // ========================================================================
    /// The `/start` call answered with something other than `started`.
    #[error("start response is not 'started': {response}")]
    StartRejected {
        /// The `Response` value the server sent.
        response: String,
    },

    /// A frame arrived whose type the handshake does not accept.
    #[error("unexpected websocket control type: {kind}")]
    UnexpectedFrameType {
        /// Type of the offending frame.
        kind: FrameKind,
    },

    /// The init frame carried an `S` value other than `1`.
    #[error("unexpected S value received from server: {value}")]
    UnexpectedInitValue {
        /// The `S` field as received (`null` when absent).
        value: Value,
    },

    // ========================================================================
    // Connection Errors
    // ========================================================================
    /// `send` was called while no connection is current.
    #[error("send: connection not set")]
    ConnectionNotSet,

    /// The WebSocket was closed by the peer.
    #[error("Connection closed")]
    ConnectionClosed,

    /// The client's cancellation token fired while an operation was blocked.
    #[error("operation cancelled")]
    Cancelled,

    // ========================================================================
    // External Errors
    // ========================================================================
    /// JSON decode or encode error, surfaced with the parser's own message.
    #[error(transparent)]
    Json(#[from] serde_json::Error),

    /// WebSocket transport error, including rejected upgrades.
    #[error(transparent)]
    WebSocket(#[from] WsError),

    /// HTTP transport error.
    #[error(transparent)]
    Http(#[from] reqwest::Error),
}

// ============================================================================
// Error Constructors
// ============================================================================

impl Error {
    /// Creates a configuration error.
    #[inline]
    pub fn config(message: impl Into<String>) -> Self {
        Self::Config {
            message: message.into(),
        }
    }

    /// Classifies a non-success status code.
    ///
    /// Codes in `100..=599` become [`Error::Status`] carrying the canonical
    /// reason phrase, or `status code {code}` when none is registered.
    /// Anything else is [`Error::MalformedStatus`].
    #[must_use]
    pub fn from_status(code: u16) -> Self {
        if !(100..=599).contains(&code) {
            return Self::MalformedStatus { code: Some(code) };
        }

        let reason = StatusCode::from_u16(code)
            .ok()
            .and_then(|status| status.canonical_reason())
            .map_or_else(|| format!("status code {code}"), str::to_string);

        Self::Status { code, reason }
    }

    /// Creates a retries exhausted error wrapping the last failure.
    #[inline]
    pub fn retries_exhausted(attempts: u32, last: Error) -> Self {
        Self::RetriesExhausted {
            attempts,
            last: Box::new(last),
        }
    }

    /// Creates a start rejected error.
    #[inline]
    pub fn start_rejected(response: impl Into<String>) -> Self {
        Self::StartRejected {
            response: response.into(),
        }
    }

    /// Creates an unexpected frame type error.
    #[inline]
    pub fn unexpected_frame_type(kind: FrameKind) -> Self {
        Self::UnexpectedFrameType { kind }
    }

    /// Creates an unexpected init value error.
    #[inline]
    pub fn unexpected_init_value(value: Value) -> Self {
        Self::UnexpectedInitValue { value }
    }
}

fn display_code(code: &Option<u16>) -> String {
    code.map(|code| format!(" {code}")).unwrap_or_default()
}

// ============================================================================
// Error Predicates
// ============================================================================

impl Error {
    /// Returns the HTTP status code carried by this error, if any.
    #[must_use]
    pub fn status_code(&self) -> Option<u16> {
        match self {
            Self::Status { code, .. } => Some(*code),
            Self::MalformedStatus { code } => *code,
            Self::RetriesExhausted { last, .. } => last.status_code(),
            _ => None,
        }
    }

    /// Returns `true` if the server signalled temporary unavailability.
    #[inline]
    #[must_use]
    pub fn is_retryable(&self) -> bool {
        matches!(
            self,
            Self::Status { code: 503, .. } | Self::RetriesExhausted { .. }
        )
    }

    /// Returns `true` if the server broke the handshake contract.
    #[inline]
    #[must_use]
    pub fn is_protocol_violation(&self) -> bool {
        matches!(
            self,
            Self::StartRejected { .. }
                | Self::UnexpectedFrameType { .. }
                | Self::UnexpectedInitValue { .. }
        )
    }

    /// Returns `true` if the failure came from the HTTP or WebSocket layer.
    #[inline]
    #[must_use]
    pub fn is_transport_error(&self) -> bool {
        matches!(
            self,
            Self::WebSocket(_) | Self::Http(_) | Self::ConnectionClosed
        )
    }

    /// Returns `true` if the server refused the WebSocket upgrade.
    #[inline]
    #[must_use]
    pub fn is_bad_handshake(&self) -> bool {
        matches!(self, Self::WebSocket(WsError::Http(_)))
    }
}

// ============================================================================
// Tests
// ============================================================================
