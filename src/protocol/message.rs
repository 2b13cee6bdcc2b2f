//! Message envelope types.
//!
//! Every frame the server pushes after the handshake is a JSON object using
//! single-letter keys. An empty object is a keep-alive.

// ============================================================================
// Imports
// ============================================================================

use serde::{Deserialize, Serialize};
use serde_json::Value;

// ============================================================================
// Message
// ============================================================================

/// A persistent-connection message from server to client.
///
/// # Format
///
/// ```json
/// {
///   "C": "d-9B7A6976-B,0|C,0|D,1",
///   "G": "groups-token",
///   "M": [ { "H": "chathub", "M": "broadcast", "A": ["hi"] } ]
/// }
/// ```
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Message {
    /// Message id (cursor) of this batch.
    #[serde(rename = "C", default, skip_serializing_if = "Option::is_none")]
    pub message_id: Option<String>,

    /// Initialization flag.
    #[serde(rename = "S", default, skip_serializing_if = "Option::is_none")]
    pub initialized: Option<i64>,

    /// Groups token.
    #[serde(rename = "G", default, skip_serializing_if = "Option::is_none")]
    pub groups_token: Option<String>,

    /// Payloads, opaque to the connection layer.
    #[serde(rename = "M", default, skip_serializing_if = "Vec::is_empty")]
    pub payloads: Vec<Value>,

    /// Invocation id this message answers.
    #[serde(rename = "I", default, skip_serializing_if = "Option::is_none")]
    pub invocation_id: Option<String>,

    /// Invocation result.
    #[serde(rename = "R", default, skip_serializing_if = "Option::is_none")]
    pub result: Option<Value>,

    /// Invocation error.
    #[serde(rename = "E", default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,

    /// Set to `1` when the server asks the client to reconnect.
    #[serde(rename = "T", default, skip_serializing_if = "Option::is_none")]
    pub reconnect: Option<i64>,
}

impl Message {
    /// Returns `true` for the empty `{}` keep-alive frame.
    #[inline]
    #[must_use]
    pub fn is_keep_alive(&self) -> bool {
        *self == Self::default()
    }

    /// Returns `true` if the server requested a reconnect.
    #[inline]
    #[must_use]
    pub fn should_reconnect(&self) -> bool {
        self.reconnect == Some(1)
    }

    /// Decodes the payloads as hub messages.
    ///
    /// Payloads that do not have the hub shape yield an error item.
    pub fn hub_messages(&self) -> impl Iterator<Item = serde_json::Result<HubMessage>> + '_ {
        self.payloads
            .iter()
            .map(|payload| HubMessage::deserialize(payload))
    }
}

// ============================================================================
// HubMessage
// ============================================================================

/// A hub invocation carried inside a message.
///
/// # Format
///
/// ```json
/// { "H": "chathub", "M": "send", "A": ["hello"], "I": 0 }
/// ```
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct HubMessage {
    /// Hub name.
    #[serde(rename = "H")]
    pub hub: String,

    /// Method name.
    #[serde(rename = "M", default)]
    pub method: String,

    /// Positional arguments.
    #[serde(rename = "A", default)]
    pub args: Vec<Value>,

    /// Invocation id, set on client-to-server calls.
    #[serde(rename = "I", default, skip_serializing_if = "Option::is_none")]
    pub invocation_id: Option<u64>,
}

impl HubMessage {
    /// Creates a hub message with no arguments.
    #[inline]
    #[must_use]
    pub fn new(hub: impl Into<String>, method: impl Into<String>) -> Self {
        Self {
            hub: hub.into(),
            method: method.into(),
            args: Vec::new(),
            invocation_id: None,
        }
    }

    /// Sets the positional arguments.
    #[must_use]
    pub fn with_args<I, T>(mut self, args: I) -> Self
    where
        I: IntoIterator<Item = T>,
        T: Into<Value>,
    {
        self.args = args.into_iter().map(Into::into).collect();
        self
    }

    /// Sets the invocation id.
    #[inline]
    #[must_use]
    pub fn with_invocation_id(mut self, id: u64) -> Self {
        self.invocation_id = Some(id);
        self
    }
}

// ============================================================================
// Tests
// ============================================================================
