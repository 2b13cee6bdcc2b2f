//! SignalR client - persistent connections over WebSocket.
//!
//! This library implements the client side of the legacy SignalR
//! persistent-connection protocol: an HTTP handshake that upgrades into a
//! long-lived WebSocket session, with a background reader that publishes
//! server messages and re-establishes the session when the socket drops.
//!
//! # Architecture
//!
//! The handshake runs in three strictly ordered phases:
//!
//! - **Negotiate** (`GET /negotiate`): obtains the connection token and id,
//!   retrying while the server answers `503 Service Unavailable`
//! - **Connect** (WebSocket `/connect`): upgrades to a live socket
//! - **Start** (`GET /start` + init frame): confirms the server activated
//!   the session; only then does the socket become the current connection
//!
//! Once started, a message pump drains frames into a [`Messages`] queue while
//! [`Client::send`] writes JSON frames on the same connection.
//!
//! # Quick Start
//!
//! ```no_run
//! use signalr_client::{Client, HubMessage, Result};
//!
//! #[tokio::main]
//! async fn main() -> Result<()> {
//!     let client = Client::new(
//!         "example.com",
//!         "1.5",
//!         "/signalr",
//!         r#"[{"name":"chathub"}]"#,
//!     );
//!
//!     client.init().await?;
//!     client
//!         .send(&HubMessage::new("chathub", "send").with_args(["hello"]))
//!         .await?;
//!
//!     let messages = client.messages();
//!     while let Some(message) = messages.recv().await {
//!         println!("{:?}", message?);
//!     }
//!
//!     Ok(())
//! }
//! ```
//!
//! # Modules
//!
//! | Module | Description |
//! |--------|-------------|
//! | [`client`] | [`Client`] session, handshake phases, message pump |
//! | [`error`] | Error types and [`Result`] alias |
//! | [`protocol`] | Wire message types |
//! | [`transport`] | HTTP and WebSocket capability traits with default adapters |

// ============================================================================
// Modules
// ============================================================================

/// Client session and connection lifecycle.
///
/// Use [`Client::new()`] or [`Client::builder()`] to create a session.
pub mod client;

/// Error types and result aliases.
///
/// All fallible operations return [`Result<T>`] which uses [`Error`].
pub mod error;

/// Wire message types.
///
/// Handshake responses and the persistent-connection message envelope.
pub mod protocol;

/// HTTP and WebSocket transport seams.
///
/// Capability traits the client drives, plus `reqwest` and
/// `tokio-tungstenite` backed implementations.
pub mod transport;

#[cfg(test)]
pub(crate) mod testing;

// ============================================================================
// Re-exports
// ============================================================================

// Client types
pub use client::{
    Client, ClientBuilder, ClientOptions, ConnectionState, Messages, ReconnectMode, Scheme,
};

// Error types
pub use error::{Error, Result};

// Protocol types
pub use protocol::{HubMessage, Message, NegotiateResponse};

// Transport types
pub use transport::{
    Connection, Connector, Dialer, Frame, FrameKind, HttpResponse, HttpTransport,
    ReqwestTransport, WsConnection, WsDialer,
};
