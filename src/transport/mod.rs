//! Transport layer.
//!
//! The client never touches sockets directly. It drives three small
//! capability traits, so tests and alternate transports can substitute
//! their own implementations without touching the handshake logic.
//!
//! # Architecture
//!
//! ```text
//! ┌─────────────────┐   HttpTransport::get    ┌─────────────────┐
//! │                 │ ──────────────────────► │                 │
//! │  Client         │   /negotiate, /start    │  SignalR        │
//! │                 │                         │  Server         │
//! │                 │   Dialer::dial          │                 │
//! │                 │ ──────────────────────► │                 │
//! │                 │   /connect (upgrade)    │                 │
//! │                 │                         │                 │
//! │  Connection     │◄──── read_frame ────────│                 │
//! │                 │───── write_json ───────►│                 │
//! └─────────────────┘                         └─────────────────┘
//! ```
//!
//! # Modules
//!
//! | Module | Description |
//! |--------|-------------|
//! | `connection` | `Connection` trait, frames, `tokio-tungstenite` connection |
//! | `dialer` | WebSocket upgrade |
//! | `http` | HTTP GET with `reqwest` |

// ============================================================================
// Submodules
// ============================================================================

/// Live WebSocket connection.
pub mod connection;

/// WebSocket upgrade.
pub mod dialer;

/// HTTP requests for the handshake.
pub mod http;

// ============================================================================
// Re-exports
// ============================================================================

pub use connection::{Connection, Frame, FrameKind, WsConnection};
pub use dialer::{Dialer, WsDialer};
pub use http::{HttpResponse, HttpTransport, ReqwestTransport};
pub use tokio_tungstenite::Connector;
