//! SignalR client session.
//!
//! [`Client`] owns one logical persistent connection: the negotiated
//! token and id, the current WebSocket, the message pump and the outward
//! [`Messages`] queue.
//!
//! # Example
//!
//! ```no_run
//! use signalr_client::Client;
//!
//! # async fn example() -> signalr_client::Result<()> {
//! let client = Client::new("example.com", "1.5", "/signalr", "[]");
//!
//! // Or step by step
//! client.negotiate().await?;
//! let conn = client.connect().await?;
//! client.start(conn).await?;
//! # Ok(())
//! # }
//! ```
//!
//! # Module Structure
//!
//! | Module | Description |
//! |--------|-------------|
//! | `core` | Handle, shared state, accessors |
//! | `builder` | [`ClientBuilder`] |
//! | `options` | [`ClientOptions`], [`Scheme`], [`ReconnectMode`] |
//! | `url` | Handshake URL construction |
//! | `negotiate` | Token negotiation with 503 retry |
//! | `connect` | WebSocket upgrade |
//! | `start` | Start call and init frame |
//! | `session` | `init`, `send`, `close` |
//! | `pump` | Background reader, [`Messages`], reconnect |

// ============================================================================
// Submodules
// ============================================================================

mod builder;
mod connect;
mod core;
mod negotiate;
mod options;
mod pump;
mod session;
mod start;
mod url;

// ============================================================================
// Re-exports
// ============================================================================

pub use builder::ClientBuilder;
pub use core::{Client, ConnectionState};
pub use options::{
    ClientOptions, DEFAULT_MAX_NEGOTIATE_RETRIES, DEFAULT_RETRY_WAIT_DURATION, ReconnectMode,
    Scheme,
};
pub use pump::Messages;
