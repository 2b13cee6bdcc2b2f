//! Wire message types.
//!
//! # Protocol Overview
//!
//! | Message Type | Direction | Purpose |
//! |--------------|-----------|---------|
//! | `NegotiateResponse` | Server → Client | Connection token and id (HTTP) |
//! | `StartResponse` | Server → Client | Start acknowledgement (HTTP) |
//! | `InitMessage` | Server → Client | First WebSocket frame, `{"S":1}` |
//! | `Message` | Server → Client | Persistent-connection envelope |
//! | `HubMessage` | Both | Hub payload carried inside `M` |
//!
//! Field names on the wire are single capital letters (`C`, `S`, `M`, ...);
//! the Rust types give them readable names and keep the wire spelling via
//! serde renames.
//!
//! # Modules
//!
//! | Module | Description |
//! |--------|-------------|
//! | `handshake` | Negotiate/start responses and the init frame |
//! | `message` | Message envelope and hub payloads |

// ============================================================================
// Submodules
// ============================================================================

/// Handshake response types.
pub mod handshake;

/// Message envelope types.
pub mod message;

// ============================================================================
// Re-exports
// ============================================================================

pub use handshake::{InitMessage, NegotiateResponse, StartResponse};
pub use message::{HubMessage, Message};
