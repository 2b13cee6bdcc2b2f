//! Live WebSocket connection.
//!
//! [`Connection`] is the capability the client holds once a socket is
//! upgraded: read one data frame, write one JSON frame, close.
//! [`WsConnection`] implements it over `tokio-tungstenite`.
//!
//! # Concurrency
//!
//! The stream is split into independently locked read and write halves, so
//! the message pump can block in [`Connection::read_frame`] while
//! [`Connection::write_json`] proceeds on another task.

// ============================================================================
// Imports
// ============================================================================

use std::fmt;

use async_trait::async_trait;
use futures_util::stream::{SplitSink, SplitStream};
use futures_util::{SinkExt, StreamExt};
use serde_json::{Value, to_string};
use tokio::net::TcpStream;
use tokio::sync::Mutex;
use tokio_tungstenite::tungstenite::{Error as WsError, Message};
use tokio_tungstenite::{MaybeTlsStream, WebSocketStream};
use tracing::{debug, trace};

use crate::error::{Error, Result};

// ============================================================================
// Types
// ============================================================================

/// WebSocket stream produced by the client-side upgrade.
pub(crate) type WsStream = WebSocketStream<MaybeTlsStream<TcpStream>>;

// ============================================================================
// Frame
// ============================================================================

/// Type of a data frame.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FrameKind {
    /// UTF-8 text frame.
    Text,
    /// Binary frame.
    Binary,
}

impl fmt::Display for FrameKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Text => f.write_str("text"),
            Self::Binary => f.write_str("binary"),
        }
    }
}

/// A data frame read from a connection.
///
/// Control frames (ping, pong, close) are handled by the transport and never
/// surface here.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Frame {
    /// Text frame payload.
    Text(String),
    /// Binary frame payload.
    Binary(Vec<u8>),
}

impl Frame {
    /// Returns the frame type.
    #[inline]
    #[must_use]
    pub fn kind(&self) -> FrameKind {
        match self {
            Self::Text(_) => FrameKind::Text,
            Self::Binary(_) => FrameKind::Binary,
        }
    }

    /// Creates a text frame.
    #[inline]
    #[must_use]
    pub fn text(text: impl Into<String>) -> Self {
        Self::Text(text.into())
    }
}

// ============================================================================
// Connection
// ============================================================================

/// A live, bidirectional connection to the server.
///
/// Implementations must allow `read_frame` and `write_json` to run
/// concurrently from different tasks.
#[async_trait]
pub trait Connection: Send + Sync {
    /// Reads the next data frame, waiting until one arrives.
    ///
    /// # Errors
    ///
    /// Returns [`Error::ConnectionClosed`] once the peer closes, or the
    /// transport error that ended the stream.
    async fn read_frame(&self) -> Result<Frame>;

    /// Writes `value` as one JSON text frame.
    ///
    /// # Errors
    ///
    /// Returns the transport's write error unmodified.
    async fn write_json(&self, value: &Value) -> Result<()>;

    /// Sends a close frame and releases the socket.
    ///
    /// # Errors
    ///
    /// Returns the transport error if the close handshake fails.
    async fn close(&self) -> Result<()>;
}

// ============================================================================
// WsConnection
// ============================================================================

/// [`Connection`] over a `tokio-tungstenite` WebSocket stream.
pub struct WsConnection {
    /// Write half.
    sink: Mutex<SplitSink<WsStream, Message>>,
    /// Read half.
    stream: Mutex<SplitStream<WsStream>>,
}

impl fmt::Debug for WsConnection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("WsConnection").finish_non_exhaustive()
    }
}

impl WsConnection {
    /// Wraps an upgraded WebSocket stream.
    pub(crate) fn new(ws_stream: WsStream) -> Self {
        let (sink, stream) = ws_stream.split();
        Self {
            sink: Mutex::new(sink),
            stream: Mutex::new(stream),
        }
    }
}

#[async_trait]
impl Connection for WsConnection {
    async fn read_frame(&self) -> Result<Frame> {
        let mut stream = self.stream.lock().await;

        loop {
            match stream.next().await {
                Some(Ok(Message::Text(text))) => return Ok(Frame::Text(text.as_str().to_owned())),

                Some(Ok(Message::Binary(bytes))) => return Ok(Frame::Binary(bytes.to_vec())),

                Some(Ok(Message::Close(frame))) => {
                    debug!(?frame, "WebSocket closed by remote");
                    return Err(Error::ConnectionClosed);
                }

                // Ping replies are queued by tungstenite and flushed on the next read
                Some(Ok(_)) => trace!("Control frame skipped"),

                Some(Err(e)) => return Err(e.into()),

                None => {
                    debug!("WebSocket stream ended");
                    return Err(Error::ConnectionClosed);
                }
            }
        }
    }

    async fn write_json(&self, value: &Value) -> Result<()> {
        let json = to_string(value)?;
        self.sink.lock().await.send(Message::Text(json.into())).await?;
        trace!("Frame written");
        Ok(())
    }

    async fn close(&self) -> Result<()> {
        match self.sink.lock().await.close().await {
            Ok(()) | Err(WsError::ConnectionClosed | WsError::AlreadyClosed) => Ok(()),
            Err(e) => Err(e.into()),
        }
    }
}

// ============================================================================
// Tests
// ============================================================================
