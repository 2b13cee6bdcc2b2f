//! Message pump and reconnection.
//!
//! Once started, a background task reads frames from the current
//! connection and publishes them on the [`Messages`] queue. When a read
//! fails the task replaces the connection in place; if that fails too the
//! error is published and the task exits.
//!
//! The task is bound to a child of the client's cancellation token and is
//! stopped explicitly by [`Client::close`], [`Client::reconnect`] and a
//! [`Client::start`] that replaces its connection.

// ============================================================================
// Imports
// ============================================================================

use std::fmt;
use std::sync::Arc;

use tokio::sync::Mutex;
use tokio::sync::mpsc::{self, UnboundedReceiver, UnboundedSender};
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, trace, warn};

use crate::error::{Error, Result};
use crate::protocol::Message;
use crate::transport::{Connection, Frame};

use super::core::{Client, ConnectionState};
use super::options::ReconnectMode;

// ============================================================================
// Messages
// ============================================================================

/// Receiving side of the outward message queue.
///
/// Items are decoded server messages or errors the pump reports: frames
/// that do not decode, binary frames, and a reconnect that failed. Clones
/// share one receiver.
#[derive(Clone)]
pub struct Messages {
    rx: Arc<Mutex<UnboundedReceiver<Result<Message>>>>,
}

impl fmt::Debug for Messages {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Messages").finish_non_exhaustive()
    }
}

impl Messages {
    /// Waits for the next item.
    ///
    /// Returns `None` once the client is gone and the queue is drained.
    pub async fn recv(&self) -> Option<Result<Message>> {
        self.rx.lock().await.recv().await
    }

    /// Returns the next item if one is queued.
    ///
    /// Also returns `None` while another task is blocked in
    /// [`Messages::recv`].
    #[must_use]
    pub fn try_recv(&self) -> Option<Result<Message>> {
        self.rx.try_lock().ok()?.try_recv().ok()
    }
}

/// Creates the outward queue.
pub(crate) fn channel() -> (UnboundedSender<Result<Message>>, Messages) {
    let (tx, rx) = mpsc::unbounded_channel();
    (
        tx,
        Messages {
            rx: Arc::new(Mutex::new(rx)),
        },
    )
}

// ============================================================================
// PumpHandle
// ============================================================================

/// A running pump task.
pub(crate) struct PumpHandle {
    /// Stops this pump only.
    cancel: CancellationToken,
    /// The task itself.
    task: JoinHandle<()>,
}

/// What the pump does after a frame.
enum Flow {
    /// Keep reading.
    Continue,
    /// Replace the connection.
    Reconnect,
}

// ============================================================================
// Client - Reconnect
// ============================================================================

impl Client {
    /// Replaces the current connection.
    ///
    /// Stops the pump, closes the current connection, then redoes connect
    /// and start with the existing token (negotiating first under
    /// [`ReconnectMode::Renegotiate`]) and restarts the pump. There is no
    /// internal retry.
    ///
    /// # Errors
    ///
    /// The failing phase's error. The client is then `Disconnected` with no
    /// current connection.
    pub async fn reconnect(&self) -> Result<()> {
        self.stop_pump().await;
        let connection = self.reestablish().await?;
        self.spawn_pump(connection);
        Ok(())
    }

    /// Takes down the current connection and builds a new one.
    pub(crate) async fn reestablish(&self) -> Result<Arc<dyn Connection>> {
        self.set_state(ConnectionState::Reconnecting);

        let previous = self.inner.connection.lock().await.take();
        if let Some(previous) = previous
            && let Err(e) = previous.close().await
        {
            debug!(error = %e, "Failed to close previous connection");
        }

        match self.handshake_again().await {
            Ok(connection) => {
                info!(connection_id = %self.connection_id(), "Reconnected");
                Ok(connection)
            }
            Err(e) => {
                self.set_state(ConnectionState::Disconnected);
                Err(e)
            }
        }
    }

    async fn handshake_again(&self) -> Result<Arc<dyn Connection>> {
        if self.inner.options.reconnect_mode == ReconnectMode::Renegotiate {
            self.negotiate_with_attempts(1).await?;
        }

        let connection = self.connect().await?;
        if let Err(e) = self.confirm_start(&connection).await {
            if let Err(close_err) = connection.close().await {
                debug!(error = %close_err, "Failed to close unused connection");
            }
            return Err(e);
        }

        self.install(Arc::clone(&connection)).await;
        Ok(connection)
    }
}

// ============================================================================
// Client - Pump
// ============================================================================

impl Client {
    /// Starts a pump reading from `connection`.
    pub(crate) fn spawn_pump(&self, connection: Arc<dyn Connection>) {
        let cancel = self.inner.shutdown.child_token();
        let task = tokio::spawn(self.clone().run_pump(connection, cancel.clone()));

        let previous = self.inner.pump.lock().replace(PumpHandle { cancel, task });
        if let Some(previous) = previous {
            previous.cancel.cancel();
        }
    }

    /// Stops the pump and waits for it to exit.
    pub(crate) async fn stop_pump(&self) {
        let handle = self.inner.pump.lock().take();
        let Some(PumpHandle { cancel, task }) = handle else {
            return;
        };

        cancel.cancel();
        if let Err(e) = task.await {
            warn!(error = %e, "Message pump task failed");
        }
        debug!("Message pump stopped");
    }

    async fn run_pump(self, mut connection: Arc<dyn Connection>, cancel: CancellationToken) {
        debug!("Message pump started");

        loop {
            let read = tokio::select! {
                biased;
                () = cancel.cancelled() => break,
                read = connection.read_frame() => read,
            };

            match read {
                Ok(frame) => match self.forward(frame) {
                    Flow::Continue => continue,
                    Flow::Reconnect => info!("Server requested reconnect"),
                },
                Err(e) => warn!(error = %e, "Connection lost, reconnecting"),
            }

            let result = tokio::select! {
                biased;
                () = cancel.cancelled() => break,
                result = self.reestablish() => result,
            };

            match result {
                Ok(next) => connection = next,
                Err(e) => {
                    error!(error = %e, "Reconnect failed");
                    self.publish(Err(e));
                    break;
                }
            }
        }

        debug!("Message pump exited");
    }

    /// Decodes a frame and publishes it.
    fn forward(&self, frame: Frame) -> Flow {
        let item = match frame {
            Frame::Text(text) => serde_json::from_str::<Message>(&text).map_err(Error::from),
            other => Err(Error::unexpected_frame_type(other.kind())),
        };

        let reconnect = match &item {
            Ok(message) if message.is_keep_alive() => {
                trace!("Keep-alive received");
                return Flow::Continue;
            }
            Ok(message) => message.should_reconnect(),
            Err(e) => {
                debug!(error = %e, "Publishing undecodable frame");
                false
            }
        };

        self.publish(item);

        if reconnect {
            Flow::Reconnect
        } else {
            Flow::Continue
        }
    }
}

// ============================================================================
// Tests
// ============================================================================
