//! Session lifecycle: init, send and close.

// ============================================================================
// Imports
// ============================================================================

use std::sync::Arc;

use serde::Serialize;
use tracing::{debug, info};

use crate::error::{Error, Result};
use crate::transport::Connection;

use super::core::{Client, ConnectionState};

// ============================================================================
// Client - Lifecycle
// ============================================================================

impl Client {
    /// Runs negotiate, connect and start, then starts the message pump.
    ///
    /// The first failing phase aborts. If connect or start fails the
    /// negotiated session is forgotten and the unused connection closed, so
    /// `init` can be called again. On a client that is already running the
    /// pump is stopped and the current connection closed first.
    ///
    /// # Errors
    ///
    /// The error of the failing phase, unmodified.
    pub async fn init(&self) -> Result<()> {
        if let Some(previous) = self.detach().await {
            debug!("Closing current connection before init");
            if let Err(e) = previous.close().await {
                debug!(error = %e, "Failed to close previous connection");
            }
            self.set_state(ConnectionState::Disconnected);
        }

        self.negotiate().await?;

        let connection = match self.connect().await {
            Ok(connection) => connection,
            Err(e) => {
                self.reset_session();
                return Err(e);
            }
        };

        if let Err(e) = self.start(connection.clone()).await {
            if let Err(close_err) = connection.close().await {
                debug!(error = %close_err, "Failed to close unused connection");
            }
            self.reset_session();
            return Err(e);
        }

        self.spawn_pump(connection);

        info!(host = %self.inner.options.host, "Client initialized");
        Ok(())
    }

    /// Writes `message` as JSON on the current connection.
    ///
    /// Sends are serialized against each other and against connection
    /// replacement.
    ///
    /// # Errors
    ///
    /// - [`Error::ConnectionNotSet`] if no connection is current
    /// - [`Error::Json`] if `message` does not serialize
    /// - the connection's write error, unmodified
    pub async fn send<T>(&self, message: &T) -> Result<()>
    where
        T: Serialize + ?Sized,
    {
        let value = serde_json::to_value(message)?;

        let slot = self.inner.connection.lock().await;
        let connection = slot.as_ref().ok_or(Error::ConnectionNotSet)?;

        self.cancellable(connection.write_json(&value)).await
    }

    /// Stops the pump and closes the current connection.
    ///
    /// # Errors
    ///
    /// Returns the transport error if the close handshake fails. The client
    /// is `Closed` either way.
    pub async fn close(&self) -> Result<()> {
        let connection = self.detach().await;
        self.set_state(ConnectionState::Closed);

        info!(host = %self.inner.options.host, "Client closed");

        match connection {
            Some(connection) => connection.close().await,
            None => Ok(()),
        }
    }

    /// Stops the pump and takes the current connection out of the slot.
    async fn detach(&self) -> Option<Arc<dyn Connection>> {
        self.stop_pump().await;
        self.inner.connection.lock().await.take()
    }
}

// ============================================================================
// Tests
// ============================================================================
