//! Start phase.

// ============================================================================
// Imports
// ============================================================================

use std::sync::Arc;

use tracing::{debug, info};

use crate::error::{Error, Result};
use crate::protocol::{InitMessage, StartResponse};
use crate::transport::{Connection, Frame};

use super::core::{Client, ConnectionState};
use super::url::start_url;

// ============================================================================
// Client - Start
// ============================================================================

impl Client {
    /// Confirms the session and makes `connection` current.
    ///
    /// Calls `/start`, then reads the init frame from `connection`. Only when
    /// both succeed does `connection` become the current connection; on
    /// failure the current connection is left untouched and the caller still
    /// owns `connection`.
    ///
    /// A connection that was current before is closed and its message pump
    /// stopped, so at most one connection is ever live.
    ///
    /// # Errors
    ///
    /// - [`Error::Status`] / [`Error::MalformedStatus`] for a non-200 answer
    /// - [`Error::Json`] if the start body or init frame is not valid JSON
    /// - [`Error::StartRejected`] if the response is not `started`
    /// - [`Error::UnexpectedFrameType`] if the init frame is binary
    /// - [`Error::UnexpectedInitValue`] if `S` is not `1`
    pub async fn start(&self, connection: Arc<dyn Connection>) -> Result<()> {
        self.confirm_start(&connection).await?;
        self.stop_pump().await;
        self.install(connection).await;
        Ok(())
    }

    /// Runs the `/start` call and checks the init frame on `connection`.
    pub(super) async fn confirm_start(&self, connection: &Arc<dyn Connection>) -> Result<()> {
        let options = &self.inner.options;
        let url = start_url(options, &self.connection_token())?;

        let response = self
            .cancellable(self.inner.http.get(&url, &options.headers))
            .await?;
        response.json::<StartResponse>()?.ensure_started()?;

        debug!("Start acknowledged, awaiting init frame");

        let frame = self.cancellable(connection.read_frame()).await?;
        let text = match frame {
            Frame::Text(text) => text,
            other => return Err(Error::unexpected_frame_type(other.kind())),
        };
        serde_json::from_str::<InitMessage>(&text)?.ensure_initialized()
    }

    /// Makes `connection` current and closes the one it replaces.
    pub(super) async fn install(&self, connection: Arc<dyn Connection>) {
        let previous = self
            .inner
            .connection
            .lock()
            .await
            .replace(Arc::clone(&connection));
        self.set_state(ConnectionState::Running);

        info!(connection_id = %self.connection_id(), "Connection started");

        if let Some(previous) = previous
            && !Arc::ptr_eq(&previous, &connection)
        {
            debug!("Closing replaced connection");
            if let Err(e) = previous.close().await {
                debug!(error = %e, "Failed to close replaced connection");
            }
        }
    }
}

// ============================================================================
// Tests
// ============================================================================
