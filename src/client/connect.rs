//! Connect phase.

use std::sync::Arc;

use tracing::debug;

use crate::error::Result;
use crate::transport::Connection;

use super::core::{Client, ConnectionState};
use super::url::connect_url;

impl Client {
    /// Upgrades to a WebSocket using the negotiated token.
    ///
    /// The returned connection is not yet current; pass it to
    /// [`Client::start`]. Without a prior negotiate the token is empty.
    ///
    /// # Errors
    ///
    /// The dialer's error is returned unmodified. A rejected upgrade
    /// satisfies [`Error::is_bad_handshake`](crate::Error::is_bad_handshake).
    pub async fn connect(&self) -> Result<Arc<dyn Connection>> {
        let url = connect_url(&self.inner.options, &self.connection_token())?;

        debug!(host = %self.inner.options.host, "Connecting WebSocket");

        let connection = self
            .cancellable(self.inner.dialer.dial(&url, &self.inner.options.headers))
            .await?;

        self.advance(
            &[ConnectionState::Uninitialized, ConnectionState::Negotiated],
            ConnectionState::Connected,
        );

        Ok(connection)
    }
}
