//! Builder pattern for client configuration.
//!
//! Provides a fluent API for configuring and creating [`Client`] instances.
//!
//! # Example
//!
//! ```no_run
//! use std::time::Duration;
//! use signalr_client::{Client, ReconnectMode, Scheme};
//!
//! # fn example() -> signalr_client::Result<()> {
//! let client = Client::builder("localhost:8080", "1.5", "/signalr", "[]")
//!     .scheme(Scheme::Http)
//!     .max_negotiate_retries(3)
//!     .retry_wait_duration(Duration::from_secs(2))
//!     .header("Authorization", "Bearer token")
//!     .reconnect_mode(ReconnectMode::Renegotiate)
//!     .build()?;
//! # Ok(())
//! # }
//! ```

// ============================================================================
// Imports
// ============================================================================

use std::fmt;
use std::sync::Arc;
use std::time::Duration;

use tokio_tungstenite::Connector;
use tokio_util::sync::CancellationToken;

use crate::error::{Error, Result};
use crate::transport::{Dialer, HttpTransport, ReqwestTransport, WsDialer};

use super::core::Client;
use super::options::{ClientOptions, ReconnectMode, Scheme};

// ============================================================================
// ClientBuilder
// ============================================================================

/// Builder for configuring a [`Client`] instance.
///
/// Use [`Client::builder()`] to create a new builder.
pub struct ClientBuilder {
    /// Connection settings.
    options: ClientOptions,
    /// `reqwest` client for the default HTTP transport.
    http_client: Option<reqwest::Client>,
    /// TLS connector for the default dialer.
    connector: Option<Connector>,
    /// Custom HTTP transport.
    http: Option<Arc<dyn HttpTransport>>,
    /// Custom dialer.
    dialer: Option<Arc<dyn Dialer>>,
    /// External cancellation signal.
    cancellation: Option<CancellationToken>,
}

impl fmt::Debug for ClientBuilder {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ClientBuilder")
            .field("options", &self.options)
            .field("custom_http", &self.http.is_some())
            .field("custom_dialer", &self.dialer.is_some())
            .finish_non_exhaustive()
    }
}

// ============================================================================
// ClientBuilder Implementation
// ============================================================================

impl ClientBuilder {
    /// Creates a builder from options.
    #[inline]
    #[must_use]
    pub fn new(options: ClientOptions) -> Self {
        Self {
            options,
            http_client: None,
            connector: None,
            http: None,
            dialer: None,
            cancellation: None,
        }
    }

    /// Sets HTTP or HTTPS (WS or WSS for the upgrade).
    #[inline]
    #[must_use]
    pub fn scheme(mut self, scheme: Scheme) -> Self {
        self.options.scheme = scheme;
        self
    }

    /// Sets the negotiate attempt bound.
    #[inline]
    #[must_use]
    pub fn max_negotiate_retries(mut self, retries: u32) -> Self {
        self.options.max_negotiate_retries = retries;
        self
    }

    /// Sets the wait between negotiate attempts.
    #[inline]
    #[must_use]
    pub fn retry_wait_duration(mut self, wait: Duration) -> Self {
        self.options.retry_wait_duration = wait;
        self
    }

    /// Adds a header to every request and the upgrade.
    #[inline]
    #[must_use]
    pub fn header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.options.headers.push((name.into(), value.into()));
        self
    }

    /// Sets whether reconnects reuse the token or negotiate again.
    #[inline]
    #[must_use]
    pub fn reconnect_mode(mut self, mode: ReconnectMode) -> Self {
        self.options.reconnect_mode = mode;
        self
    }

    /// Uses a preconfigured `reqwest` client for negotiate and start.
    ///
    /// Ignored when [`ClientBuilder::http_transport`] is set.
    #[inline]
    #[must_use]
    pub fn http_client(mut self, client: reqwest::Client) -> Self {
        self.http_client = Some(client);
        self
    }

    /// Uses a custom TLS connector for the upgrade.
    ///
    /// Ignored when [`ClientBuilder::dialer`] is set.
    #[inline]
    #[must_use]
    pub fn connector(mut self, connector: Connector) -> Self {
        self.connector = Some(connector);
        self
    }

    /// Replaces the HTTP transport.
    #[inline]
    #[must_use]
    pub fn http_transport(mut self, http: Arc<dyn HttpTransport>) -> Self {
        self.http = Some(http);
        self
    }

    /// Replaces the WebSocket dialer.
    #[inline]
    #[must_use]
    pub fn dialer(mut self, dialer: Arc<dyn Dialer>) -> Self {
        self.dialer = Some(dialer);
        self
    }

    /// Binds the client to an external cancellation token.
    ///
    /// Cancelling it interrupts every blocking phase with
    /// [`Error::Cancelled`] and stops the message pump.
    #[inline]
    #[must_use]
    pub fn cancellation_token(mut self, token: CancellationToken) -> Self {
        self.cancellation = Some(token);
        self
    }

    /// Builds the client with validation.
    ///
    /// # Errors
    ///
    /// [`Error::Config`] if the options are invalid.
    pub fn build(self) -> Result<Client> {
        self.options.validate().map_err(Error::config)?;

        let http: Arc<dyn HttpTransport> = match self.http {
            Some(http) => http,
            None => Arc::new(ReqwestTransport::new(self.http_client.unwrap_or_default())),
        };

        let dialer: Arc<dyn Dialer> = match (self.dialer, self.connector) {
            (Some(dialer), _) => dialer,
            (None, Some(connector)) => Arc::new(WsDialer::with_connector(connector)),
            (None, None) => Arc::new(WsDialer::new()),
        };

        let cancellation = self.cancellation.unwrap_or_default();

        Ok(Client::from_parts(self.options, http, dialer, cancellation))
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    use tokio_test::{assert_err, assert_ok};

    use crate::testing::{FakeDialer, FakeHttp};

    #[test]
    fn test_builder_applies_settings() {
        let client = Client::builder("localhost:1234", "1.5", "/signalr", "data")
            .scheme(Scheme::Http)
            .max_negotiate_retries(2)
            .retry_wait_duration(Duration::from_millis(5))
            .header("x-api-key", "secret")
            .reconnect_mode(ReconnectMode::Renegotiate)
            .build()
            .expect("valid options");

        assert_eq!(client.host(), "localhost:1234");
        assert_eq!(client.scheme(), Scheme::Http);
        assert_eq!(client.max_negotiate_retries(), 2);
        assert_eq!(client.retry_wait_duration(), Duration::from_millis(5));
        assert_eq!(client.options().headers.len(), 1);
        assert_eq!(client.options().reconnect_mode, ReconnectMode::Renegotiate);
    }

    #[test]
    fn test_build_rejects_invalid_options() {
        let err = assert_err!(Client::builder("", "1.5", "/signalr", "").build());
        assert!(matches!(err, Error::Config { .. }));

        let err = Client::builder("host", "1.5", "/signalr", "")
            .max_negotiate_retries(0)
            .build()
            .unwrap_err();
        assert!(err.to_string().contains("max_negotiate_retries"));
    }

    #[test]
    fn test_build_uses_external_token() {
        let token = CancellationToken::new();
        let client = Client::builder("host", "1.5", "/signalr", "")
            .cancellation_token(token.clone())
            .build()
            .expect("valid options");

        token.cancel();
        assert!(client.cancellation_token().is_cancelled());
    }

    #[tokio::test]
    async fn test_build_with_custom_transports() {
        let http = FakeHttp::handshake();
        let client = Client::builder("host", "1.5", "/signalr", "")
            .http_transport(http.clone())
            .dialer(FakeDialer::with([]))
            .build()
            .expect("valid options");

        assert_ok!(client.negotiate().await);
        assert_eq!(http.hits("/negotiate"), 1);
    }
}
