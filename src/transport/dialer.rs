//! WebSocket upgrade.

// ============================================================================
// Imports
// ============================================================================

use std::fmt;
use std::sync::Arc;

use async_trait::async_trait;
use tokio_tungstenite::Connector;
use tokio_tungstenite::connect_async_tls_with_config;
use tokio_tungstenite::tungstenite::client::IntoClientRequest;
use tokio_tungstenite::tungstenite::http::{HeaderName, HeaderValue};
use tracing::debug;
use url::Url;

use crate::error::{Error, Result};

use super::{Connection, WsConnection};

// ============================================================================
// Dialer
// ============================================================================

/// Upgrades an HTTP URL into a live [`Connection`].
#[async_trait]
pub trait Dialer: Send + Sync {
    /// Performs the WebSocket handshake against `url`.
    ///
    /// # Errors
    ///
    /// Returns the transport error unmodified, including a rejected upgrade.
    async fn dial(&self, url: &Url, headers: &[(String, String)]) -> Result<Arc<dyn Connection>>;
}

// ============================================================================
// WsDialer
// ============================================================================

/// [`Dialer`] backed by `tokio-tungstenite`.
///
/// `wss://` URLs use the crate's rustls roots unless a [`Connector`] is
/// supplied.
#[derive(Clone, Default)]
pub struct WsDialer {
    /// Optional TLS connector passed through to the handshake.
    connector: Option<Connector>,
}

impl fmt::Debug for WsDialer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("WsDialer")
            .field("custom_connector", &self.connector.is_some())
            .finish()
    }
}

impl WsDialer {
    /// Creates a dialer with default TLS settings.
    #[inline]
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a dialer using the given TLS connector.
    #[inline]
    #[must_use]
    pub fn with_connector(connector: Connector) -> Self {
        Self {
            connector: Some(connector),
        }
    }
}

#[async_trait]
impl Dialer for WsDialer {
    async fn dial(&self, url: &Url, headers: &[(String, String)]) -> Result<Arc<dyn Connection>> {
        let mut request = url.as_str().into_client_request()?;

        for (name, value) in headers {
            let name = HeaderName::from_bytes(name.as_bytes())
                .map_err(|e| Error::config(format!("invalid header name '{name}': {e}")))?;
            let value = HeaderValue::from_str(value)
                .map_err(|e| Error::config(format!("invalid header value for '{name}': {e}")))?;
            request.headers_mut().insert(name, value);
        }

        let (ws_stream, response) =
            connect_async_tls_with_config(request, None, false, self.connector.clone()).await?;

        debug!(status = %response.status(), host = ?url.host_str(), "WebSocket upgrade accepted");

        Ok(Arc::new(WsConnection::new(ws_stream)))
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    use crate::testing::{Script, ScriptedServer, WsSession};

    #[tokio::test]
    async fn test_dial_success() {
        let server = ScriptedServer::spawn(Script {
            sessions: vec![WsSession::open([r#"{"S":1}"#])],
            ..Script::default()
        })
        .await;

        let result = WsDialer::new().dial(&server.ws_url("/connect"), &[]).await;
        assert!(result.is_ok());
        assert_eq!(server.hits("/connect"), 1);
    }

    #[tokio::test]
    async fn test_dial_rejected_upgrade_is_bad_handshake() {
        // No scripted sessions: the server answers the upgrade with 500
        let server = ScriptedServer::spawn(Script::default()).await;

        let err = WsDialer::new()
            .dial(&server.ws_url("/connect"), &[])
            .await
            .err()
            .expect("dial should fail");

        assert!(err.is_bad_handshake());
        assert!(err.is_transport_error());
    }

    #[tokio::test]
    async fn test_dial_invalid_header() {
        let server = ScriptedServer::spawn(Script::default()).await;
        let headers = vec![("bad header".to_string(), "v".to_string())];

        let err = WsDialer::new()
            .dial(&server.ws_url("/connect"), &headers)
            .await
            .err()
            .expect("dial should fail");

        assert!(matches!(err, Error::Config { .. }));
        assert_eq!(server.hits("/connect"), 0);
    }
}
