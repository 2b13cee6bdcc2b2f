//! Negotiate phase.

// ============================================================================
// Imports
// ============================================================================

use tracing::{debug, info, warn};

use crate::error::{Error, Result};
use crate::protocol::NegotiateResponse;

use super::core::{Client, ConnectionState};
use super::url::negotiate_url;

// ============================================================================
// Constants
// ============================================================================

/// The status that makes negotiate wait and retry.
const SERVICE_UNAVAILABLE: u16 = 503;

// ============================================================================
// Client - Negotiate
// ============================================================================

impl Client {
    /// Obtains a connection token and id from the server.
    ///
    /// While the server answers `503 Service Unavailable` the request is
    /// repeated after [`Client::retry_wait_duration`], for at most
    /// [`Client::max_negotiate_retries`] attempts in total.
    ///
    /// On failure the session is left as it was.
    ///
    /// # Errors
    ///
    /// - [`Error::RetriesExhausted`] if every attempt answered 503
    /// - [`Error::Status`] for any other non-200 status
    /// - [`Error::MalformedStatus`] for codes outside the HTTP range
    /// - [`Error::Json`] if the body is not a negotiate response
    /// - [`Error::Cancelled`] if the cancellation token fires
    pub async fn negotiate(&self) -> Result<()> {
        let attempts = self.inner.options.max_negotiate_retries.max(1);
        self.negotiate_with_attempts(attempts).await
    }

    /// Negotiates with at most `attempts` requests.
    ///
    /// With one attempt a 503 fails at once as
    /// [`Error::RetriesExhausted`] without waiting.
    pub(super) async fn negotiate_with_attempts(&self, attempts: u32) -> Result<()> {
        let options = &self.inner.options;
        let url = negotiate_url(options)?;

        let mut attempt = 0;
        let response = loop {
            attempt += 1;

            let response = self
                .cancellable(self.inner.http.get(&url, &options.headers))
                .await?;

            if response.status != SERVICE_UNAVAILABLE {
                break response;
            }

            if attempt >= attempts {
                warn!(attempts, "Negotiate retries exhausted");
                return Err(Error::retries_exhausted(
                    attempt,
                    Error::from_status(response.status),
                ));
            }

            warn!(
                attempt,
                attempts,
                wait_ms = options.retry_wait_duration.as_millis() as u64,
                "Server unavailable, retrying negotiate"
            );

            self.cancellable(async {
                tokio::time::sleep(options.retry_wait_duration).await;
                Ok(())
            })
            .await?;
        };

        let negotiated: NegotiateResponse = response.json()?;

        if negotiated.protocol_version != options.protocol {
            debug!(
                client = %options.protocol,
                server = %negotiated.protocol_version,
                "Protocol version mismatch"
            );
        }

        info!(
            connection_id = %negotiated.connection_id,
            attempts = attempt,
            "Negotiated"
        );

        {
            let mut session = self.inner.session.write();
            session.connection_token = negotiated.connection_token.clone();
            session.connection_id = negotiated.connection_id.clone();
            session.negotiated = Some(negotiated);
        }

        self.advance(
            &[
                ConnectionState::Uninitialized,
                ConnectionState::Negotiated,
                ConnectionState::Disconnected,
                ConnectionState::Closed,
            ],
            ConnectionState::Negotiated,
        );

        Ok(())
    }
}

// ============================================================================
// Tests
// ============================================================================
