//! HTTP requests for the handshake.
//!
//! The negotiate and start phases are plain `GET` requests without a body.
//! [`HttpTransport`] abstracts the round trip down to status code and body
//! so the status classification stays in one place.

// ============================================================================
// Imports
// ============================================================================

use std::error::Error as StdError;
use std::fmt;

use async_trait::async_trait;
use serde::de::DeserializeOwned;
use tracing::trace;
use url::Url;

use crate::error::{Error, Result};

// ============================================================================
// Constants
// ============================================================================

/// The only status the handshake treats as success.
const OK: u16 = 200;

// ============================================================================
// HttpResponse
// ============================================================================

/// Status and body of an HTTP response.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HttpResponse {
    /// Numeric status code as received.
    pub status: u16,
    /// Response body as text.
    pub body: String,
}

impl HttpResponse {
    /// Creates a response.
    #[inline]
    #[must_use]
    pub fn new(status: u16, body: impl Into<String>) -> Self {
        Self {
            status,
            body: body.into(),
        }
    }

    /// Returns `true` for `200 OK`.
    #[inline]
    #[must_use]
    pub fn is_ok(&self) -> bool {
        self.status == OK
    }

    /// Returns the body of a `200 OK` response.
    ///
    /// # Errors
    ///
    /// Any other status is classified by [`Error::from_status`].
    pub fn into_body(self) -> Result<String> {
        if self.is_ok() {
            Ok(self.body)
        } else {
            Err(Error::from_status(self.status))
        }
    }

    /// Decodes the body of a `200 OK` response as JSON.
    ///
    /// # Errors
    ///
    /// - Status errors as for [`HttpResponse::into_body`]
    /// - [`Error::Json`] with the parser's message if the body is not valid
    pub fn json<T: DeserializeOwned>(self) -> Result<T> {
        let body = self.into_body()?;
        Ok(serde_json::from_str(&body)?)
    }
}

// ============================================================================
// HttpTransport
// ============================================================================

/// Performs the handshake's HTTP `GET` requests.
#[async_trait]
pub trait HttpTransport: Send + Sync {
    /// Sends `GET url` with the extra `headers` and returns status and body.
    ///
    /// Non-success statuses are not errors at this level.
    ///
    /// # Errors
    ///
    /// Returns the transport error if no response was received.
    async fn get(&self, url: &Url, headers: &[(String, String)]) -> Result<HttpResponse>;
}

// ============================================================================
// ReqwestTransport
// ============================================================================

/// [`HttpTransport`] backed by a pooled `reqwest::Client`.
///
/// TLS settings, proxies and timeouts are configured on the `reqwest`
/// client and passed through untouched.
#[derive(Clone, Default)]
pub struct ReqwestTransport {
    client: reqwest::Client,
}

impl fmt::Debug for ReqwestTransport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ReqwestTransport").finish_non_exhaustive()
    }
}

impl ReqwestTransport {
    /// Wraps an existing `reqwest` client.
    #[inline]
    #[must_use]
    pub fn new(client: reqwest::Client) -> Self {
        Self { client }
    }

    /// Returns the wrapped client.
    #[inline]
    #[must_use]
    pub fn client(&self) -> &reqwest::Client {
        &self.client
    }
}

#[async_trait]
impl HttpTransport for ReqwestTransport {
    async fn get(&self, url: &Url, headers: &[(String, String)]) -> Result<HttpResponse> {
        let mut request = self.client.get(url.clone());
        for (name, value) in headers {
            request = request.header(name.as_str(), value.as_str());
        }

        let response = request.send().await.map_err(classify_send_error)?;
        let status = response.status().as_u16();
        let body = response.text().await?;

        trace!(status, body_len = body.len(), "HTTP response received");

        Ok(HttpResponse { status, body })
    }
}

/// Maps a status line hyper could not parse to [`Error::MalformedStatus`].
fn classify_send_error(err: reqwest::Error) -> Error {
    let mut source = StdError::source(&err);
    while let Some(cause) = source {
        if let Some(hyper_err) = cause.downcast_ref::<hyper::Error>()
            && hyper_err.is_parse_status()
        {
            return Error::MalformedStatus { code: None };
        }
        source = cause.source();
    }
    Error::Http(err)
}

// ============================================================================
// Tests
// ============================================================================
