//! Handshake URL construction.
//!
//! | Phase | URL |
//! |-------|-----|
//! | Negotiate | `{http}://{host}{endpoint}/negotiate?connectionData=..&clientProtocol=..` |
//! | Connect | `{ws}://{host}{endpoint}/connect?transport=webSockets&connectionToken=..&connectionData=..&clientProtocol=..` |
//! | Start | `{http}://{host}{endpoint}/start?transport=webSockets&connectionToken=..&connectionData=..&clientProtocol=..` |

use url::Url;

use crate::error::{Error, Result};

use super::ClientOptions;

/// Only transport this client speaks.
const TRANSPORT: &str = "webSockets";

/// Builds the negotiate URL.
pub(crate) fn negotiate_url(options: &ClientOptions) -> Result<Url> {
    let mut url = base_url(options, options.scheme.http(), "negotiate")?;
    url.query_pairs_mut()
        .append_pair("connectionData", &options.connection_data)
        .append_pair("clientProtocol", &options.protocol);
    Ok(url)
}

/// Builds the WebSocket connect URL.
pub(crate) fn connect_url(options: &ClientOptions, token: &str) -> Result<Url> {
    session_url(options, options.scheme.ws(), "connect", token)
}

/// Builds the start URL.
pub(crate) fn start_url(options: &ClientOptions, token: &str) -> Result<Url> {
    session_url(options, options.scheme.http(), "start", token)
}

fn session_url(options: &ClientOptions, scheme: &str, action: &str, token: &str) -> Result<Url> {
    let mut url = base_url(options, scheme, action)?;
    url.query_pairs_mut()
        .append_pair("transport", TRANSPORT)
        .append_pair("connectionToken", token)
        .append_pair("connectionData", &options.connection_data)
        .append_pair("clientProtocol", &options.protocol);
    Ok(url)
}

fn base_url(options: &ClientOptions, scheme: &str, action: &str) -> Result<Url> {
    options.validate_address().map_err(Error::config)?;

    let raw = format!("{scheme}://{}{}/{action}", options.host, options.endpoint);
    Ok(Url::parse(&raw)?)
}
