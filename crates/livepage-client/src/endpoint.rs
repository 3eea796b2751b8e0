//! WebSocket endpoint derivation.
//!
//! The endpoint mirrors the page: `http` pages talk to `ws://`, `https`
//! pages to `wss://`, on the same hostname and port.

use url::Url;

use crate::error::EndpointError;

/// Default path of the live-reload endpoint.
pub const DEFAULT_ENDPOINT_PATH: &str = "/websocket";

/// The parts of the page location the endpoint is derived from.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct PageLocation {
    /// Page scheme without the trailing colon (`http` or `https`).
    pub scheme: String,
    /// Page hostname (IPv6 addresses in brackets).
    pub hostname: String,
    /// Explicit page port, `None` for the scheme default.
    pub port: Option<u16>,
}

impl PageLocation {
    /// Extract the location from a page URL.
    ///
    /// # Errors
    ///
    /// Returns [`EndpointError::InvalidUrl`] if `page_url` does not parse and
    /// [`EndpointError::MissingHost`] if it has no host.
    pub fn from_url(page_url: &str) -> Result<Self, EndpointError> {
        let url = Url::parse(page_url)?;
        let hostname = url.host_str().ok_or(EndpointError::MissingHost)?.to_owned();
        Ok(Self {
            scheme: url.scheme().to_owned(),
            hostname,
            port: url.port(),
        })
    }
}

/// Derive the WebSocket endpoint for `location` at `path`.
///
/// # Errors
///
/// Returns [`EndpointError::UnsupportedScheme`] for pages not served over
/// http(s) and [`EndpointError::InvalidUrl`] if the result does not parse.
pub fn websocket_endpoint(location: &PageLocation, path: &str) -> Result<Url, EndpointError> {
    let scheme = match location.scheme.trim_end_matches(':') {
        "http" => "ws",
        "https" => "wss",
        other => return Err(EndpointError::UnsupportedScheme(other.to_owned())),
    };
    if location.hostname.is_empty() {
        return Err(EndpointError::MissingHost);
    }

    let port = location
        .port
        .map(|port| format!(":{port}"))
        .unwrap_or_default();
    let path = if path.starts_with('/') {
        path.to_owned()
    } else {
        format!("/{path}")
    };

    let url = Url::parse(&format!("{scheme}://{}{port}{path}", location.hostname))?;
    tracing::debug!(endpoint = %url, "Derived live-reload endpoint");
    Ok(url)
}
