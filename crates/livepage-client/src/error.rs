//! Client error types.

use livepage_dom::DomError;

use crate::transport::TransportError;

/// Inbound payload could not be decoded.
#[derive(Debug, thiserror::Error)]
pub enum DecodeError {
    /// Payload is not JSON, or not a string / `{seq, html}` object.
    #[error("Malformed snapshot payload: {0}")]
    Json(#[from] serde_json::Error),
    /// The HTML inside the snapshot could not be parsed.
    #[error("Malformed snapshot HTML: {0}")]
    Html(String),
}

/// The WebSocket endpoint could not be derived from the page location.
#[derive(Debug, thiserror::Error)]
pub enum EndpointError {
    /// Page URL or resulting endpoint is not a valid URL.
    #[error("Invalid URL: {0}")]
    InvalidUrl(#[from] url::ParseError),
    /// Page is not served over http or https.
    #[error("Unsupported page scheme '{0}' (expected http or https)")]
    UnsupportedScheme(String),
    /// Page URL has no host.
    #[error("Page URL has no host")]
    MissingHost,
}

/// Live-reload client error.
#[derive(Debug, thiserror::Error)]
pub enum ClientError {
    #[error("{0}")]
    Decode(#[from] DecodeError),

    #[error("{0}")]
    Dom(#[from] DomError),

    #[error("{0}")]
    Transport(#[from] TransportError),

    #[error("{0}")]
    Endpoint(#[from] EndpointError),

    /// The page does not carry an identity token.
    #[error("Page has no identity: attribute '{attribute}' missing or empty on <head>")]
    MissingIdentity {
        /// Attribute that was looked up.
        attribute: String,
    },

    /// The live container element is not on the page.
    #[error("Live container #{0} not found on page")]
    ContainerNotFound(String),
}
