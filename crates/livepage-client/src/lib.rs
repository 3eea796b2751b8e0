//! Live-reload client core.
//!
//! Keeps one region of a rendered page (by default `#NavAndArticle`) in sync
//! with the server's authoritative rendering. The client:
//!
//! 1. derives the WebSocket endpoint from the page location ([`websocket_endpoint`])
//! 2. on `open`, marks the status indicator connected and announces the
//!    page's identity token (the article's destination filename)
//! 3. on every inbound snapshot, diffs the live region against it and
//!    patches the region in place
//! 4. on `close`, marks the status indicator disconnected
//!
//! The client is transport-agnostic: a transport feeds it
//! [`TransportEvent`]s through [`LiveReloadClient::handle`] and provides an
//! [`Outbound`] sink. Reconnection timing comes from [`ReconnectPolicy`],
//! which the transports use.
//!
//! # Example
//!
//! ```ignore
//! use livepage_client::{ClientSettings, LiveReloadClient, PageNodes, TransportEvent};
//! use livepage_dom::Document;
//!
//! let settings = ClientSettings::default();
//! let document = Document::parse(&page_html)?;
//! let nodes = PageNodes::locate(&document, &settings)?;
//! let mut client = LiveReloadClient::new(document, nodes, settings);
//!
//! client.handle(TransportEvent::Open, &mut socket)?;
//! client.handle(TransportEvent::Message(r#""<div>X</div>""#.to_owned()), &mut socket)?;
//! ```

mod client;
mod endpoint;
mod error;
mod identity;
mod reconnect;
mod snapshot;
mod status;
mod transport;

pub use client::{
    ClientSettings, ConnectionState, DEFAULT_CONTAINER_ID, EventOutcome, LiveReloadClient, PageNodes,
};
pub use endpoint::{DEFAULT_ENDPOINT_PATH, PageLocation, websocket_endpoint};
pub use error::{ClientError, DecodeError, EndpointError};
pub use identity::{DEFAULT_IDENTITY_ATTRIBUTE, IdentityToken};
pub use reconnect::{Backoff, ReconnectPolicy};
pub use snapshot::{InboundMessage, PING, PONG, Snapshot, SnapshotSequencer};
pub use status::{StatusIndicator, StatusSettings};
pub use transport::{Outbound, TransportError, TransportEvent};
