//! Browser entry point for the livepage live-reload client.
//!
//! Loaded by the blog's pages. On start it finds the live region, connects
//! to the live-reload endpoint derived from `window.location`, announces the
//! page identity and patches the region on every snapshot.
//!
//! The console log level can be raised per page with
//! `<head data-livepage-log="debug">`.

mod dom;
mod logging;
mod socket;

use livepage_client::{ClientSettings, LiveReloadClient, PageLocation, websocket_endpoint};
use wasm_bindgen::prelude::*;

use crate::dom::BrowserDom;

/// `<head>` attribute selecting the console log level.
const LOG_LEVEL_ATTRIBUTE: &str = "data-livepage-log";

/// Build a [`PageLocation`] from `window.location` parts.
///
/// `port` is empty when the page uses the scheme's default port.
fn page_location(protocol: &str, hostname: &str, port: &str) -> PageLocation {
    PageLocation {
        scheme: protocol.trim_end_matches(':').to_owned(),
        hostname: hostname.to_owned(),
        port: port.parse().ok(),
    }
}

#[wasm_bindgen(start)]
pub fn start() -> Result<(), JsValue> {
    console_error_panic_hook::set_once();

    let window = web_sys::window().ok_or_else(|| JsValue::from_str("no global `window`"))?;
    let document = window
        .document()
        .ok_or_else(|| JsValue::from_str("no document on window"))?;

    let level = document
        .head()
        .and_then(|head| head.get_attribute(LOG_LEVEL_ATTRIBUTE));
    logging::init(logging::parse_level(level.as_deref()));

    let location = window.location();
    let page = page_location(
        &location.protocol()?,
        &location.hostname()?,
        &location.port()?,
    );

    let settings = ClientSettings::default();
    let endpoint = match websocket_endpoint(&page, &settings.endpoint_path) {
        Ok(endpoint) => endpoint,
        Err(e) => {
            tracing::error!("Live reload disabled: {e}");
            return Ok(());
        }
    };

    let dom = BrowserDom::new(document);
    let nodes = match dom.locate(&settings) {
        Ok(nodes) => nodes,
        Err(e) => {
            tracing::error!("Live reload disabled: {e}");
            return Ok(());
        }
    };

    tracing::info!(endpoint = %endpoint, "Starting live reload");
    let client = LiveReloadClient::new(dom, nodes, settings);
    socket::connect(endpoint.as_str(), client)
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_page_location_with_port() {
        let page = page_location("http:", "localhost", "5000");

        assert_eq!(page.scheme, "http");
        assert_eq!(page.port, Some(5000));
        assert_eq!(
            websocket_endpoint(&page, "/websocket").unwrap().as_str(),
            "ws://localhost:5000/websocket"
        );
    }

    #[test]
    fn test_page_location_default_port() {
        let page = page_location("https:", "blog.example.org", "");

        assert_eq!(page.port, None);
        assert_eq!(
            websocket_endpoint(&page, "/websocket").unwrap().as_str(),
            "wss://blog.example.org/websocket"
        );
    }
}
