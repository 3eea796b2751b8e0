//! Session driver: feeds socket events into a [`LiveReloadClient`].

use std::time::Duration;

use livepage_client::{
    ClientError, ClientSettings, EventOutcome, LiveReloadClient, PageLocation, ReconnectPolicy,
    StatusSettings, websocket_endpoint,
};
use livepage_config::Config;
use livepage_dom::LiveDom;
use tokio_util::sync::CancellationToken;
use url::Url;

use crate::error::WsError;
use crate::socket::ReconnectingSocket;

/// Everything needed to follow one page.
#[derive(Clone, Debug, PartialEq)]
pub struct SessionConfig {
    /// URL of the page being followed.
    pub page_url: String,
    /// Derived WebSocket endpoint.
    pub endpoint: Url,
    /// Client settings.
    pub settings: ClientSettings,
}

/// Build session settings from loaded configuration.
///
/// # Errors
///
/// Returns [`WsError::Config`] if no page URL is configured and
/// [`WsError::Endpoint`] if no endpoint can be derived from it.
pub fn session_config_from_config(config: &Config) -> Result<SessionConfig, WsError> {
    let page_url = config.require_page_url()?;
    let location = PageLocation::from_url(page_url)?;
    let endpoint = websocket_endpoint(&location, &config.connection.path)?;

    let settings = ClientSettings {
        container_id: config.page.container_id.clone(),
        identity_attribute: config.page.identity_attribute.clone(),
        endpoint_path: config.connection.path.clone(),
        status: StatusSettings {
            panel_id: config.status.panel_id.clone(),
            icon_id: config.status.icon_id.clone(),
            connected_class: config.status.connected_class.clone(),
            disconnected_class: config.status.disconnected_class.clone(),
        },
        reconnect: ReconnectPolicy {
            initial_delay: Duration::from_millis(config.reconnect.initial_delay_ms),
            max_delay: Duration::from_millis(config.reconnect.max_delay_ms),
            decay: config.reconnect.decay,
            max_attempts: config.reconnect.max_attempts,
        },
    };

    Ok(SessionConfig {
        page_url: page_url.to_owned(),
        endpoint,
        settings,
    })
}

/// Drive `client` from a reconnecting socket to `url` until cancelled.
///
/// Client errors are logged and the session continues: a malformed payload
/// does not end the connection. `on_update` runs after every applied
/// snapshot.
///
/// Returns when `cancel` fires or the reconnect policy gives up.
///
/// # Errors
///
/// Returns [`WsError::Update`] if `on_update` fails.
pub async fn run_session<D, F>(
    client: &mut LiveReloadClient<D>,
    url: Url,
    policy: ReconnectPolicy,
    cancel: CancellationToken,
    mut on_update: F,
) -> Result<(), WsError>
where
    D: LiveDom,
    F: FnMut(&LiveReloadClient<D>) -> std::io::Result<()>,
{
    tracing::info!(endpoint = %url, "Starting live-reload session");
    let (mut handle, mut events) = ReconnectingSocket::spawn(url, policy, cancel);

    while let Some(event) = events.recv().await {
        match client.handle(event, &mut handle) {
            Ok(EventOutcome::Applied { patches }) => {
                tracing::info!(patches, "Live region updated");
                on_update(client)?;
            }
            Ok(EventOutcome::Stale { seq }) => {
                tracing::debug!(seq, "Ignored stale snapshot");
            }
            Ok(_) => {}
            Err(e @ ClientError::Decode(_)) => {
                tracing::warn!(error = %e, "Ignoring malformed message");
            }
            Err(e) => {
                tracing::error!(error = %e, state = client.state().as_str(), "Live-reload error");
            }
        }
    }

    tracing::info!("Live-reload session ended");
    Ok(())
}
