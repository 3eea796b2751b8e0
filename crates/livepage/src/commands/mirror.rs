//! `livepage mirror` command implementation.

use std::io::Write;
use std::path::{Path, PathBuf};
use std::time::Duration;

use clap::Args;
use livepage_client::{LiveReloadClient, PageNodes};
use livepage_config::{CliSettings, Config};
use livepage_dom::Document;
use livepage_ws::{run_session, session_config_from_config};
use tokio_util::sync::CancellationToken;
use ureq::Agent;

use crate::error::CliError;
use crate::output::Output;

/// Timeout for the initial page fetch.
const FETCH_TIMEOUT: Duration = Duration::from_secs(30);

/// Arguments for the mirror command.
#[derive(Args)]
pub(crate) struct MirrorArgs {
    /// Path to configuration file (default: auto-discover livepage.toml).
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Page to follow (overrides config).
    #[arg(short, long)]
    url: Option<String>,

    /// WebSocket endpoint path (overrides config).
    #[arg(short, long)]
    path: Option<String>,

    /// Write the live region to this file instead of stdout (overrides config).
    #[arg(short, long)]
    output: Option<PathBuf>,

    /// Give up after this many failed reconnects (overrides config).
    #[arg(long)]
    max_attempts: Option<u32>,

    /// Enable verbose output (connection and update logs).
    #[arg(short, long)]
    pub verbose: bool,
}

impl MirrorArgs {
    /// Execute the mirror command.
    ///
    /// # Errors
    ///
    /// Returns an error if configuration fails, the page cannot be fetched or
    /// has no live region, or writing an update fails.
    pub(crate) async fn execute(self) -> Result<(), CliError> {
        let output = Output::new();

        let config = Config::load(self.config.as_deref(), Some(&self.cli_settings()))?;
        let session = session_config_from_config(&config)?;
        let target = config.mirror_resolved.output.clone();

        output.info(&format!("Fetching {}", session.page_url));
        let page_url = session.page_url.clone();
        let html = tokio::task::spawn_blocking(move || fetch_page(&page_url))
            .await
            .map_err(|e| CliError::Fetch(e.to_string()))??;

        let document = Document::parse(&html).map_err(|e| CliError::Page(format!("{e:?}")))?;
        let nodes = PageNodes::locate(&document, &session.settings)?;
        let mut client = LiveReloadClient::new(document, nodes, session.settings.clone());
        write_region(&client, target.as_deref())?;

        output.highlight(&format!(
            "Following #{} via {}",
            session.settings.container_id, session.endpoint
        ));
        if let Some(path) = &target {
            output.info(&format!("Writing updates to {}", path.display()));
        }

        let cancel = CancellationToken::new();
        tokio::spawn({
            let cancel = cancel.clone();
            async move {
                if tokio::signal::ctrl_c().await.is_ok() {
                    cancel.cancel();
                }
            }
        });

        run_session(
            &mut client,
            session.endpoint,
            session.settings.reconnect.clone(),
            cancel,
            |client| write_region(client, target.as_deref()),
        )
        .await?;

        output.success("Session ended");
        Ok(())
    }

    fn cli_settings(&self) -> CliSettings {
        CliSettings {
            url: self.url.clone(),
            path: self.path.clone(),
            output: self.output.clone(),
            max_attempts: self.max_attempts,
        }
    }
}

/// Fetch the page HTML.
fn fetch_page(url: &str) -> Result<String, CliError> {
    let agent: Agent = Agent::config_builder()
        .timeout_global(Some(FETCH_TIMEOUT))
        .http_status_as_error(false)
        .build()
        .into();

    let response = agent
        .get(url)
        .call()
        .map_err(|e| CliError::Fetch(e.to_string()))?;

    let status = response.status().as_u16();
    let mut body = response.into_body();
    if status >= 400 {
        return Err(CliError::Fetch(format!("HTTP {status} for {url}")));
    }

    body.read_to_string()
        .map_err(|e| CliError::Fetch(e.to_string()))
}

/// Write the current live region to `target`, or stdout when unset.
fn write_region(client: &LiveReloadClient<Document>, target: Option<&Path>) -> std::io::Result<()> {
    let html = client.dom().inner_html(*client.container());
    match target {
        Some(path) => std::fs::write(path, html),
        None => {
            let mut stdout = std::io::stdout().lock();
            writeln!(stdout, "{html}")?;
            stdout.flush()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use livepage_client::{ClientSettings, TransportEvent};
    use pretty_assertions::assert_eq;

    fn client() -> LiveReloadClient<Document> {
        let document = Document::parse(
            r#"<html><head data-article-dst-filename="a.html"></head><body><div id="NavAndArticle"><p>one</p></div></body></html>"#,
        )
        .unwrap();
        let settings = ClientSettings::default();
        let nodes = PageNodes::locate(&document, &settings).unwrap();
        LiveReloadClient::new(document, nodes, settings)
    }

    #[test]
    fn test_write_region_to_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("region.html");
        let mut client = client();

        write_region(&client, Some(&path)).unwrap();
        assert_eq!(std::fs::read_to_string(&path).unwrap(), "<p>one</p>");

        let mut sent = Vec::new();
        client
            .handle(
                TransportEvent::Message(r#""<p>two</p>""#.to_owned()),
                &mut sent,
            )
            .unwrap();
        write_region(&client, Some(&path)).unwrap();
        assert_eq!(std::fs::read_to_string(&path).unwrap(), "<p>two</p>");
    }

    #[test]
    fn test_cli_settings_from_args() {
        let args = MirrorArgs {
            config: None,
            url: Some("http://localhost:5000/".to_owned()),
            path: None,
            output: Some(PathBuf::from("out.html")),
            max_attempts: Some(3),
            verbose: false,
        };

        let settings = args.cli_settings();

        assert_eq!(settings.url.as_deref(), Some("http://localhost:5000/"));
        assert_eq!(settings.path, None);
        assert_eq!(settings.output, Some(PathBuf::from("out.html")));
        assert_eq!(settings.max_attempts, Some(3));
    }

    #[test]
    fn test_fetch_page_unreachable() {
        let err = fetch_page("http://127.0.0.1:9/").unwrap_err();

        assert!(matches!(err, CliError::Fetch(_)));
    }
}
