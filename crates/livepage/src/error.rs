//! CLI error types.

use livepage_client::ClientError;
use livepage_config::ConfigError;
use livepage_ws::WsError;

/// CLI error type.
#[derive(Debug, thiserror::Error)]
pub(crate) enum CliError {
    #[error("{0}")]
    Config(#[from] ConfigError),

    #[error("{0}")]
    Io(#[from] std::io::Error),

    #[error("{0}")]
    Client(#[from] ClientError),

    #[error("{0}")]
    Session(#[from] WsError),

    #[error("Failed to fetch page: {0}")]
    Fetch(String),

    #[error("Failed to parse page: {0}")]
    Page(String),
}
