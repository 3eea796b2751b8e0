//! Native transport error types.

use livepage_client::EndpointError;
use livepage_config::ConfigError;

/// Session setup or update failure.
#[derive(Debug, thiserror::Error)]
pub enum WsError {
    #[error("{0}")]
    Config(#[from] ConfigError),

    #[error("{0}")]
    Endpoint(#[from] EndpointError),

    /// The update callback failed.
    #[error("Failed to publish update: {0}")]
    Update(#[from] std::io::Error),
}
