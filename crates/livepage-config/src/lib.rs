//! Configuration management for livepage.
//!
//! Parses `livepage.toml` configuration files with serde and provides
//! auto-discovery of config files in parent directories.
//!
//! CLI settings can be applied during load via [`CliSettings`].
//!
//! ## Environment Variable Expansion
//!
//! String configuration values support environment variable expansion:
//!
//! - `${VAR}` - expands to the value of VAR, errors if unset
//! - `${VAR:-default}` - expands to VAR if set, otherwise uses default
//!
//! Expanded fields:
//! - `page.url`
//! - `connection.path`
//! - `mirror.output`

mod expand;

use serde::Deserialize;
use std::path::{Path, PathBuf};

/// CLI settings that override configuration file values.
///
/// All fields are optional. Only non-None values override the loaded config.
#[derive(Debug, Default)]
pub struct CliSettings {
    /// Override page URL.
    pub url: Option<String>,
    /// Override WebSocket endpoint path.
    pub path: Option<String>,
    /// Override mirror output file.
    pub output: Option<PathBuf>,
    /// Override reconnect attempt limit.
    pub max_attempts: Option<u32>,
}

/// Configuration filename to search for.
const CONFIG_FILENAME: &str = "livepage.toml";

/// Application configuration.
#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Page configuration.
    pub page: PageConfig,
    /// Connection configuration.
    pub connection: ConnectionConfig,
    /// Reconnect backoff configuration.
    pub reconnect: ReconnectConfig,
    /// Status indicator hooks.
    pub status: StatusConfig,
    /// Mirror output (paths are relative strings from TOML).
    mirror: MirrorConfigRaw,

    /// Resolved mirror configuration (set after loading).
    #[serde(skip)]
    pub mirror_resolved: MirrorConfig,
    /// Path to the config file (set after loading).
    #[serde(skip)]
    pub config_path: Option<PathBuf>,
}

/// Page configuration.
#[derive(Debug, Deserialize)]
#[serde(default)]
pub struct PageConfig {
    /// URL of the page to follow.
    pub url: Option<String>,
    /// Id of the live region.
    pub container_id: String,
    /// `<head>` attribute carrying the page identity.
    pub identity_attribute: String,
}

impl Default for PageConfig {
    fn default() -> Self {
        Self {
            url: None,
            container_id: "NavAndArticle".to_owned(),
            identity_attribute: "data-article-dst-filename".to_owned(),
        }
    }
}

/// Connection configuration.
#[derive(Debug, Deserialize)]
#[serde(default)]
pub struct ConnectionConfig {
    /// Path of the WebSocket endpoint on the page's host.
    pub path: String,
}

impl Default for ConnectionConfig {
    fn default() -> Self {
        Self {
            path: "/websocket".to_owned(),
        }
    }
}

/// Reconnect backoff configuration.
#[derive(Debug, Deserialize)]
#[serde(default)]
pub struct ReconnectConfig {
    /// Delay before the first retry, in milliseconds.
    pub initial_delay_ms: u64,
    /// Upper bound on any retry delay, in milliseconds.
    pub max_delay_ms: u64,
    /// Growth factor between consecutive retries.
    pub decay: f64,
    /// Consecutive attempts before giving up. Unlimited when unset.
    pub max_attempts: Option<u32>,
}

impl Default for ReconnectConfig {
    fn default() -> Self {
        Self {
            initial_delay_ms: 1000,
            max_delay_ms: 30_000,
            decay: 1.5,
            max_attempts: None,
        }
    }
}

/// Status indicator hooks.
#[derive(Debug, Deserialize)]
#[serde(default)]
pub struct StatusConfig {
    /// Id of the panel shown on first connection.
    pub panel_id: String,
    /// Id of the status icon.
    pub icon_id: String,
    /// Icon class while connected.
    pub connected_class: String,
    /// Icon class while disconnected.
    pub disconnected_class: String,
}

impl Default for StatusConfig {
    fn default() -> Self {
        Self {
            panel_id: "websocket".to_owned(),
            icon_id: "websocketStatus".to_owned(),
            connected_class: "glyphicon-ok".to_owned(),
            disconnected_class: "glyphicon-remove".to_owned(),
        }
    }
}

/// Raw mirror configuration as parsed from TOML (paths as strings).
#[derive(Debug, Deserialize, Default)]
#[serde(default)]
struct MirrorConfigRaw {
    output: Option<String>,
}

/// Resolved mirror configuration with absolute paths.
#[derive(Debug, Default)]
pub struct MirrorConfig {
    /// File the live region is written to. Standard output when unset.
    pub output: Option<PathBuf>,
}

/// Configuration error.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// File not found.
    #[error("Configuration file not found: {}", .0.display())]
    NotFound(PathBuf),
    /// I/O error.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
    /// TOML parsing error.
    #[error("TOML parse error: {0}")]
    Parse(#[from] toml::de::Error),
    /// Validation error.
    #[error("Configuration error: {0}")]
    Validation(String),
    /// Environment variable error during expansion.
    #[error("Environment variable error in {field}: {message}")]
    EnvVar {
        /// Config field path (e.g., "`page.url`").
        field: String,
        /// Error message (e.g., "${`BLOG_HOST`} not set").
        message: String,
    },
}

/// Require a string field to be non-empty.
fn require_non_empty(value: &str, field: &str) -> Result<(), ConfigError> {
    if value.trim().is_empty() {
        return Err(ConfigError::Validation(format!("{field} cannot be empty")));
    }
    Ok(())
}

/// Require a URL field to use http:// or https:// scheme.
fn require_http_url(url: &str, field: &str) -> Result<(), ConfigError> {
    if !url.starts_with("http://") && !url.starts_with("https://") {
        return Err(ConfigError::Validation(format!(
            "{field} must start with http:// or https://"
        )));
    }
    Ok(())
}

impl Config {
    /// Load configuration from file with optional CLI settings.
    ///
    /// If `config_path` is provided, loads from that file.
    /// Otherwise, searches for `livepage.toml` in current directory and parents.
    ///
    /// CLI settings are applied after loading and path resolution, and the
    /// result is validated again so overrides cannot produce an invalid config.
    ///
    /// # Errors
    ///
    /// Returns error if explicit `config_path` doesn't exist, parsing fails,
    /// or the final configuration is invalid.
    pub fn load(
        config_path: Option<&Path>,
        cli_settings: Option<&CliSettings>,
    ) -> Result<Self, ConfigError> {
        let mut config = if let Some(path) = config_path {
            if !path.exists() {
                return Err(ConfigError::NotFound(path.to_path_buf()));
            }
            Self::load_from_file(path)?
        } else if let Some(discovered) = Self::discover_config() {
            Self::load_from_file(&discovered)?
        } else {
            Self::default()
        };

        if let Some(settings) = cli_settings {
            config.apply_cli_settings(settings);
            config.validate()?;
        }

        Ok(config)
    }

    /// Apply CLI settings to the configuration.
    fn apply_cli_settings(&mut self, settings: &CliSettings) {
        if let Some(url) = &settings.url {
            self.page.url = Some(url.clone());
        }
        if let Some(path) = &settings.path {
            self.connection.path.clone_from(path);
        }
        if let Some(output) = &settings.output {
            self.mirror_resolved.output = Some(output.clone());
        }
        if let Some(max_attempts) = settings.max_attempts {
            self.reconnect.max_attempts = Some(max_attempts);
        }
    }

    /// Get the validated page URL.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::Validation` if no page URL is configured.
    pub fn require_page_url(&self) -> Result<&str, ConfigError> {
        let url = self.page.url.as_deref().ok_or_else(|| {
            ConfigError::Validation("page.url required (set it in [page] or pass --url)".into())
        })?;
        require_http_url(url, "page.url")?;
        Ok(url)
    }

    /// Search for config file in current directory and parents.
    fn discover_config() -> Option<PathBuf> {
        let mut current = std::env::current_dir().ok()?;
        loop {
            let candidate = current.join(CONFIG_FILENAME);
            if candidate.exists() {
                return Some(candidate);
            }
            if !current.pop() {
                return None;
            }
        }
    }

    /// Load configuration from a specific file.
    fn load_from_file(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path)?;
        let mut config: Self = toml::from_str(&content)?;

        // Expand environment variables before path resolution
        config.expand_env_vars()?;

        let config_dir = path.parent().unwrap_or(Path::new("."));
        config.resolve_paths(config_dir);
        config.config_path = Some(path.to_path_buf());

        config.validate()?;

        Ok(config)
    }

    /// Validate configuration values.
    ///
    /// Called automatically after loading from file and after CLI overrides.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::Validation` if any validation fails.
    pub fn validate(&self) -> Result<(), ConfigError> {
        self.validate_page()?;
        self.validate_connection()?;
        self.validate_reconnect()?;
        self.validate_status()?;
        Ok(())
    }

    fn validate_page(&self) -> Result<(), ConfigError> {
        if let Some(ref url) = self.page.url {
            require_non_empty(url, "page.url")?;
            require_http_url(url, "page.url")?;
        }
        require_non_empty(&self.page.container_id, "page.container_id")?;
        require_non_empty(&self.page.identity_attribute, "page.identity_attribute")?;
        Ok(())
    }

    fn validate_connection(&self) -> Result<(), ConfigError> {
        require_non_empty(&self.connection.path, "connection.path")?;
        if !self.connection.path.starts_with('/') {
            return Err(ConfigError::Validation(
                "connection.path must start with /".to_owned(),
            ));
        }
        Ok(())
    }

    fn validate_reconnect(&self) -> Result<(), ConfigError> {
        let reconnect = &self.reconnect;
        if reconnect.initial_delay_ms == 0 {
            return Err(ConfigError::Validation(
                "reconnect.initial_delay_ms must be greater than 0".to_owned(),
            ));
        }
        if reconnect.max_delay_ms < reconnect.initial_delay_ms {
            return Err(ConfigError::Validation(
                "reconnect.max_delay_ms cannot be less than reconnect.initial_delay_ms".to_owned(),
            ));
        }
        if !reconnect.decay.is_finite() || reconnect.decay < 1.0 {
            return Err(ConfigError::Validation(
                "reconnect.decay must be a number >= 1.0".to_owned(),
            ));
        }
        if reconnect.max_attempts == Some(0) {
            return Err(ConfigError::Validation(
                "reconnect.max_attempts must be greater than 0".to_owned(),
            ));
        }
        Ok(())
    }

    fn validate_status(&self) -> Result<(), ConfigError> {
        require_non_empty(&self.status.panel_id, "status.panel_id")?;
        require_non_empty(&self.status.icon_id, "status.icon_id")?;
        require_non_empty(&self.status.connected_class, "status.connected_class")?;
        require_non_empty(&self.status.disconnected_class, "status.disconnected_class")?;
        Ok(())
    }

    /// Expand environment variable references in configuration strings.
    fn expand_env_vars(&mut self) -> Result<(), ConfigError> {
        if let Some(ref url) = self.page.url {
            self.page.url = Some(expand::expand_env(url, "page.url")?);
        }
        self.connection.path = expand::expand_env(&self.connection.path, "connection.path")?;
        if let Some(ref output) = self.mirror.output {
            self.mirror.output = Some(expand::expand_env(output, "mirror.output")?);
        }
        Ok(())
    }

    /// Resolve relative paths to absolute paths based on config directory.
    fn resolve_paths(&mut self, config_dir: &Path) {
        self.mirror_resolved = MirrorConfig {
            output: self.mirror.output.as_deref().map(|p| config_dir.join(p)),
        };
    }
}
