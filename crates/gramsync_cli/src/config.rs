//! Configuration file support for gramsync.
//!
//! Configuration is loaded with the following precedence (highest to lowest):
//! 1. Environment variables (prefixed with `GRAMSYNC_`, e.g., `GRAMSYNC_DATABASE_URL`)
//! 2. Config file (~/.config/gramsync/config.toml or ./gramsync.toml)
//! 3. Built-in defaults
//!
//! The database URL defaults to `sqlite://~/.local/state/gramsync/gramsync.db` on Linux
//! (using the XDG state directory) if not explicitly configured.
//!
//! Example config file:
//! ```toml
//! [database]
//! url = "sqlite://~/.local/state/gramsync/gramsync.db"  # optional, this is the default
//!
//! [instagram]
//! token = "IGQ..."  # or use GRAMSYNC_INSTAGRAM_TOKEN env var
//! endpoint = "https://graph.instagram.com/v25.0"
//! author = "me"
//! timeout = 30
//! ```

use std::path::PathBuf;
use std::time::Duration;

use config::{Config as ConfigBuilder, Environment, File, FileFormat};
use directories::ProjectDirs;
use gramsync::instagram::{DEFAULT_BASE_URL, DEFAULT_TIMEOUT};
use gramsync::sync::LOCAL_AUTHOR;
use serde::Deserialize;

/// Top-level configuration.
#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Database configuration.
    pub database: DatabaseConfig,
    /// Instagram Graph API configuration.
    pub instagram: InstagramConfig,
}

/// Database configuration.
#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct DatabaseConfig {
    /// Database connection URL.
    /// Supports sqlite:// and postgres:// schemes.
    pub url: Option<String>,
}

/// Instagram Graph API configuration.
#[derive(Debug, Deserialize)]
#[serde(default)]
pub struct InstagramConfig {
    /// Long-lived access token.
    /// Can also be set via GRAMSYNC_INSTAGRAM_TOKEN environment variable.
    pub token: Option<String>,
    /// Graph API base URL, including the version segment.
    pub endpoint: String,
    /// Username recorded on comments posted through gramsync.
    pub author: String,
    /// Request timeout in seconds.
    pub timeout: u64,
}

impl Default for InstagramConfig {
    fn default() -> Self {
        Self {
            token: None,
            endpoint: DEFAULT_BASE_URL.to_string(),
            author: LOCAL_AUTHOR.to_string(),
            timeout: DEFAULT_TIMEOUT.as_secs(),
        }
    }
}

impl Config {
    /// Load configuration using the config crate's layered approach.
    ///
    /// Sources are loaded in order (later sources override earlier):
    /// 1. Built-in defaults
    /// 2. XDG config file (~/.config/gramsync/config.toml)
    /// 3. Local config file (./gramsync.toml)
    /// 4. Environment variables with GRAMSYNC_ prefix
    pub fn load() -> Self {
        let mut builder = ConfigBuilder::builder();

        if let Some(config_path) = Self::default_config_path()
            && config_path.exists()
        {
            tracing::debug!("Loading config from {:?}", config_path);
            builder = builder.add_source(
                File::from(config_path)
                    .format(FileFormat::Toml)
                    .required(false),
            );
        }

        // Local config file (higher priority than XDG)
        let local_config = PathBuf::from("gramsync.toml");
        if local_config.exists() {
            tracing::debug!("Loading config from ./gramsync.toml");
            builder = builder.add_source(
                File::from(local_config)
                    .format(FileFormat::Toml)
                    .required(false),
            );
        }

        // e.g., GRAMSYNC_INSTAGRAM_TOKEN -> instagram.token
        builder = builder.add_source(
            Environment::with_prefix("GRAMSYNC")
                .separator("_")
                .try_parsing(true),
        );

        match builder.build() {
            Ok(settings) => match settings.try_deserialize::<Config>() {
                Ok(config) => config,
                Err(e) => {
                    tracing::warn!("Failed to deserialize config: {}", e);
                    Config::default()
                }
            },
            Err(e) => {
                tracing::warn!("Failed to build config: {}", e);
                Config::default()
            }
        }
    }

    /// Get the database URL, falling back to the default state directory path.
    ///
    /// The `mode=rwc` parameter creates the SQLite file if it doesn't exist.
    pub fn database_url(&self) -> Option<String> {
        self.database.url.clone().or_else(|| {
            Self::default_state_dir().map(|state_dir| {
                let db_path = state_dir.join("gramsync.db");
                format!("sqlite://{}?mode=rwc", db_path.display())
            })
        })
    }

    /// Get the Instagram access token, if one is configured and non-blank.
    pub fn instagram_token(&self) -> Option<String> {
        self.instagram
            .token
            .as_deref()
            .map(str::trim)
            .filter(|t| !t.is_empty())
            .map(str::to_string)
    }

    /// Request timeout for Graph API calls.
    pub fn instagram_timeout(&self) -> Duration {
        Duration::from_secs(self.instagram.timeout.max(1))
    }

    /// Get the default config file path.
    pub fn default_config_path() -> Option<PathBuf> {
        ProjectDirs::from("", "", "gramsync").map(|dirs| dirs.config_dir().join("config.toml"))
    }

    /// Get the default state directory path.
    ///
    /// On Linux, this is `$XDG_STATE_HOME/gramsync` or `~/.local/state/gramsync`.
    /// On macOS/Windows, falls back to the data directory.
    pub fn default_state_dir() -> Option<PathBuf> {
        ProjectDirs::from("", "", "gramsync").map(|dirs| {
            // state_dir() returns None on macOS/Windows
            dirs.state_dir()
                .map(|p| p.to_path_buf())
                .unwrap_or_else(|| dirs.data_dir().to_path_buf())
        })
    }
}
