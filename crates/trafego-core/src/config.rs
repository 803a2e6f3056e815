//! Configuration management for trafego.
//!
//! Loads configuration from ${TRAFEGO_HOME}/config.toml with sensible defaults.

use std::fs;
use std::path::Path;
use std::time::Duration;

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

/// Environment variable that overrides the configured API base URL.
pub const API_URL_ENV: &str = "TRAFEGO_API_URL";

/// Returns the default config template with comments.
///
/// This is embedded from default_config.toml at compile time.
fn default_config_template() -> &'static str {
    include_str!("../default_config.toml")
}

pub mod paths {
    //! Path resolution for trafego configuration and session data.
    //!
    //! TRAFEGO_HOME resolution order:
    //! 1. TRAFEGO_HOME environment variable (if set)
    //! 2. ~/.config/trafego (default)

    use std::path::PathBuf;

    /// Returns the trafego home directory.
    ///
    /// Checks TRAFEGO_HOME env var first, falls back to ~/.config/trafego
    pub fn trafego_home() -> PathBuf {
        if let Ok(home) = std::env::var("TRAFEGO_HOME") {
            return PathBuf::from(home);
        }

        dirs::home_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join(".config")
            .join("trafego")
    }

    /// Returns the path to the config.toml file.
    pub fn config_path() -> PathBuf {
        trafego_home().join("config.toml")
    }

    /// Returns the path to the persisted session document.
    pub fn session_path() -> PathBuf {
        trafego_home().join("session.json")
    }
}

/// Dashboard presentation settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct DashboardConfig {
    /// Number of campaigns listed in the dashboard table
    pub rows: usize,
}

impl Default for DashboardConfig {
    fn default() -> Self {
        Self {
            rows: Config::DEFAULT_DASHBOARD_ROWS,
        }
    }
}

/// Main configuration structure.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Base URL of the campaign backend
    pub api_base_url: String,

    /// Timeout for each API request in seconds (0 disables)
    pub request_timeout_secs: u32,

    /// Dashboard settings
    #[serde(default)]
    pub dashboard: DashboardConfig,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            api_base_url: Self::DEFAULT_API_BASE_URL.to_string(),
            request_timeout_secs: Self::DEFAULT_REQUEST_TIMEOUT_SECS,
            dashboard: DashboardConfig::default(),
        }
    }
}

impl Config {
    pub const DEFAULT_API_BASE_URL: &str = "http://localhost:8000";
    const DEFAULT_REQUEST_TIMEOUT_SECS: u32 = 30;
    const DEFAULT_DASHBOARD_ROWS: usize = 10;

    /// Loads configuration from the default config path.
    ///
    /// # Errors
    /// Returns an error if the file exists but cannot be read or parsed.
    pub fn load() -> Result<Self> {
        Self::load_from(&paths::config_path())
    }

    /// Loads configuration from a specific path.
    /// Returns defaults if file doesn't exist.
    ///
    /// # Errors
    /// Returns an error if the file exists but cannot be read or parsed.
    pub fn load_from(path: &Path) -> Result<Self> {
        if path.exists() {
            let contents = fs::read_to_string(path)
                .with_context(|| format!("Failed to read config from {}", path.display()))?;
            toml::from_str(&contents)
                .with_context(|| format!("Failed to parse config from {}", path.display()))
        } else {
            Ok(Config::default())
        }
    }

    /// Creates a default config file at the given path.
    /// Returns an error if the file already exists.
    ///
    /// # Errors
    /// Returns an error if the file exists or cannot be written.
    pub fn init(path: &Path) -> Result<()> {
        if path.exists() {
            anyhow::bail!("Config file already exists at {}", path.display());
        }

        Self::write_config(path, default_config_template())
    }

    pub fn request_timeout(&self) -> Option<Duration> {
        if self.request_timeout_secs == 0 {
            None
        } else {
            Some(Duration::from_secs(u64::from(self.request_timeout_secs)))
        }
    }

    /// Resolves the API base URL with precedence: env > config > default.
    ///
    /// Trailing slashes are stripped so paths can be appended directly.
    ///
    /// # Errors
    /// Returns an error if the chosen URL is not well-formed.
    pub fn effective_base_url(&self) -> Result<String> {
        self.resolve_base_url(std::env::var(API_URL_ENV).ok().as_deref())
    }

    /// Same as [`Config::effective_base_url`] with the env value passed in.
    fn resolve_base_url(&self, from_env: Option<&str>) -> Result<String> {
        let candidates = [from_env, Some(self.api_base_url.as_str())];

        let chosen = candidates
            .into_iter()
            .flatten()
            .map(str::trim)
            .find(|url| !url.is_empty())
            .unwrap_or(Self::DEFAULT_API_BASE_URL);

        url::Url::parse(chosen).with_context(|| format!("Invalid API base URL: {chosen}"))?;
        Ok(chosen.trim_end_matches('/').to_string())
    }

    /// Writes config content to a file, creating parent directories as needed.
    /// Uses atomic write (temp file + rename) to prevent corruption.
    fn write_config(path: &Path, content: &str) -> Result<()> {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)
                .with_context(|| format!("Failed to create directory {}", parent.display()))?;
        }

        let tmp_path = path.with_extension("toml.tmp");
        fs::write(&tmp_path, content)
            .with_context(|| format!("Failed to write config to {}", tmp_path.display()))?;
        fs::rename(&tmp_path, path).with_context(|| {
            format!(
                "Failed to rename {} to {}",
                tmp_path.display(),
                path.display()
            )
        })?;

        Ok(())
    }
}
