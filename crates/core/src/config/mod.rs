//! Application configuration with layered loading.
//!
//! This module provides configuration management using figment for layered
//! configuration loading from multiple sources:
//!
//! 1. Environment variables (TILECACHE_*)
//! 2. TOML config file (if TILECACHE_CONFIG_FILE set)
//! 3. Built-in defaults

use std::path::PathBuf;
use std::time::Duration;

use figment::{
    Figment,
    providers::{Env, Format, Serialized, Toml},
};
use serde::{Deserialize, Serialize};

use crate::storage::DEFAULT_STATEMENT_CACHE_CAPACITY;

mod validation;

pub use validation::ConfigError;

/// Application configuration with layered loading.
///
/// Loading precedence (highest wins):
/// 1. Environment variables (TILECACHE_*)
/// 2. TOML config file (if TILECACHE_CONFIG_FILE set)
/// 3. Built-in defaults
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AppConfig {
    /// Path to the offline MBTiles package.
    ///
    /// Set via TILECACHE_PACKAGE_PATH. When unset, every request goes to the
    /// network.
    #[serde(default)]
    pub package_path: Option<PathBuf>,

    /// User-Agent string for network requests.
    ///
    /// Set via TILECACHE_USER_AGENT environment variable.
    #[serde(default = "default_user_agent")]
    pub user_agent: String,

    /// Maximum bytes to accept per network response.
    ///
    /// Set via TILECACHE_MAX_BYTES environment variable.
    #[serde(default = "default_max_bytes")]
    pub max_bytes: usize,

    /// Network request timeout in milliseconds.
    ///
    /// Set via TILECACHE_TIMEOUT_MS environment variable.
    #[serde(default = "default_timeout_ms")]
    pub timeout_ms: u64,

    /// Prepared statements kept per package connection.
    ///
    /// Set via TILECACHE_STATEMENT_CACHE_CAPACITY environment variable.
    #[serde(default = "default_statement_cache_capacity")]
    pub statement_cache_capacity: usize,

    /// URL template for tiles, with `{z}`, `{x}` and `{y}` tokens.
    ///
    /// Set via TILECACHE_TILE_URL_TEMPLATE environment variable.
    #[serde(default = "default_tile_url_template")]
    pub tile_url_template: String,
}

fn default_user_agent() -> String {
    "tilecache/0.1".into()
}

fn default_max_bytes() -> usize {
    5_242_880 // 5MB
}

fn default_timeout_ms() -> u64 {
    20_000
}

fn default_statement_cache_capacity() -> usize {
    DEFAULT_STATEMENT_CACHE_CAPACITY
}

fn default_tile_url_template() -> String {
    "https://tile.openstreetmap.org/{z}/{x}/{y}.png".into()
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            package_path: None,
            user_agent: default_user_agent(),
            max_bytes: default_max_bytes(),
            timeout_ms: default_timeout_ms(),
            statement_cache_capacity: default_statement_cache_capacity(),
            tile_url_template: default_tile_url_template(),
        }
    }
}

impl AppConfig {
    /// Timeout as Duration for use with reqwest/tokio.
    pub fn timeout(&self) -> Duration {
        Duration::from_millis(self.timeout_ms)
    }

    /// Load configuration from all sources with layered precedence.
    ///
    /// Priority (highest wins):
    /// 1. Environment variables prefixed with `TILECACHE_`
    /// 2. TOML file from `TILECACHE_CONFIG_FILE` (if set)
    /// 3. Built-in defaults via `Default::default()`
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` if:
    /// - Configuration file cannot be read
    /// - Environment variables cannot be parsed
    /// - Validation fails after loading
    pub fn load() -> Result<Self, ConfigError> {
        let mut figment = Figment::from(Serialized::defaults(Self::default()));

        if let Ok(config_path) = std::env::var("TILECACHE_CONFIG_FILE") {
            figment = figment.merge(Toml::file(&config_path));
        }

        figment = figment.merge(
            Env::prefixed("TILECACHE_")
                .ignore(&["CONFIG_FILE"])
                .map(|key| key.as_str().to_lowercase().into())
                .split("__"),
        );

        let config: Self = figment.extract().map_err(|e| ConfigError::LoadFailed(e.to_string()))?;

        config.validate()?;

        Ok(config)
    }

    /// Package path, if one is configured.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::Missing` if no package path is set.
    pub fn require_package_path(&self) -> Result<&PathBuf, ConfigError> {
        self.package_path.as_ref().ok_or_else(|| ConfigError::Missing {
            field: "package_path".into(),
            hint: "Set TILECACHE_PACKAGE_PATH or pass --package".into(),
        })
    }
}
