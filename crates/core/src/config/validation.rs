//! Sanity checks applied to a loaded [`AppConfig`].
//!
//! Limits cover the network delegate (body size, timeout, user agent), the
//! package connection (statement cache) and the tile URL template. A package
//! path that does not exist is tolerated: the cascade then runs network-only.

use crate::config::AppConfig;
use thiserror::Error;

/// Largest network payload accepted for a single tile or resource.
const MAX_PAYLOAD_BYTES: usize = 50 * 1024 * 1024;

/// Accepted network timeout range, in milliseconds.
const TIMEOUT_RANGE_MS: std::ops::RangeInclusive<u64> = 100..=300_000;

/// Accepted prepared statement cache sizes.
const STATEMENT_CACHE_RANGE: std::ops::RangeInclusive<usize> = 1..=1024;

const TEMPLATE_TOKENS: [&str; 3] = ["{z}", "{x}", "{y}"];

/// Why a tilecache configuration could not be used.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// figment could not read or deserialize a layer.
    #[error("failed to load tilecache configuration: {0}")]
    LoadFailed(String),

    /// A value is outside the range the cache can work with.
    #[error("invalid tilecache setting {field}: {reason}")]
    Invalid { field: String, reason: String },

    /// A command needs a setting that was left unset.
    #[error("tilecache setting {field} is required ({hint})")]
    Missing { field: String, hint: String },
}

fn invalid(field: &str, reason: impl Into<String>) -> ConfigError {
    ConfigError::Invalid { field: field.into(), reason: reason.into() }
}

impl AppConfig {
    /// Reject settings the network delegate, the package connection or the
    /// tile URL builder cannot work with.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::Invalid` naming the first offending field.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.max_bytes == 0 || self.max_bytes > MAX_PAYLOAD_BYTES {
            return Err(invalid("max_bytes", "tile payload limit must be between 1 byte and 50MB"));
        }

        if !TIMEOUT_RANGE_MS.contains(&self.timeout_ms) {
            return Err(invalid("timeout_ms", "network timeout must be between 100ms and 300000ms"));
        }

        if self.user_agent.trim().is_empty() {
            return Err(invalid("user_agent", "tile servers reject requests without a user agent"));
        }

        if !STATEMENT_CACHE_RANGE.contains(&self.statement_cache_capacity) {
            return Err(invalid("statement_cache_capacity", "must be between 1 and 1024"));
        }

        if let Some(token) = TEMPLATE_TOKENS.iter().find(|t| !self.tile_url_template.contains(*t)) {
            return Err(invalid("tile_url_template", format!("must contain {token}")));
        }

        if let Some(path) = &self.package_path
            && !path.exists()
        {
            tracing::warn!(path = %path.display(), "offline package not found; tiles will come from the network");
        }

        Ok(())
    }
}
