//! Configuration Module
//!
//! This module defines all configuration structures for the stamp aggregator.
//! Configuration is loaded from TOML files and parsed using serde.

use crate::batch::PlacementPolicy;
use serde::Deserialize;
use std::fs;
use std::time::Duration;

/// Default number of requests a single batch may hold
pub const DEFAULT_BATCH_SIZE_LIMIT: usize = 100;

/// Default cadence of the flush tick
pub const DEFAULT_FLUSH_INTERVAL_MS: u64 = 1000;

/// Main configuration structure
///
/// Contains all configuration sections for the aggregator service.
/// Loaded from a TOML file (e.g., config/default.toml).
///
/// # Example TOML
/// ```toml
/// [aggregator]
/// batch_size_limit = 100
/// flush_interval_ms = 1000
/// placement = "not_before_deadline"
///
/// [api]
/// host = "127.0.0.1"
/// port = 3001
/// ```
#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub aggregator: AggregatorConfig,
    pub api: ApiConfig,
}

/// Batching and flush configuration
///
/// # Fields
/// - `batch_size_limit`: Maximum number of requests per batch; a full batch is sealed
/// - `flush_interval_ms`: How often due batches are flushed (in milliseconds)
/// - `placement`: Which open batches a request may join
///   (`"not_before_deadline"` or `"within_tolerance"`)
#[derive(Debug, Clone, Deserialize)]
pub struct AggregatorConfig {
    #[serde(default = "default_batch_size_limit")]
    pub batch_size_limit: usize,
    #[serde(default = "default_flush_interval_ms")]
    pub flush_interval_ms: u64,
    #[serde(default)]
    pub placement: PlacementPolicy,
}

impl AggregatorConfig {
    pub fn flush_interval(&self) -> Duration {
        Duration::from_millis(self.flush_interval_ms)
    }
}

impl Default for AggregatorConfig {
    fn default() -> Self {
        Self {
            batch_size_limit: DEFAULT_BATCH_SIZE_LIMIT,
            flush_interval_ms: DEFAULT_FLUSH_INTERVAL_MS,
            placement: PlacementPolicy::default(),
        }
    }
}

fn default_batch_size_limit() -> usize {
    DEFAULT_BATCH_SIZE_LIMIT
}

fn default_flush_interval_ms() -> u64 {
    DEFAULT_FLUSH_INTERVAL_MS
}

/// API server configuration
///
/// Controls the HTTP endpoint that receives stamp requests.
///
/// # Fields
/// - `host`: IP address to bind to (e.g., "127.0.0.1" or "0.0.0.0")
/// - `port`: TCP port to listen on (e.g., 3001)
#[derive(Debug, Clone, Deserialize)]
pub struct ApiConfig {
    pub host: String,
    pub port: u16,
}

impl Config {
    /// Load configuration from a TOML file
    ///
    /// # Arguments
    /// * `path` - Path to the TOML configuration file
    ///
    /// # Returns
    /// * `Ok(Config)` if the file was successfully loaded, parsed and validated
    /// * `Err` if the file couldn't be read, the TOML is invalid, or a value is out of range
    ///
    /// # Example
    /// ```no_run
    /// # use stamp_aggregator::Config;
    /// let config = Config::load("config/default.toml")?;
    /// # Ok::<(), anyhow::Error>(())
    /// ```
    pub fn load(path: &str) -> anyhow::Result<Self> {
        let content = fs::read_to_string(path)?;
        Self::from_toml(&content)
    }

    /// Parse and validate configuration from TOML text
    pub fn from_toml(content: &str) -> anyhow::Result<Self> {
        let config: Config = toml::from_str(content)?;
        config.validate()?;
        Ok(config)
    }

    /// Reject values the aggregator cannot run with
    pub fn validate(&self) -> anyhow::Result<()> {
        if self.aggregator.batch_size_limit == 0 {
            anyhow::bail!("aggregator.batch_size_limit must be at least 1");
        }
        if self.aggregator.flush_interval_ms == 0 {
            anyhow::bail!("aggregator.flush_interval_ms must be greater than 0");
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parses_full_config() {
        let config = Config::from_toml(
            r#"
            [aggregator]
            batch_size_limit = 10
            flush_interval_ms = 250
            placement = "within_tolerance"

            [api]
            host = "0.0.0.0"
            port = 8080
            "#,
        )
        .unwrap();

        assert_eq!(config.aggregator.batch_size_limit, 10);
        assert_eq!(config.aggregator.flush_interval(), Duration::from_millis(250));
        assert_eq!(config.aggregator.placement, PlacementPolicy::WithinTolerance);
        assert_eq!(config.api.host, "0.0.0.0");
        assert_eq!(config.api.port, 8080);
    }

    #[test]
    fn test_aggregator_section_defaults() {
        let config = Config::from_toml(
            r#"
            [api]
            host = "127.0.0.1"
            port = 3001
            "#,
        )
        .unwrap();

        assert_eq!(config.aggregator.batch_size_limit, 100);
        assert_eq!(config.aggregator.flush_interval_ms, 1000);
        assert_eq!(config.aggregator.placement, PlacementPolicy::NotBeforeDeadline);
    }

    #[test]
    fn test_rejects_unknown_placement() {
        let result = Config::from_toml(
            r#"
            [aggregator]
            placement = "whenever"

            [api]
            host = "127.0.0.1"
            port = 3001
            "#,
        );
        assert!(result.is_err());
    }

    #[test]
    fn test_rejects_zero_batch_size() {
        let result = Config::from_toml(
            r#"
            [aggregator]
            batch_size_limit = 0

            [api]
            host = "127.0.0.1"
            port = 3001
            "#,
        );
        assert!(result.is_err());
    }

    #[test]
    fn test_rejects_zero_flush_interval() {
        let result = Config::from_toml(
            r#"
            [aggregator]
            flush_interval_ms = 0

            [api]
            host = "127.0.0.1"
            port = 3001
            "#,
        );
        assert!(result.is_err());
    }
}
