// SPDX-License-Identifier: Apache-2.0
// Copyright 2025 Cachemark Contributors

//! YAML configuration parser with strict validation.
//!
//! Configuration is resolved once at startup into an explicit [`BenchConfig`]
//! value that is passed into the engine and adapters; there is no ambient
//! global state. Any invalid field prevents the benchmark from starting.

use std::collections::HashSet;
use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::Deserialize;

use crate::error::{BenchResult, ConfigError};

/// Connection parameters for one cache backend.
#[derive(Debug, Clone)]
pub struct ConnectionParams {
    pub host: String,
    pub port: u16,
    pub password: Option<String>,
    /// Logical database index (Redis) or namespace (ignored by Memcached).
    pub database: Option<u32>,
    pub connect_timeout: Duration,
    /// Only meaningful for backends that support weighted multi-node setups.
    pub weight: u32,
}

impl ConnectionParams {
    pub fn new(host: impl Into<String>, port: u16) -> Self {
        Self {
            host: host.into(),
            port,
            password: None,
            database: None,
            connect_timeout: Duration::from_secs(default_connect_timeout_secs()),
            weight: 1,
        }
    }
}

/// Named payload sizes for the basic-operation scenarios, in bytes.
#[derive(Debug, Clone, Copy)]
pub struct PayloadSizes {
    pub small: usize,
    pub medium: usize,
    pub large: usize,
}

impl Default for PayloadSizes {
    fn default() -> Self {
        Self {
            small: 64,
            medium: 1024,
            large: 65536,
        }
    }
}

/// Validated benchmark configuration.
#[derive(Debug, Clone)]
pub struct BenchConfig {
    /// Timed iterations per scenario.
    pub iterations: u64,
    pub payload_sizes: PayloadSizes,
    /// Worker counts for the concurrency sweep.
    pub concurrency_levels: Vec<usize>,
    /// Mapping sizes for the bulk-operation scenarios.
    pub bulk_batch_sizes: Vec<usize>,
    /// TTL used by the expiration scenario, in seconds.
    pub ttl_secs: u64,
    pub output_dir: PathBuf,
    pub redis: ConnectionParams,
    pub memcached: ConnectionParams,
}

impl Default for BenchConfig {
    fn default() -> Self {
        Self {
            iterations: default_iterations(),
            payload_sizes: PayloadSizes::default(),
            concurrency_levels: default_concurrency_levels(),
            bulk_batch_sizes: default_bulk_batch_sizes(),
            ttl_secs: default_ttl_secs(),
            output_dir: PathBuf::from(default_output_dir()),
            redis: ConnectionParams::new("127.0.0.1", 6379),
            memcached: ConnectionParams::new("127.0.0.1", 11211),
        }
    }
}

// =========================================================================
// Raw (pre-validation) deserialization types
// =========================================================================

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct RawBackendConfig {
    host: Option<String>,
    port: Option<u16>,
    password: Option<String>,
    database: Option<u32>,
    #[serde(default = "default_connect_timeout_secs")]
    connect_timeout_secs: u64,
    #[serde(default = "default_weight")]
    weight: u32,
}

impl Default for RawBackendConfig {
    fn default() -> Self {
        Self {
            host: None,
            port: None,
            password: None,
            database: None,
            connect_timeout_secs: default_connect_timeout_secs(),
            weight: default_weight(),
        }
    }
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct RawPayloadSizes {
    #[serde(default = "default_small")]
    small: usize,
    #[serde(default = "default_medium")]
    medium: usize,
    #[serde(default = "default_large")]
    large: usize,
}

impl Default for RawPayloadSizes {
    fn default() -> Self {
        Self {
            small: default_small(),
            medium: default_medium(),
            large: default_large(),
        }
    }
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct RawConfig {
    #[serde(default = "default_iterations")]
    iterations: u64,
    #[serde(default)]
    payload_sizes: RawPayloadSizes,
    #[serde(default = "default_concurrency_levels")]
    concurrency_levels: Vec<usize>,
    #[serde(default = "default_bulk_batch_sizes")]
    bulk_batch_sizes: Vec<usize>,
    #[serde(default = "default_ttl_secs")]
    ttl_secs: u64,
    #[serde(default = "default_output_dir")]
    output_dir: String,
    #[serde(default)]
    redis: RawBackendConfig,
    #[serde(default)]
    memcached: RawBackendConfig,
}

fn default_iterations() -> u64 {
    1000
}

fn default_concurrency_levels() -> Vec<usize> {
    vec![1, 5, 10, 25, 50, 100]
}

fn default_bulk_batch_sizes() -> Vec<usize> {
    vec![10, 50, 100, 500]
}

fn default_ttl_secs() -> u64 {
    60
}

fn default_output_dir() -> String {
    "reports".to_string()
}

fn default_connect_timeout_secs() -> u64 {
    5
}

fn default_weight() -> u32 {
    1
}

fn default_small() -> usize {
    64
}

fn default_medium() -> usize {
    1024
}

fn default_large() -> usize {
    65536
}

impl BenchConfig {
    /// Load and validate configuration from a YAML file.
    pub fn from_yaml_file(path: impl AsRef<Path>) -> BenchResult<Self> {
        let path = path.as_ref();

        if !path.exists() {
            return Err(ConfigError::NotFound {
                path: path.to_path_buf(),
            }
            .into());
        }

        let content = std::fs::read_to_string(path).map_err(|e| crate::error::BenchError::Io {
            context: "reading config file",
            source: e,
        })?;

        Self::from_yaml_str(&content)
    }

    /// Load and validate configuration from a YAML string.
    pub fn from_yaml_str(content: &str) -> BenchResult<Self> {
        let raw: RawConfig = serde_yaml::from_str(content).map_err(|e| ConfigError::Parse {
            message: format!("YAML parse error: {}", e),
        })?;

        Self::validate(raw)
    }

    fn validate(raw: RawConfig) -> BenchResult<Self> {
        if raw.iterations == 0 {
            return Err(ConfigError::InvalidFieldValue {
                field: "iterations",
                value: raw.iterations.to_string(),
                reason: "must be at least 1".to_string(),
            }
            .into());
        }

        for (field, size) in [
            ("payload_sizes.small", raw.payload_sizes.small),
            ("payload_sizes.medium", raw.payload_sizes.medium),
            ("payload_sizes.large", raw.payload_sizes.large),
        ] {
            if size == 0 {
                return Err(ConfigError::InvalidFieldValue {
                    field,
                    value: size.to_string(),
                    reason: "payload size must be nonzero".to_string(),
                }
                .into());
            }
        }

        if raw.concurrency_levels.is_empty() || raw.concurrency_levels.contains(&0) {
            return Err(ConfigError::InvalidFieldValue {
                field: "concurrency_levels",
                value: format!("{:?}", raw.concurrency_levels),
                reason: "must be a non-empty list of nonzero worker counts".to_string(),
            }
            .into());
        }

        let distinct: HashSet<usize> = raw.concurrency_levels.iter().copied().collect();
        if distinct.len() != raw.concurrency_levels.len() {
            return Err(ConfigError::InvalidFieldValue {
                field: "concurrency_levels",
                value: format!("{:?}", raw.concurrency_levels),
                reason: "duplicate worker counts".to_string(),
            }
            .into());
        }

        if raw.bulk_batch_sizes.is_empty() || raw.bulk_batch_sizes.contains(&0) {
            return Err(ConfigError::InvalidFieldValue {
                field: "bulk_batch_sizes",
                value: format!("{:?}", raw.bulk_batch_sizes),
                reason: "must be a non-empty list of nonzero batch sizes".to_string(),
            }
            .into());
        }

        let redis = Self::validate_backend("redis", raw.redis, 6379)?;
        let memcached = Self::validate_backend("memcached", raw.memcached, 11211)?;

        Ok(Self {
            iterations: raw.iterations,
            payload_sizes: PayloadSizes {
                small: raw.payload_sizes.small,
                medium: raw.payload_sizes.medium,
                large: raw.payload_sizes.large,
            },
            concurrency_levels: raw.concurrency_levels,
            bulk_batch_sizes: raw.bulk_batch_sizes,
            ttl_secs: raw.ttl_secs,
            output_dir: PathBuf::from(raw.output_dir),
            redis,
            memcached,
        })
    }

    fn validate_backend(
        name: &'static str,
        raw: RawBackendConfig,
        default_port: u16,
    ) -> BenchResult<ConnectionParams> {
        let host = raw.host.unwrap_or_else(|| "127.0.0.1".to_string());
        if host.is_empty() {
            return Err(ConfigError::InvalidFieldValue {
                field: "host",
                value: host,
                reason: format!("{} host cannot be empty", name),
            }
            .into());
        }

        let port = raw.port.unwrap_or(default_port);
        if port == 0 {
            return Err(ConfigError::InvalidFieldValue {
                field: "port",
                value: port.to_string(),
                reason: format!("{} port cannot be 0", name),
            }
            .into());
        }

        Ok(ConnectionParams {
            host,
            port,
            password: raw.password,
            database: raw.database,
            connect_timeout: Duration::from_secs(raw.connect_timeout_secs),
            weight: raw.weight,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = BenchConfig::default();
        assert_eq!(config.iterations, 1000);
        assert_eq!(config.concurrency_levels, vec![1, 5, 10, 25, 50, 100]);
        assert_eq!(config.bulk_batch_sizes, vec![10, 50, 100, 500]);
        assert_eq!(config.ttl_secs, 60);
        assert_eq!(config.redis.port, 6379);
        assert_eq!(config.memcached.port, 11211);
    }

    #[test]
    fn test_from_yaml_str() {
        let yaml = r#"
iterations: 500
payload_sizes:
  small: 128
redis:
  host: cache-1.internal
  port: 6380
  database: 2
memcached:
  host: cache-2.internal
"#;
        let config = BenchConfig::from_yaml_str(yaml).unwrap();
        assert_eq!(config.iterations, 500);
        assert_eq!(config.payload_sizes.small, 128);
        // Untouched fields keep their defaults.
        assert_eq!(config.payload_sizes.medium, 1024);
        assert_eq!(config.redis.host, "cache-1.internal");
        assert_eq!(config.redis.port, 6380);
        assert_eq!(config.redis.database, Some(2));
        assert_eq!(config.memcached.host, "cache-2.internal");
        assert_eq!(config.memcached.port, 11211);
    }

    #[test]
    fn test_zero_iterations_rejected() {
        let err = BenchConfig::from_yaml_str("iterations: 0").unwrap_err();
        assert!(err.to_string().contains("iterations"));
    }

    #[test]
    fn test_zero_concurrency_level_rejected() {
        let err = BenchConfig::from_yaml_str("concurrency_levels: [1, 0]").unwrap_err();
        assert!(err.to_string().contains("concurrency_levels"));
    }

    #[test]
    fn test_unknown_field_rejected() {
        assert!(BenchConfig::from_yaml_str("itreations: 10").is_err());
    }

    #[test]
    fn test_missing_file() {
        let err = BenchConfig::from_yaml_file("/nonexistent/cachemark.yaml").unwrap_err();
        assert!(err.to_string().contains("not found"));
    }
}
