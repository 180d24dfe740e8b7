// SPDX-License-Identifier: Apache-2.0
// Copyright 2025 Cachemark Contributors

//! Cache backend connections.
//!
//! Each backend is a thin wrapper over an existing client crate, exposed
//! through the [`CacheConnection`] trait so the benchmark engine drives all
//! backends through one capability surface. Wrappers hold exactly one
//! connection, reused across every scenario; they carry no benchmark state.

use std::collections::{BTreeMap, HashMap};
use std::fmt;

use serde::{Deserialize, Serialize};

use crate::error::OperationError;

pub mod memcached;
pub mod memory;
pub mod redis;

pub use self::memcached::MemcachedConnection;
pub use self::memory::InMemoryStore;
pub use self::redis::RedisConnection;

/// Identifier for one cache system under comparison.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BackendKind {
    Redis,
    Memcached,
    /// In-process store used for dry runs and tests.
    Memory,
}

impl BackendKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            BackendKind::Redis => "redis",
            BackendKind::Memcached => "memcached",
            BackendKind::Memory => "memory",
        }
    }
}

impl fmt::Display for BackendKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Minimum capability set the benchmark consumes from a cache backend.
///
/// Every method reports failure as an [`OperationError`] value; no
/// implementation panics or retries. A `ttl_secs` of 0 means no expiry.
pub trait CacheConnection: Send + Sync {
    fn set(&self, key: &str, value: &str, ttl_secs: u64) -> Result<(), OperationError>;

    /// `Ok(None)` is a miss, not an error.
    fn get(&self, key: &str) -> Result<Option<String>, OperationError>;

    /// Returns whether the key existed.
    fn delete(&self, key: &str) -> Result<bool, OperationError>;

    fn exists(&self, key: &str) -> Result<bool, OperationError>;

    fn bulk_set(&self, items: &BTreeMap<String, String>) -> Result<(), OperationError>;

    /// Missing keys are simply absent from the returned map.
    fn bulk_get(&self, keys: &[String]) -> Result<HashMap<String, String>, OperationError>;

    fn flush_all(&self) -> Result<(), OperationError>;

    fn ping(&self) -> Result<(), OperationError>;

    /// Raw backend statistics, e.g. `used_memory` for Redis or `bytes`
    /// for Memcached.
    fn stats(&self) -> Result<HashMap<String, String>, OperationError>;
}
