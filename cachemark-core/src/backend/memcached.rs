// SPDX-License-Identifier: Apache-2.0
// Copyright 2025 Cachemark Contributors

//! Memcached backend wrapper over the `memcache` crate.
//!
//! The client pools its own connections and takes `&self`, so no extra
//! locking is needed here. Memcached has no multi-set command; `bulk_set`
//! issues one store per entry.

use std::collections::{BTreeMap, HashMap};

use memcache::Client;

use crate::config::ConnectionParams;
use crate::error::{ConnectionError, OperationError};

use super::CacheConnection;

const BACKEND: &str = "memcached";

pub struct MemcachedConnection {
    client: Client,
}

impl MemcachedConnection {
    /// Connect and verify the link by asking for the server version.
    pub fn connect(params: &ConnectionParams) -> Result<Self, ConnectionError> {
        let url = format!(
            "memcache://{}:{}?timeout={}&tcp_nodelay=true",
            params.host,
            params.port,
            params.connect_timeout.as_secs().max(1)
        );

        let client = memcache::connect(url.as_str()).map_err(|e| ConnectionError::Unreachable {
            backend: BACKEND,
            host: params.host.clone(),
            port: params.port,
            message: e.to_string(),
        })?;

        client.version().map_err(|e| ConnectionError::Handshake {
            backend: BACKEND,
            message: e.to_string(),
        })?;

        tracing::info!(host = %params.host, port = params.port, "connected to memcached");

        Ok(Self { client })
    }

    fn op_err(e: memcache::MemcacheError) -> OperationError {
        OperationError::Command {
            backend: BACKEND,
            message: e.to_string(),
        }
    }
}

impl CacheConnection for MemcachedConnection {
    fn set(&self, key: &str, value: &str, ttl_secs: u64) -> Result<(), OperationError> {
        self.client
            .set(key, value, ttl_secs as u32)
            .map_err(Self::op_err)
    }

    fn get(&self, key: &str) -> Result<Option<String>, OperationError> {
        self.client.get::<String>(key).map_err(Self::op_err)
    }

    fn delete(&self, key: &str) -> Result<bool, OperationError> {
        self.client.delete(key).map_err(Self::op_err)
    }

    fn exists(&self, key: &str) -> Result<bool, OperationError> {
        // Memcached has no EXISTS command; a fetch answers the same question.
        Ok(self.client.get::<String>(key).map_err(Self::op_err)?.is_some())
    }

    fn bulk_set(&self, items: &BTreeMap<String, String>) -> Result<(), OperationError> {
        for (key, value) in items {
            self.client
                .set(key.as_str(), value.as_str(), 0)
                .map_err(Self::op_err)?;
        }
        Ok(())
    }

    fn bulk_get(&self, keys: &[String]) -> Result<HashMap<String, String>, OperationError> {
        let refs: Vec<&str> = keys.iter().map(String::as_str).collect();
        self.client.gets::<String>(&refs).map_err(Self::op_err)
    }

    fn flush_all(&self) -> Result<(), OperationError> {
        self.client.flush().map_err(Self::op_err)
    }

    fn ping(&self) -> Result<(), OperationError> {
        self.client.version().map_err(Self::op_err)?;
        Ok(())
    }

    fn stats(&self) -> Result<HashMap<String, String>, OperationError> {
        let per_server = self.client.stats().map_err(Self::op_err)?;

        // One server per wrapper; flatten the first entry.
        let mut stats = HashMap::new();
        if let Some((_, server_stats)) = per_server.into_iter().next() {
            stats.extend(server_stats);
        }
        Ok(stats)
    }
}
