// SPDX-License-Identifier: Apache-2.0
// Copyright 2025 Cachemark Contributors

//! Redis backend wrapper over the `redis` crate.
//!
//! Holds one synchronous connection behind a mutex so the concurrency
//! sweep can share it across workers. Commands are issued explicitly via
//! `redis::cmd` to keep the wrapper free of client-side magic.

use std::collections::{BTreeMap, HashMap};
use std::sync::{Mutex, MutexGuard, PoisonError};

use redis::Connection;

use crate::config::ConnectionParams;
use crate::error::{ConnectionError, OperationError};

use super::CacheConnection;

const BACKEND: &str = "redis";

pub struct RedisConnection {
    conn: Mutex<Connection>,
}

impl RedisConnection {
    /// Connect and verify the link with a PING.
    ///
    /// Fatal on failure; the caller aborts engine construction rather than
    /// retrying.
    pub fn connect(params: &ConnectionParams) -> Result<Self, ConnectionError> {
        let auth = match &params.password {
            Some(password) => format!(":{}@", password),
            None => String::new(),
        };
        let url = format!(
            "redis://{}{}:{}/{}",
            auth,
            params.host,
            params.port,
            params.database.unwrap_or(0)
        );

        let client = redis::Client::open(url.as_str()).map_err(|e| {
            ConnectionError::InvalidAddress {
                backend: BACKEND,
                message: e.to_string(),
            }
        })?;

        let mut conn = client
            .get_connection_with_timeout(params.connect_timeout)
            .map_err(|e| ConnectionError::Unreachable {
                backend: BACKEND,
                host: params.host.clone(),
                port: params.port,
                message: e.to_string(),
            })?;

        redis::cmd("PING")
            .query::<String>(&mut conn)
            .map_err(|e| ConnectionError::Handshake {
                backend: BACKEND,
                message: e.to_string(),
            })?;

        tracing::info!(host = %params.host, port = params.port, "connected to redis");

        Ok(Self {
            conn: Mutex::new(conn),
        })
    }

    fn conn(&self) -> MutexGuard<'_, Connection> {
        self.conn.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn op_err(e: redis::RedisError) -> OperationError {
        OperationError::Command {
            backend: BACKEND,
            message: e.to_string(),
        }
    }
}

impl CacheConnection for RedisConnection {
    fn set(&self, key: &str, value: &str, ttl_secs: u64) -> Result<(), OperationError> {
        let mut cmd = redis::cmd("SET");
        cmd.arg(key).arg(value);
        if ttl_secs > 0 {
            cmd.arg("EX").arg(ttl_secs);
        }
        cmd.query::<()>(&mut self.conn()).map_err(Self::op_err)
    }

    fn get(&self, key: &str) -> Result<Option<String>, OperationError> {
        redis::cmd("GET")
            .arg(key)
            .query::<Option<String>>(&mut self.conn())
            .map_err(Self::op_err)
    }

    fn delete(&self, key: &str) -> Result<bool, OperationError> {
        let removed: i64 = redis::cmd("DEL")
            .arg(key)
            .query(&mut self.conn())
            .map_err(Self::op_err)?;
        Ok(removed > 0)
    }

    fn exists(&self, key: &str) -> Result<bool, OperationError> {
        redis::cmd("EXISTS")
            .arg(key)
            .query::<bool>(&mut self.conn())
            .map_err(Self::op_err)
    }

    fn bulk_set(&self, items: &BTreeMap<String, String>) -> Result<(), OperationError> {
        let mut cmd = redis::cmd("MSET");
        for (key, value) in items {
            cmd.arg(key).arg(value);
        }
        cmd.query::<()>(&mut self.conn()).map_err(Self::op_err)
    }

    fn bulk_get(&self, keys: &[String]) -> Result<HashMap<String, String>, OperationError> {
        if keys.is_empty() {
            return Ok(HashMap::new());
        }
        let mut cmd = redis::cmd("MGET");
        for key in keys {
            cmd.arg(key);
        }
        let values: Vec<Option<String>> = cmd.query(&mut self.conn()).map_err(Self::op_err)?;

        let mut found = HashMap::with_capacity(keys.len());
        for (key, value) in keys.iter().zip(values) {
            if let Some(value) = value {
                found.insert(key.clone(), value);
            }
        }
        Ok(found)
    }

    fn flush_all(&self) -> Result<(), OperationError> {
        redis::cmd("FLUSHALL")
            .query::<()>(&mut self.conn())
            .map_err(Self::op_err)
    }

    fn ping(&self) -> Result<(), OperationError> {
        redis::cmd("PING")
            .query::<String>(&mut self.conn())
            .map_err(Self::op_err)?;
        Ok(())
    }

    fn stats(&self) -> Result<HashMap<String, String>, OperationError> {
        let info: String = redis::cmd("INFO")
            .arg("memory")
            .query(&mut self.conn())
            .map_err(Self::op_err)?;

        // INFO replies are "key:value" lines interleaved with "# Section"
        // headers and blank lines.
        let mut stats = HashMap::new();
        for line in info.lines() {
            let line = line.trim();
            if line.is_empty() || line.starts_with('#') {
                continue;
            }
            if let Some((key, value)) = line.split_once(':') {
                stats.insert(key.to_string(), value.to_string());
            }
        }
        Ok(stats)
    }
}
