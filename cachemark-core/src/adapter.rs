// SPDX-License-Identifier: Apache-2.0
// Copyright 2025 Cachemark Contributors

//! Uniform operation surface over one backend connection.
//!
//! The adapter forwards every data-plane call to its [`CacheConnection`],
//! counting failures as it goes, and provides the timed-run primitive the
//! engine uses to produce a [`BenchmarkResult`]. The failure path stays
//! visible in each method signature; callers inside a timed batch discard
//! the error and keep going.

use std::collections::{BTreeMap, HashMap};
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Instant;

use crate::backend::{BackendKind, CacheConnection};
use crate::error::{BenchError, BenchResult, OperationError};
use crate::result::BenchmarkResult;

/// Warmup calls are capped so short runs do not double their cost.
const MAX_WARMUP_CALLS: u64 = 100;

/// Backend stats keys probed for a memory reading, in order.
const MEMORY_STAT_KEYS: [&str; 3] = ["used_memory", "bytes", "mem_bytes"];

pub struct CacheAdapter {
    backend: BackendKind,
    conn: Box<dyn CacheConnection>,
    errors: AtomicU64,
}

impl CacheAdapter {
    pub fn new(backend: BackendKind, conn: Box<dyn CacheConnection>) -> Self {
        Self {
            backend,
            conn,
            errors: AtomicU64::new(0),
        }
    }

    pub fn backend(&self) -> BackendKind {
        self.backend
    }

    pub fn error_count(&self) -> u64 {
        self.errors.load(Ordering::Relaxed)
    }

    pub fn reset_error_count(&self) {
        self.errors.store(0, Ordering::Relaxed);
    }

    fn record(&self, err: OperationError) -> OperationError {
        self.errors.fetch_add(1, Ordering::Relaxed);
        tracing::debug!(backend = %self.backend, error = %err, "operation failed");
        err
    }

    // =====================================================================
    // Data-plane operations
    // =====================================================================

    pub fn set(&self, key: &str, value: &str, ttl_secs: u64) -> Result<(), OperationError> {
        self.conn
            .set(key, value, ttl_secs)
            .map_err(|e| self.record(e))
    }

    pub fn get(&self, key: &str) -> Result<Option<String>, OperationError> {
        self.conn.get(key).map_err(|e| self.record(e))
    }

    pub fn delete(&self, key: &str) -> Result<bool, OperationError> {
        self.conn.delete(key).map_err(|e| self.record(e))
    }

    pub fn exists(&self, key: &str) -> Result<bool, OperationError> {
        self.conn.exists(key).map_err(|e| self.record(e))
    }

    pub fn bulk_set(&self, items: &BTreeMap<String, String>) -> Result<(), OperationError> {
        self.conn.bulk_set(items).map_err(|e| self.record(e))
    }

    pub fn bulk_get(&self, keys: &[String]) -> Result<HashMap<String, String>, OperationError> {
        self.conn.bulk_get(keys).map_err(|e| self.record(e))
    }

    pub fn flush_all(&self) -> Result<(), OperationError> {
        self.conn.flush_all().map_err(|e| self.record(e))
    }

    pub fn ping(&self) -> Result<(), OperationError> {
        self.conn.ping().map_err(|e| self.record(e))
    }

    pub fn backend_info(&self) -> Result<HashMap<String, String>, OperationError> {
        self.conn.stats().map_err(|e| self.record(e))
    }

    /// Current backend memory usage in bytes, 0 when the backend does not
    /// report one. A stats failure is counted like any other operation
    /// failure.
    pub fn memory_usage(&self) -> u64 {
        let stats = match self.backend_info() {
            Ok(stats) => stats,
            Err(_) => return 0,
        };
        MEMORY_STAT_KEYS
            .iter()
            .find_map(|key| stats.get(*key))
            .and_then(|value| value.trim().parse().ok())
            .unwrap_or(0)
    }

    // =====================================================================
    // Timing primitive
    // =====================================================================

    /// Run `action` through a warmup phase and exactly `iterations` timed
    /// calls, producing one result record.
    ///
    /// The error counter is reset up front and read back at the end, so the
    /// result reflects failures across warmup and the timed phase. Samples
    /// are wall-clock milliseconds from a monotonic clock.
    pub fn timed_run<F>(
        &self,
        operation: &str,
        mut action: F,
        iterations: u64,
    ) -> BenchResult<BenchmarkResult>
    where
        F: FnMut(),
    {
        if iterations == 0 {
            return Err(BenchError::ZeroIterations);
        }

        tracing::debug!(backend = %self.backend, operation, iterations, "starting timed run");

        self.reset_error_count();

        // The memory window opens before warmup: warmup writes land in the
        // backend too and belong to the run's footprint.
        let memory_before = self.memory_usage();

        let warmup = (iterations / 10).min(MAX_WARMUP_CALLS);
        for _ in 0..warmup {
            action();
        }

        let mut samples = Vec::with_capacity(iterations as usize);
        let run_start = Instant::now();
        for _ in 0..iterations {
            let start = Instant::now();
            action();
            samples.push(start.elapsed().as_secs_f64() * 1000.0);
        }
        let total_ms = run_start.elapsed().as_secs_f64() * 1000.0;

        let memory_after = self.memory_usage();
        let memory_delta = memory_after as i64 - memory_before as i64;

        Ok(BenchmarkResult::from_samples(
            operation,
            self.backend,
            &samples,
            total_ms,
            memory_delta,
            self.error_count(),
        ))
    }
}
