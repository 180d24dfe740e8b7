// SPDX-License-Identifier: Apache-2.0
// Copyright 2025 Cachemark Contributors

//! Benchmark engine: owns both adapters and drives the scenario battery.
//!
//! Scenarios run strictly sequentially so no two timed spans overlap. Each
//! scenario produces one [`BenchmarkResult`] per backend; the engine
//! accumulates them in battery order for the report generator.

use std::collections::BTreeMap;
use std::sync::Barrier;
use std::thread;
use std::time::Instant;

use uuid::Uuid;

use crate::adapter::CacheAdapter;
use crate::backend::{BackendKind, MemcachedConnection, RedisConnection};
use crate::config::BenchConfig;
use crate::error::BenchResult;
use crate::result::BenchmarkResult;
use crate::stats::{self, OpKind};

/// Payload sizes for the data-size sweep: 64 B to 1 MiB, geometric (x4).
const SIZE_SWEEP_BYTES: [usize; 8] = [64, 256, 1024, 4096, 16384, 65536, 262144, 1048576];

/// Unique key so iterations within a timed run never interfere.
fn unique_key(prefix: &str) -> String {
    format!("cachemark:{}:{}", prefix, Uuid::new_v4().simple())
}

pub struct BenchmarkEngine {
    config: BenchConfig,
    adapters: Vec<CacheAdapter>,
    results: Vec<BenchmarkResult>,
}

impl BenchmarkEngine {
    /// Connect both backends and build the engine. Connection failures are
    /// fatal: no retry, construction aborts.
    pub fn new(config: BenchConfig) -> BenchResult<Self> {
        let redis = RedisConnection::connect(&config.redis)?;
        let memcached = MemcachedConnection::connect(&config.memcached)?;
        let adapters = vec![
            CacheAdapter::new(BackendKind::Redis, Box::new(redis)),
            CacheAdapter::new(BackendKind::Memcached, Box::new(memcached)),
        ];
        Ok(Self::with_adapters(config, adapters))
    }

    /// Build an engine over pre-connected adapters. Used by tests and dry
    /// runs with in-process stores.
    pub fn with_adapters(config: BenchConfig, adapters: Vec<CacheAdapter>) -> Self {
        Self {
            config,
            adapters,
            results: Vec::new(),
        }
    }

    pub fn results(&self) -> &[BenchmarkResult] {
        &self.results
    }

    /// Execute the whole scenario battery in order, appending every result.
    ///
    /// Calling this again appends another battery's worth of results; the
    /// accumulated list is never reset.
    pub fn run_all(&mut self) -> BenchResult<&[BenchmarkResult]> {
        tracing::info!(iterations = self.config.iterations, "running scenario battery");

        let groups = [
            ("basic_ops", Self::bench_basic_ops as fn(&Self) -> BenchResult<Vec<BenchmarkResult>>),
            ("size_sweep", Self::bench_size_sweep),
            ("concurrency_sweep", Self::bench_concurrency_sweep),
            ("mixed_workload", Self::bench_mixed_workload),
            ("bulk_ops", Self::bench_bulk_ops),
            ("expiration", Self::bench_expiration),
        ];

        for (name, run) in groups {
            tracing::info!(scenario = name, "starting scenario group");
            let results = run(self)?;
            tracing::info!(scenario = name, results = results.len(), "scenario group finished");
            self.results.extend(results);
        }

        Ok(&self.results)
    }

    /// Flush both backends and drop the connections. Call once, after
    /// reporting; the engine does not clean up on error by itself.
    pub fn cleanup(self) {
        for adapter in &self.adapters {
            if adapter.flush_all().is_err() {
                tracing::warn!(backend = %adapter.backend(), "flush during cleanup failed");
            }
        }
        tracing::info!("benchmark cleanup complete");
    }

    // =====================================================================
    // Scenario groups
    // =====================================================================

    /// SET and GET at the three named payload sizes.
    fn bench_basic_ops(&self) -> BenchResult<Vec<BenchmarkResult>> {
        let iterations = self.config.iterations;
        let sizes = [
            ("small", self.config.payload_sizes.small),
            ("medium", self.config.payload_sizes.medium),
            ("large", self.config.payload_sizes.large),
        ];

        let mut out = Vec::new();
        for (label, size) in sizes {
            for adapter in &self.adapters {
                let payload = stats::synthetic_payload(size);

                let set_result = adapter
                    .timed_run(
                        &format!("SET_{}", label),
                        || {
                            let key = unique_key("set");
                            let _ = adapter.set(&key, &payload, 0);
                        },
                        iterations,
                    )?
                    .with_metadata("payload_bytes", size);
                out.push(set_result);

                // GET runs against one key populated before timing starts.
                let key = unique_key("get");
                let _ = adapter.set(&key, &payload, 0);
                let get_result = adapter
                    .timed_run(
                        &format!("GET_{}", label),
                        || {
                            let _ = adapter.get(&key);
                        },
                        iterations,
                    )?
                    .with_metadata("payload_bytes", size);
                out.push(get_result);
            }
        }
        Ok(out)
    }

    /// SET across the fixed geometric payload-size progression.
    fn bench_size_sweep(&self) -> BenchResult<Vec<BenchmarkResult>> {
        let iterations = self.config.iterations;

        let mut out = Vec::new();
        for size in SIZE_SWEEP_BYTES {
            for adapter in &self.adapters {
                let payload = stats::synthetic_payload(size);
                let result = adapter
                    .timed_run(
                        &format!("SET_size_{}", size),
                        || {
                            let key = unique_key("sweep");
                            let _ = adapter.set(&key, &payload, 0);
                        },
                        iterations,
                    )?
                    .with_metadata("payload_bytes", size);
                out.push(result);
            }
        }
        Ok(out)
    }

    /// Parallel SET load at each configured worker count, per backend.
    fn bench_concurrency_sweep(&self) -> BenchResult<Vec<BenchmarkResult>> {
        let mut out = Vec::new();
        for &workers in &self.config.concurrency_levels {
            for adapter in &self.adapters {
                out.push(self.bench_concurrent_sets(adapter, workers));
            }
        }
        Ok(out)
    }

    /// Partition the configured iteration count across `workers` real
    /// threads, release them together, and time the whole span wall-clock.
    fn bench_concurrent_sets(&self, adapter: &CacheAdapter, workers: usize) -> BenchmarkResult {
        let total = self.config.iterations;
        let payload = stats::synthetic_payload(self.config.payload_sizes.small);

        adapter.reset_error_count();
        let memory_before = adapter.memory_usage();

        let barrier = Barrier::new(workers + 1);
        let mut samples: Vec<f64> = Vec::with_capacity(total as usize);
        let mut total_ms = 0.0;

        thread::scope(|scope| {
            let handles: Vec<_> = (0..workers as u64)
                .map(|w| {
                    let barrier = &barrier;
                    let payload = &payload;
                    // Spread the remainder over the first workers.
                    let share = total / workers as u64 + u64::from(w < total % workers as u64);
                    scope.spawn(move || {
                        let mut local = Vec::with_capacity(share as usize);
                        barrier.wait();
                        for _ in 0..share {
                            let key = unique_key("concurrent");
                            let start = Instant::now();
                            let _ = adapter.set(&key, payload, 0);
                            local.push(start.elapsed().as_secs_f64() * 1000.0);
                        }
                        local
                    })
                })
                .collect();

            barrier.wait();
            let span_start = Instant::now();
            for handle in handles {
                if let Ok(local) = handle.join() {
                    samples.extend(local);
                }
            }
            total_ms = span_start.elapsed().as_secs_f64() * 1000.0;
        });

        let memory_after = adapter.memory_usage();

        BenchmarkResult::from_samples(
            format!("SET_concurrent_{}", workers),
            adapter.backend(),
            &samples,
            total_ms,
            memory_after as i64 - memory_before as i64,
            adapter.error_count(),
        )
        .with_metadata("workers", workers)
    }

    /// One shuffled 80/20 read/write sequence, replayed against each
    /// backend with an explicit cursor that wraps around.
    fn bench_mixed_workload(&self) -> BenchResult<Vec<BenchmarkResult>> {
        let iterations = self.config.iterations;
        let tags = stats::mixed_workload(iterations as usize);
        let payload_size = self.config.payload_sizes.small;

        let mut out = Vec::new();
        for adapter in &self.adapters {
            let mut cursor = 0usize;
            let result = adapter
                .timed_run(
                    "MIXED_80_20",
                    || {
                        let tag = tags[cursor];
                        cursor = (cursor + 1) % tags.len();
                        match tag {
                            // Reads target keys nobody populated; a miss is
                            // a valid outcome, not an error.
                            OpKind::Read => {
                                let _ = adapter.get(&format!("cachemark:mixed:{}", cursor));
                            }
                            OpKind::Write => {
                                let key = unique_key("mixed");
                                let payload = stats::synthetic_payload(payload_size);
                                let _ = adapter.set(&key, &payload, 0);
                            }
                        }
                    },
                    iterations,
                )?
                .with_metadata("read_ratio", 0.8);
            out.push(result);
        }
        Ok(out)
    }

    /// MSET and MGET at each configured batch size, against the same key
    /// set per size.
    fn bench_bulk_ops(&self) -> BenchResult<Vec<BenchmarkResult>> {
        let iterations = self.config.iterations;
        let payload_size = self.config.payload_sizes.small;

        let mut out = Vec::new();
        for &batch in &self.config.bulk_batch_sizes {
            for adapter in &self.adapters {
                let token = Uuid::new_v4().simple().to_string();
                let mut items = BTreeMap::new();
                for i in 0..batch {
                    items.insert(
                        format!("cachemark:bulk:{}:{}", token, i),
                        stats::synthetic_payload(payload_size),
                    );
                }
                let keys: Vec<String> = items.keys().cloned().collect();

                let mset_result = adapter
                    .timed_run(
                        &format!("MSET_{}", batch),
                        || {
                            let _ = adapter.bulk_set(&items);
                        },
                        iterations,
                    )?
                    .with_metadata("batch_size", batch);
                out.push(mset_result);

                let mget_result = adapter
                    .timed_run(
                        &format!("MGET_{}", batch),
                        || {
                            let _ = adapter.bulk_get(&keys);
                        },
                        iterations,
                    )?
                    .with_metadata("batch_size", batch);
                out.push(mget_result);
            }
        }
        Ok(out)
    }

    /// SET with a fixed TTL.
    fn bench_expiration(&self) -> BenchResult<Vec<BenchmarkResult>> {
        let iterations = self.config.iterations;
        let ttl_secs = self.config.ttl_secs;
        let payload = stats::synthetic_payload(self.config.payload_sizes.small);

        let mut out = Vec::new();
        for adapter in &self.adapters {
            let result = adapter
                .timed_run(
                    "SET_with_ttl",
                    || {
                        let key = unique_key("ttl");
                        let _ = adapter.set(&key, &payload, ttl_secs);
                    },
                    iterations,
                )?
                .with_metadata("ttl_secs", ttl_secs);
            out.push(result);
        }
        Ok(out)
    }
}
