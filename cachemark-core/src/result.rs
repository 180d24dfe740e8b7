// SPDX-License-Identifier: Apache-2.0
// Copyright 2025 Cachemark Contributors

//! Measured outcome of one timed scenario run.
//!
//! A [`BenchmarkResult`] is built once, at the end of a timing run, and
//! never mutated afterwards; the engine owns the accumulated list for the
//! rest of the process.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::backend::BackendKind;
use crate::stats;

/// Percentiles recorded for every run.
pub const TRACKED_PERCENTILES: [u32; 3] = [50, 95, 99];

/// One measured outcome of running N iterations of one operation against
/// one backend. Latencies are in milliseconds.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BenchmarkResult {
    /// Operation identifier, e.g. `SET_small`.
    pub operation: String,
    pub backend: BackendKind,
    pub iterations: u64,
    /// Wall-clock span of the timed phase (warmup excluded).
    pub total_time_ms: f64,
    pub avg_latency_ms: f64,
    pub min_latency_ms: f64,
    pub max_latency_ms: f64,
    pub p50_ms: f64,
    pub p95_ms: f64,
    pub p99_ms: f64,
    /// Completed operations per second, floored.
    pub throughput_ops: u64,
    /// Backend memory growth across the run; negative when the backend
    /// shrank (evictions, expiry).
    pub memory_delta_bytes: i64,
    /// Operations absorbed as failures during warmup and the timed phase.
    pub errors: u64,
    /// Raw percentile table keyed by percentile.
    pub percentiles: BTreeMap<u32, f64>,
    /// Free-form scenario annotations (payload size, worker count, ...).
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub metadata: BTreeMap<String, serde_json::Value>,
}

impl BenchmarkResult {
    /// Fold a set of per-call latency samples into a result record.
    ///
    /// `total_ms` is the wall-clock span of the whole timed phase, which for
    /// parallel runs is shorter than the sum of the samples.
    pub fn from_samples(
        operation: impl Into<String>,
        backend: BackendKind,
        samples_ms: &[f64],
        total_ms: f64,
        memory_delta_bytes: i64,
        errors: u64,
    ) -> Self {
        let operation = operation.into();
        if samples_ms.is_empty() {
            return Self {
                operation,
                backend,
                iterations: 0,
                total_time_ms: total_ms,
                avg_latency_ms: 0.0,
                min_latency_ms: 0.0,
                max_latency_ms: 0.0,
                p50_ms: 0.0,
                p95_ms: 0.0,
                p99_ms: 0.0,
                throughput_ops: 0,
                memory_delta_bytes,
                errors,
                percentiles: BTreeMap::new(),
                metadata: BTreeMap::new(),
            };
        }

        let iterations = samples_ms.len() as u64;
        let sum: f64 = samples_ms.iter().sum();
        let min = samples_ms.iter().copied().fold(f64::INFINITY, f64::min);
        let max = samples_ms.iter().copied().fold(f64::NEG_INFINITY, f64::max);
        let percentiles = stats::percentiles(samples_ms, &TRACKED_PERCENTILES);

        Self {
            operation,
            backend,
            iterations,
            total_time_ms: total_ms,
            avg_latency_ms: sum / iterations as f64,
            min_latency_ms: min,
            max_latency_ms: max,
            p50_ms: percentiles[&50],
            p95_ms: percentiles[&95],
            p99_ms: percentiles[&99],
            throughput_ops: stats::throughput(iterations, total_ms / 1000.0),
            memory_delta_bytes,
            errors,
            percentiles,
            metadata: BTreeMap::new(),
        }
    }

    /// Attach a scenario annotation.
    pub fn with_metadata(mut self, key: impl Into<String>, value: impl Serialize) -> Self {
        self.metadata.insert(
            key.into(),
            serde_json::to_value(value).unwrap_or(serde_json::Value::Null),
        );
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_result() -> BenchmarkResult {
        let samples: Vec<f64> = (1..=10).map(|v| v as f64).collect();
        BenchmarkResult::from_samples("SET_small", BackendKind::Redis, &samples, 55.0, 4096, 1)
    }

    #[test]
    fn test_from_samples() {
        let result = sample_result();
        assert_eq!(result.iterations, 10);
        assert_eq!(result.min_latency_ms, 1.0);
        assert_eq!(result.max_latency_ms, 10.0);
        assert!((result.avg_latency_ms - 5.5).abs() < 1e-9);
        assert_eq!(result.p50_ms, 5.5);
        assert!((result.p95_ms - 9.55).abs() < 1e-9);
        // 10 ops in 55ms
        assert_eq!(result.throughput_ops, 181);
        assert_eq!(result.errors, 1);
    }

    #[test]
    fn test_latency_ordering_invariant() {
        let result = sample_result();
        assert!(result.min_latency_ms <= result.p50_ms);
        assert!(result.p50_ms <= result.p95_ms);
        assert!(result.p95_ms <= result.p99_ms);
        assert!(result.p99_ms <= result.max_latency_ms);
        assert!(result.min_latency_ms <= result.avg_latency_ms);
        assert!(result.avg_latency_ms <= result.max_latency_ms);
    }

    #[test]
    fn test_empty_samples_zeroed() {
        let result = BenchmarkResult::from_samples("GET", BackendKind::Memory, &[], 0.0, 0, 0);
        assert_eq!(result.iterations, 0);
        assert_eq!(result.throughput_ops, 0);
        assert!(result.percentiles.is_empty());
    }

    #[test]
    fn test_serde_roundtrip_preserves_fields() {
        let result = sample_result().with_metadata("payload_bytes", 64);
        let json = serde_json::to_string(&result).unwrap();
        let back: BenchmarkResult = serde_json::from_str(&json).unwrap();

        assert_eq!(back.operation, result.operation);
        assert_eq!(back.backend, result.backend);
        assert_eq!(back.iterations, result.iterations);
        assert_eq!(back.total_time_ms, result.total_time_ms);
        assert_eq!(back.avg_latency_ms, result.avg_latency_ms);
        assert_eq!(back.min_latency_ms, result.min_latency_ms);
        assert_eq!(back.max_latency_ms, result.max_latency_ms);
        assert_eq!(back.p50_ms, result.p50_ms);
        assert_eq!(back.p95_ms, result.p95_ms);
        assert_eq!(back.p99_ms, result.p99_ms);
        assert_eq!(back.throughput_ops, result.throughput_ops);
        assert_eq!(back.memory_delta_bytes, result.memory_delta_bytes);
        assert_eq!(back.errors, result.errors);
        assert_eq!(back.percentiles, result.percentiles);
        assert_eq!(back.metadata, result.metadata);
    }
}
