// SPDX-License-Identifier: Apache-2.0
// Copyright 2025 Cachemark Contributors

//! Pure statistics and workload-generation helpers.
//!
//! Everything here is stateless and total: malformed or empty input yields
//! zero-valued defaults rather than an error, so a statistics call can never
//! abort a benchmark run.

use std::collections::BTreeMap;

use rand::distributions::Alphanumeric;
use rand::seq::SliceRandom;
use rand::Rng;
use serde::{Deserialize, Serialize};

/// Tag for one step of a mixed read/write workload.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OpKind {
    Read,
    Write,
}

/// Fraction of a mixed workload that is reads.
const READ_RATIO: f64 = 0.8;

/// Compute the requested percentiles of `values` by linear interpolation
/// between closest ranks.
///
/// For percentile `p` the fractional rank is `(p/100) * (n-1)`; when it
/// falls between two sorted samples the result is interpolated linearly.
/// Percentiles above 100 clamp to the maximum sample. An empty input
/// yields an empty map.
pub fn percentiles(values: &[f64], requested: &[u32]) -> BTreeMap<u32, f64> {
    let mut table = BTreeMap::new();
    if values.is_empty() {
        return table;
    }

    let mut sorted = values.to_vec();
    sorted.sort_by(|a, b| a.partial_cmp(b).unwrap_or(std::cmp::Ordering::Equal));
    let n = sorted.len();

    for &p in requested {
        // Ranks past the last sample (p > 100) clamp to the maximum.
        let rank = ((p as f64 / 100.0) * (n - 1) as f64).min((n - 1) as f64);
        let lo = rank.floor() as usize;
        let hi = rank.ceil() as usize;
        let value = if lo == hi {
            sorted[lo]
        } else {
            sorted[lo] + (sorted[hi] - sorted[lo]) * (rank - lo as f64)
        };
        table.insert(p, value);
    }

    table
}

/// Completed operations per second of wall-clock time, floored.
/// Returns 0 for a non-positive time span.
pub fn throughput(op_count: u64, total_secs: f64) -> u64 {
    if total_secs <= 0.0 {
        return 0;
    }
    (op_count as f64 / total_secs) as u64
}

/// Population standard deviation (divide by n). Returns 0.0 for empty input.
pub fn std_dev(values: &[f64]) -> f64 {
    if values.is_empty() {
        return 0.0;
    }
    let n = values.len() as f64;
    let mean = values.iter().sum::<f64>() / n;
    let variance = values
        .iter()
        .map(|&x| {
            let diff = x - mean;
            diff * diff
        })
        .sum::<f64>()
        / n;
    variance.sqrt()
}

/// Standard deviation relative to the mean. Returns 0.0 when the input is
/// empty or the mean is 0.
pub fn coefficient_of_variation(values: &[f64]) -> f64 {
    if values.is_empty() {
        return 0.0;
    }
    let mean = values.iter().sum::<f64>() / values.len() as f64;
    if mean == 0.0 {
        return 0.0;
    }
    std_dev(values) / mean
}

/// Generate an alphanumeric payload of exactly `size_bytes` bytes.
pub fn synthetic_payload(size_bytes: usize) -> String {
    rand::thread_rng()
        .sample_iter(&Alphanumeric)
        .take(size_bytes)
        .map(char::from)
        .collect()
}

/// Generate a shuffled 80/20 read/write tag sequence of length `total_ops`.
///
/// The split is deterministic (`floor(total_ops * 0.8)` reads, the rest
/// writes) but the ordering is a uniform random permutation.
pub fn mixed_workload(total_ops: usize) -> Vec<OpKind> {
    let reads = (total_ops as f64 * READ_RATIO) as usize;
    let mut tags = Vec::with_capacity(total_ops);
    tags.resize(reads, OpKind::Read);
    tags.resize(total_ops, OpKind::Write);
    tags.shuffle(&mut rand::thread_rng());
    tags
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_percentiles_interpolation() {
        let values: Vec<f64> = (1..=10).map(|v| v as f64).collect();
        let table = percentiles(&values, &[50, 95, 99]);

        // Fractional ranks for n=10: p50 -> 4.5, p95 -> 8.55, p99 -> 8.91.
        assert_eq!(table[&50], 5.5);
        assert!((table[&95] - 9.55).abs() < 1e-9);
        assert!((table[&99] - 9.91).abs() < 1e-9);
    }

    #[test]
    fn test_percentiles_single_sample() {
        let table = percentiles(&[42.0], &[50, 95, 99]);
        assert_eq!(table[&50], 42.0);
        assert_eq!(table[&99], 42.0);
    }

    #[test]
    fn test_percentiles_empty() {
        assert!(percentiles(&[], &[50, 95, 99]).is_empty());
    }

    #[test]
    fn test_percentiles_above_hundred_clamp_to_max() {
        let table = percentiles(&[1.0, 2.0, 3.0], &[100, 150]);
        assert_eq!(table[&100], 3.0);
        assert_eq!(table[&150], 3.0);
    }

    #[test]
    fn test_percentiles_unsorted_input() {
        let table = percentiles(&[3.0, 1.0, 2.0], &[50]);
        assert_eq!(table[&50], 2.0);
    }

    #[test]
    fn test_throughput() {
        assert_eq!(throughput(1000, 2.0), 500);
        assert_eq!(throughput(1000, 0.0), 0);
        assert_eq!(throughput(1000, -1.0), 0);
        assert_eq!(throughput(999, 2.0), 499);
    }

    #[test]
    fn test_std_dev() {
        assert_eq!(std_dev(&[]), 0.0);
        assert!(std_dev(&[1.0, 2.0, 3.0, 4.0, 5.0]) > 0.0);
        // Population form: divide by n.
        assert!((std_dev(&[2.0, 4.0]) - 1.0).abs() < 1e-9);
    }

    #[test]
    fn test_coefficient_of_variation_zero_mean() {
        assert_eq!(coefficient_of_variation(&[0.0, 0.0, 0.0]), 0.0);
        assert_eq!(coefficient_of_variation(&[]), 0.0);
    }

    #[test]
    fn test_synthetic_payload_length_and_uniqueness() {
        let a = synthetic_payload(100);
        let b = synthetic_payload(100);
        assert_eq!(a.len(), 100);
        assert_eq!(b.len(), 100);
        assert!(a.chars().all(|c| c.is_ascii_alphanumeric()));
        assert_ne!(a, b);
    }

    #[test]
    fn test_mixed_workload_split() {
        let tags = mixed_workload(100);
        assert_eq!(tags.len(), 100);
        let reads = tags.iter().filter(|&&t| t == OpKind::Read).count();
        assert_eq!(reads, 80);
        assert_eq!(tags.len() - reads, 20);
    }

    #[test]
    fn test_mixed_workload_small_counts() {
        let tags = mixed_workload(3);
        let reads = tags.iter().filter(|&&t| t == OpKind::Read).count();
        // floor(3 * 0.8) = 2 reads, 1 write
        assert_eq!(reads, 2);
        assert!(mixed_workload(0).is_empty());
    }
}
