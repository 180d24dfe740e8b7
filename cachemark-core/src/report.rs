// SPDX-License-Identifier: Apache-2.0
// Copyright 2025 Cachemark Contributors

//! Report generation for accumulated benchmark results.
//!
//! Renders three sections in fixed order: summary, detailed results, and a
//! head-to-head comparison per operation, then persists the report as a
//! timestamped text/JSON pair.

use std::collections::BTreeMap;
use std::fmt::Write as _;
use std::fs::{self, File};
use std::io::{BufWriter, Write as _};
use std::path::{Path, PathBuf};

use chrono::Utc;
use serde::{Deserialize, Serialize};
use sysinfo::System;

use crate::error::ReportError;
use crate::result::BenchmarkResult;

/// Host information captured into the report header.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SystemInfo {
    pub os: String,
    pub os_version: String,
    pub kernel_version: Option<String>,
    pub cpu_model: String,
    pub cpu_cores: usize,
    pub memory_bytes: u64,
    pub hostname: String,
}

impl SystemInfo {
    pub fn collect() -> Self {
        let mut sys = System::new_all();
        sys.refresh_all();

        Self {
            os: System::name().unwrap_or_else(|| "Unknown".to_string()),
            os_version: System::os_version().unwrap_or_else(|| "Unknown".to_string()),
            kernel_version: System::kernel_version(),
            cpu_model: sys
                .cpus()
                .first()
                .map(|cpu| cpu.brand().to_string())
                .unwrap_or_else(|| "Unknown".to_string()),
            cpu_cores: sys.cpus().len(),
            memory_bytes: sys.total_memory(),
            hostname: System::host_name().unwrap_or_else(|| "Unknown".to_string()),
        }
    }
}

/// Render the full text report: Summary, Detailed, Comparison.
pub fn generate(results: &[BenchmarkResult]) -> String {
    let mut out = String::new();

    let info = SystemInfo::collect();
    let _ = writeln!(out, "==========================================================");
    let _ = writeln!(out, " CACHE BENCHMARK REPORT");
    let _ = writeln!(out, " generated: {}", Utc::now().format("%Y-%m-%d %H:%M:%S UTC"));
    let _ = writeln!(
        out,
        " host: {} ({} {}), {} x {}, {} MB RAM",
        info.hostname,
        info.os,
        info.os_version,
        info.cpu_cores,
        info.cpu_model,
        info.memory_bytes / (1024 * 1024)
    );
    let _ = writeln!(out, "==========================================================");
    out.push('\n');

    write_summary(&mut out, results);
    write_detailed(&mut out, results);
    write_comparison(&mut out, results);

    out
}

fn write_summary(out: &mut String, results: &[BenchmarkResult]) {
    let mut per_backend: BTreeMap<&str, usize> = BTreeMap::new();
    for result in results {
        *per_backend.entry(result.backend.as_str()).or_default() += 1;
    }

    let _ = writeln!(out, "SUMMARY");
    let _ = writeln!(out, "-------");
    let _ = writeln!(out, "total results: {}", results.len());
    for (backend, count) in per_backend {
        let _ = writeln!(out, "  {}: {}", backend, count);
    }
    out.push('\n');
}

fn write_detailed(out: &mut String, results: &[BenchmarkResult]) {
    let _ = writeln!(out, "DETAILED RESULTS");
    let _ = writeln!(out, "----------------");
    for result in results {
        let _ = writeln!(out, "{} [{}]", result.operation, result.backend);
        let _ = writeln!(out, "  iterations:     {}", result.iterations);
        let _ = writeln!(out, "  total time:     {:.3} ms", result.total_time_ms);
        let _ = writeln!(out, "  avg latency:    {:.4} ms", result.avg_latency_ms);
        let _ = writeln!(out, "  min latency:    {:.4} ms", result.min_latency_ms);
        let _ = writeln!(out, "  max latency:    {:.4} ms", result.max_latency_ms);
        let _ = writeln!(out, "  p50:            {:.4} ms", result.p50_ms);
        let _ = writeln!(out, "  p95:            {:.4} ms", result.p95_ms);
        let _ = writeln!(out, "  p99:            {:.4} ms", result.p99_ms);
        let _ = writeln!(out, "  throughput:     {} ops/sec", result.throughput_ops);
        let _ = writeln!(out, "  memory delta:   {} bytes", result.memory_delta_bytes);
        let _ = writeln!(out, "  errors:         {}", result.errors);
        if !result.metadata.is_empty() {
            let _ = writeln!(out, "  metadata:");
            for (key, value) in &result.metadata {
                let _ = writeln!(out, "    {}: {}", key, value);
            }
        }
        out.push('\n');
    }
}

fn write_comparison(out: &mut String, results: &[BenchmarkResult]) {
    let _ = writeln!(out, "COMPARISON");
    let _ = writeln!(out, "----------");

    // Group in first-seen order so output is stable across runs.
    let mut order: Vec<&str> = Vec::new();
    let mut groups: BTreeMap<&str, Vec<&BenchmarkResult>> = BTreeMap::new();
    for result in results {
        let entry = groups.entry(result.operation.as_str()).or_default();
        if entry.is_empty() {
            order.push(result.operation.as_str());
        }
        entry.push(result);
    }

    for operation in order {
        let group = &groups[operation];
        if group.len() < 2 {
            continue;
        }

        let _ = writeln!(out, "{}", operation);
        for result in group {
            let _ = writeln!(
                out,
                "  {:<12} avg {:.4} ms | {} ops/sec | mem {:+} bytes",
                result.backend.as_str(),
                result.avg_latency_ms,
                result.throughput_ops,
                result.memory_delta_bytes
            );
        }

        let latency_winner = select_winner(group, |r| r.avg_latency_ms, true);
        let latency_gain = improvement(group, latency_winner, |r| r.avg_latency_ms, true);
        let _ = writeln!(
            out,
            "  fastest:    {} ({:.1}% lower avg latency)",
            group[latency_winner].backend.as_str(),
            latency_gain
        );

        let throughput_winner = select_winner(group, |r| r.throughput_ops as f64, false);
        let throughput_gain =
            improvement(group, throughput_winner, |r| r.throughput_ops as f64, false);
        let _ = writeln!(
            out,
            "  highest tp: {} ({:.1}% higher throughput)",
            group[throughput_winner].backend.as_str(),
            throughput_gain
        );
        out.push('\n');
    }
}

/// Index of the winning result; on ties the first one encountered in
/// insertion order wins.
fn select_winner<F>(group: &[&BenchmarkResult], metric: F, lower_is_better: bool) -> usize
where
    F: Fn(&BenchmarkResult) -> f64,
{
    let mut winner = 0;
    for (idx, result) in group.iter().enumerate().skip(1) {
        let value = metric(result);
        let best = metric(group[winner]);
        let better = if lower_is_better {
            value < best
        } else {
            value > best
        };
        if better {
            winner = idx;
        }
    }
    winner
}

/// Percentage improvement of the winner over the mean of the other group
/// members; 0 when that mean is 0.
fn improvement<F>(group: &[&BenchmarkResult], winner: usize, metric: F, lower_is_better: bool) -> f64
where
    F: Fn(&BenchmarkResult) -> f64,
{
    let others: Vec<f64> = group
        .iter()
        .enumerate()
        .filter(|(idx, _)| *idx != winner)
        .map(|(_, r)| metric(r))
        .collect();
    if others.is_empty() {
        return 0.0;
    }

    let others_mean = others.iter().sum::<f64>() / others.len() as f64;
    if others_mean == 0.0 {
        return 0.0;
    }

    let winner_value = metric(group[winner]);
    if lower_is_better {
        (others_mean - winner_value) / others_mean * 100.0
    } else {
        (winner_value - others_mean) / others_mean * 100.0
    }
}

/// Persists reports into an output directory as a timestamped pair of
/// files: the rendered text report and a JSON dump of the raw results.
pub struct ReportWriter {
    output_dir: PathBuf,
}

impl ReportWriter {
    pub fn new(output_dir: impl AsRef<Path>) -> Result<Self, ReportError> {
        let output_dir = output_dir.as_ref().to_path_buf();
        fs::create_dir_all(&output_dir)?;
        Ok(Self { output_dir })
    }

    /// Write both files and return their paths (text, json).
    pub fn save(
        &self,
        report_text: &str,
        results: &[BenchmarkResult],
    ) -> Result<(PathBuf, PathBuf), ReportError> {
        let timestamp = Utc::now().format("%Y-%m-%dT%H-%M-%SZ");

        let text_path = self.output_dir.join(format!("cachemark_{}.txt", timestamp));
        let mut text_file = BufWriter::new(File::create(&text_path)?);
        text_file.write_all(report_text.as_bytes())?;
        text_file.flush()?;

        let json_path = self.output_dir.join(format!("cachemark_{}.json", timestamp));
        let json_file = BufWriter::new(File::create(&json_path)?);
        serde_json::to_writer_pretty(json_file, results)?;

        Ok((text_path, json_path))
    }

    /// All JSON result dumps currently in the output directory, sorted.
    pub fn list_reports(&self) -> Result<Vec<PathBuf>, ReportError> {
        let mut reports = Vec::new();
        for entry in fs::read_dir(&self.output_dir)? {
            let path = entry?.path();
            if path.extension().map(|e| e == "json").unwrap_or(false) {
                reports.push(path);
            }
        }
        reports.sort();
        Ok(reports)
    }

    /// Load a previously saved JSON result dump.
    pub fn load(path: impl AsRef<Path>) -> Result<Vec<BenchmarkResult>, ReportError> {
        let file = File::open(path)?;
        let results = serde_json::from_reader(file)?;
        Ok(results)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::backend::BackendKind;
    use tempfile::TempDir;

    fn result(operation: &str, backend: BackendKind, avg: f64, tp: u64) -> BenchmarkResult {
        let mut r = BenchmarkResult::from_samples(operation, backend, &[avg], avg, 0, 0);
        r.throughput_ops = tp;
        r
    }

    #[test]
    fn test_sections_in_order() {
        let results = vec![
            result("SET_small", BackendKind::Redis, 1.0, 1000),
            result("SET_small", BackendKind::Memcached, 2.0, 500),
        ];
        let report = generate(&results);

        let summary = report.find("SUMMARY").unwrap();
        let detailed = report.find("DETAILED RESULTS").unwrap();
        let comparison = report.find("COMPARISON").unwrap();
        assert!(summary < detailed);
        assert!(detailed < comparison);
    }

    #[test]
    fn test_summary_counts_by_backend() {
        let results = vec![
            result("SET_small", BackendKind::Redis, 1.0, 1000),
            result("SET_small", BackendKind::Memcached, 2.0, 500),
            result("GET_small", BackendKind::Redis, 1.0, 1000),
        ];
        let report = generate(&results);
        assert!(report.contains("total results: 3"));
        assert!(report.contains("redis: 2"));
        assert!(report.contains("memcached: 1"));
    }

    #[test]
    fn test_comparison_winners() {
        let results = vec![
            result("SET_small", BackendKind::Redis, 1.0, 2000),
            result("SET_small", BackendKind::Memcached, 2.0, 1000),
        ];
        let report = generate(&results);

        // Redis: 50% lower latency than the other mean (2.0), 100% higher
        // throughput than the other mean (1000).
        assert!(report.contains("fastest:    redis (50.0% lower avg latency)"));
        assert!(report.contains("highest tp: redis (100.0% higher throughput)"));
    }

    #[test]
    fn test_singleton_groups_excluded_from_comparison() {
        let results = vec![result("SET_only_once", BackendKind::Redis, 1.0, 100)];
        let report = generate(&results);
        let comparison = &report[report.find("COMPARISON").unwrap()..];
        assert!(!comparison.contains("SET_only_once"));
    }

    #[test]
    fn test_tie_break_prefers_first_inserted() {
        let group_results = vec![
            result("SET_small", BackendKind::Memcached, 1.0, 1000),
            result("SET_small", BackendKind::Redis, 1.0, 1000),
        ];
        let refs: Vec<&BenchmarkResult> = group_results.iter().collect();
        assert_eq!(select_winner(&refs, |r| r.avg_latency_ms, true), 0);
        assert_eq!(select_winner(&refs, |r| r.throughput_ops as f64, false), 0);
    }

    #[test]
    fn test_improvement_zero_when_other_mean_is_zero() {
        let group_results = vec![
            result("GET_x", BackendKind::Redis, 1.0, 100),
            result("GET_x", BackendKind::Memcached, 0.0, 0),
        ];
        let refs: Vec<&BenchmarkResult> = group_results.iter().collect();
        // Memcached wins latency with 0.0 but the other mean is 1.0; the
        // degenerate case is the throughput winner vs an all-zero rest.
        assert_eq!(improvement(&refs, 0, |r| r.throughput_ops as f64, false), 0.0);
    }

    #[test]
    fn test_writer_saves_and_loads() {
        let dir = TempDir::new().unwrap();
        let writer = ReportWriter::new(dir.path()).unwrap();
        let results = vec![result("SET_small", BackendKind::Redis, 1.0, 1000)];

        let (text_path, json_path) = writer.save("report body", &results).unwrap();
        assert!(text_path.exists());
        assert!(json_path.exists());

        let loaded = ReportWriter::load(&json_path).unwrap();
        assert_eq!(loaded.len(), 1);
        assert_eq!(loaded[0].operation, "SET_small");

        assert_eq!(writer.list_reports().unwrap(), vec![json_path]);
    }
}
