// SPDX-License-Identifier: Apache-2.0
// Copyright 2025 Cachemark Contributors

//! Cachemark CLI
//!
//! Runs the full cache benchmark battery against Redis and Memcached and
//! emits the comparison report.

use std::path::PathBuf;

use clap::Parser;

use cachemark_core::{report, BenchConfig, BenchmarkEngine, ReportWriter};

/// Cachemark - latency, throughput, and memory benchmarks for cache backends
#[derive(Parser)]
#[command(name = "cachemark")]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Timed iterations per scenario
    #[arg(short, long)]
    iterations: Option<u64>,

    /// Extra worker count appended to the concurrency sweep
    #[arg(long)]
    concurrency: Option<usize>,

    /// Output directory for report files
    #[arg(short, long)]
    output: Option<PathBuf>,

    /// Alternate YAML configuration file
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Quick mode (caps iterations at 10)
    #[arg(long)]
    quick: bool,

    /// Enable verbose logging
    #[arg(short, long)]
    verbose: bool,
}

fn resolve_config(args: &Args) -> anyhow::Result<BenchConfig> {
    let mut config = match &args.config {
        Some(path) => BenchConfig::from_yaml_file(path)?,
        None => BenchConfig::default(),
    };

    if let Some(iterations) = args.iterations {
        if iterations == 0 {
            anyhow::bail!("--iterations must be at least 1");
        }
        config.iterations = iterations;
    }
    if args.quick {
        config.iterations = config.iterations.min(10);
    }
    if let Some(level) = args.concurrency {
        if level == 0 {
            anyhow::bail!("--concurrency must be at least 1");
        }
        if !config.concurrency_levels.contains(&level) {
            config.concurrency_levels.push(level);
        }
    }
    if let Some(output) = &args.output {
        config.output_dir = output.clone();
    }

    Ok(config)
}

fn main() -> anyhow::Result<()> {
    let args = Args::parse();

    // Initialize logging
    let log_level = if args.verbose { "debug" } else { "info" };
    tracing_subscriber::fmt().with_env_filter(log_level).init();

    let config = resolve_config(&args)?;

    println!("Cachemark Benchmark Suite");
    println!("=========================");
    println!("Iterations: {}", config.iterations);
    println!(
        "Redis: {}:{}  Memcached: {}:{}",
        config.redis.host, config.redis.port, config.memcached.host, config.memcached.port
    );
    println!("Output directory: {:?}", config.output_dir);
    println!();

    let writer = ReportWriter::new(&config.output_dir)?;

    let mut engine = BenchmarkEngine::new(config)?;

    // Backends must be flushed exactly once even when a scenario or the
    // report save fails, so the outcome is captured and cleanup runs first.
    let outcome = run_and_save(&mut engine, &writer);
    engine.cleanup();
    outcome
}

fn run_and_save(engine: &mut BenchmarkEngine, writer: &ReportWriter) -> anyhow::Result<()> {
    let results = engine.run_all()?.to_vec();

    let report_text = report::generate(&results);
    println!("{}", report_text);

    let (text_path, json_path) = writer.save(&report_text, &results)?;
    println!("Report saved to: {:?}", text_path);
    println!("Raw results saved to: {:?}", json_path);

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use cachemark_core::{BackendKind, CacheAdapter, InMemoryStore};
    use tempfile::TempDir;

    fn memory_engine() -> BenchmarkEngine {
        let config = BenchConfig {
            iterations: 5,
            ..BenchConfig::default()
        };
        let adapters = vec![
            CacheAdapter::new(BackendKind::Memory, Box::new(InMemoryStore::new())),
            CacheAdapter::new(BackendKind::Memory, Box::new(InMemoryStore::new())),
        ];
        BenchmarkEngine::with_adapters(config, adapters)
    }

    #[test]
    fn test_cleanup_still_runs_after_save_failure() {
        let dir = TempDir::new().unwrap();
        let writer = ReportWriter::new(dir.path()).unwrap();
        // Yank the output directory away so saving the report must fail.
        std::fs::remove_dir_all(dir.path()).unwrap();

        let mut engine = memory_engine();
        let outcome = run_and_save(&mut engine, &writer);
        assert!(outcome.is_err());

        // The engine survives the failure and is cleaned up exactly once.
        assert!(!engine.results().is_empty());
        engine.cleanup();
    }

    #[test]
    fn test_run_and_save_writes_both_files() {
        let dir = TempDir::new().unwrap();
        let writer = ReportWriter::new(dir.path()).unwrap();

        let mut engine = memory_engine();
        run_and_save(&mut engine, &writer).unwrap();
        engine.cleanup();

        let files: Vec<_> = std::fs::read_dir(dir.path()).unwrap().collect();
        assert_eq!(files.len(), 2);
    }
}
