// SPDX-License-Identifier: Apache-2.0
// Copyright 2025 Cachemark Contributors

//! Cachemark Core Library
//!
//! Benchmark engine for comparing key-value cache backends. Provides the
//! statistics primitives, backend capability adapters, scenario battery,
//! result model, and report generation; the `cachemark` binary wires them
//! to a CLI.

pub mod adapter;
pub mod backend;
pub mod config;
pub mod engine;
pub mod error;
pub mod report;
pub mod result;
pub mod stats;

// Re-export commonly used types
pub use adapter::CacheAdapter;
pub use backend::{BackendKind, CacheConnection, InMemoryStore};
pub use config::{BenchConfig, ConnectionParams, PayloadSizes};
pub use engine::BenchmarkEngine;
pub use error::{BenchError, BenchResult, ConfigError, ConnectionError, OperationError};
pub use report::{ReportWriter, SystemInfo};
pub use result::BenchmarkResult;
