// SPDX-License-Identifier: Apache-2.0
// Copyright 2025 Cachemark Contributors

//! Custom error types for Cachemark.
//!
//! This module defines explicit enum error types as per coding guidelines.
//! No `Box<dyn Error>`, no `anyhow::Result` - all errors are strongly typed.

use std::path::PathBuf;

use thiserror::Error;

/// Top-level error type for the benchmark suite.
/// All errors are explicit variants - no catch-all or generic handling.
#[derive(Debug, Error)]
pub enum BenchError {
    #[error("connection error: {0}")]
    Connection(#[from] ConnectionError),

    #[error("configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("report error: {0}")]
    Report(#[from] ReportError),

    #[error("iteration count must be at least 1")]
    ZeroIterations,

    #[error("IO error: {context} - {source}")]
    Io {
        context: &'static str,
        #[source]
        source: std::io::Error,
    },
}

/// Fatal connection-establishment errors.
///
/// These only occur while constructing an adapter; they are surfaced
/// immediately and never retried. Per-operation failures after a
/// connection is up are [`OperationError`]s instead.
#[derive(Debug, Error)]
pub enum ConnectionError {
    #[error("invalid {backend} address: {message}")]
    InvalidAddress {
        backend: &'static str,
        message: String,
    },

    #[error("{backend} unreachable at {host}:{port}: {message}")]
    Unreachable {
        backend: &'static str,
        host: String,
        port: u16,
        message: String,
    },

    #[error("{backend} handshake failed: {message}")]
    Handshake {
        backend: &'static str,
        message: String,
    },
}

/// Recoverable per-operation failures.
///
/// Absorbed at the engine boundary: the adapter increments its error
/// counter and a failing call never aborts a timed batch in progress.
#[derive(Debug, Error)]
pub enum OperationError {
    #[error("{backend} command failed: {message}")]
    Command {
        backend: &'static str,
        message: String,
    },

    #[error("{backend} returned an unexpected reply: {message}")]
    Decode {
        backend: &'static str,
        message: String,
    },
}

/// Configuration errors prevent the benchmark from starting.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("configuration file not found: {path:?}")]
    NotFound { path: PathBuf },

    #[error("configuration parse error: {message}")]
    Parse { message: String },

    #[error("invalid field value: {field} = {value} - {reason}")]
    InvalidFieldValue {
        field: &'static str,
        value: String,
        reason: String,
    },
}

/// Errors that can occur while rendering or persisting reports.
#[derive(Debug, Error)]
pub enum ReportError {
    #[error("failed to write report: {0}")]
    Io(#[from] std::io::Error),

    #[error("failed to serialize results: {0}")]
    Serialization(#[from] serde_json::Error),
}

/// Result type alias using BenchError.
pub type BenchResult<T> = Result<T, BenchError>;
