//! Error taxonomy for the aggregation engine.
//!
//! Fatal errors abort the whole run before or during scanning. Malformed
//! records are deliberately NOT represented here: a line that fails to parse
//! is skipped and counted by the worker, never propagated.

use std::path::PathBuf;
use thiserror::Error;

/// Errors that abort an aggregation run.
#[derive(Debug, Error)]
pub enum Error {
    /// Configuration rejected before any work starts.
    #[error("invalid configuration: {0}")]
    InvalidConfig(String),

    /// Input path does not reference a regular file. Checked once upfront,
    /// before any partitioning.
    #[error("input file not found: {0}")]
    FileNotFound(PathBuf),

    /// Seek or read failure mid-scan. Not retried: local file access has no
    /// transient-fault assumption.
    #[error("I/O failure during scan: {0}")]
    Io(#[from] std::io::Error),

    /// A worker thread panicked. Peers are allowed to finish; their results
    /// are discarded.
    #[error("worker for partition {partition} panicked")]
    WorkerPanic { partition: usize },
}

/// Convenience alias used throughout the engine.
pub type Result<T, E = Error> = std::result::Result<T, E>;
