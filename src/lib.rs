//! Parallel range-partitioned aggregation over delimited-text files.
//!
//! Given a large delimited file and a worker count, the pipeline splits the
//! file into contiguous byte ranges, scans each range on its own OS thread,
//! classifies records into gender buckets filtered by an age range, and
//! merges the per-worker tallies into one global result.
//!
//! # Architecture
//!
//! The pipeline consists of:
//!
//! - **Schema**: Header fields parsed once from the file head and broadcast
//!   read-only to every worker
//! - **Partition**: Byte-range planning that tiles the file exactly
//! - **I/O**: Per-worker buffered scanning with line-boundary realignment
//! - **Classify**: Pure record classification and tally accumulation
//! - **Pipeline**: Concurrent worker dispatch, reduction, and metrics
//!
//! # Usage
//!
//! ```no_run
//! use rowtally::{run_pipeline, Config};
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     let config = Config::for_input("people.csv".into(), 18.0, 65.0, 4);
//!     let report = run_pipeline(config).await?;
//!     println!("{}", report.tally);
//!     Ok(())
//! }
//! ```

pub mod classify;
pub mod config;
pub mod error;
pub mod io;
pub mod partition;
pub mod pipeline;
pub mod schema;

pub use classify::{Bucket, Classifier, Outcome, Tally};
pub use config::Config;
pub use error::Error;
pub use partition::{plan_partitions, ByteRange};
pub use pipeline::{Aggregator, Metrics, PipelineReport};
pub use schema::{Record, Schema};

use std::path::Path;
use std::sync::Arc;

use crate::error::Result;

/// Run the full aggregation pipeline with the given configuration.
pub async fn run_pipeline(config: Config) -> Result<PipelineReport> {
    // Validate configuration before any work starts
    config.validate()?;

    let config = Arc::new(config);

    // The input must be a regular file, checked once before partitioning
    let path = &config.input.path;
    let file_size = match std::fs::metadata(path) {
        Ok(meta) if meta.is_file() => meta.len(),
        _ => return Err(Error::FileNotFound(path.clone())),
    };

    tracing::info!("Input: {} ({} bytes)", path.display(), file_size);

    // The schema is parsed exactly once, from the true file head, and
    // broadcast to every worker. Workers never infer a schema from their
    // own slice of the file.
    let schema = Arc::new(Schema::read_header(path, config.input.delimiter)?);
    tracing::info!(
        "Schema: {} fields ({})",
        schema.len(),
        schema.fields().join(", ")
    );

    let ranges = plan_partitions(file_size, config.processing.workers)?;
    let metrics = Metrics::new();

    let aggregator = Aggregator::new(config.clone(), schema, ranges, metrics);
    let report = aggregator.run().await?;

    tracing::info!("Aggregation complete: {}", report);

    Ok(report)
}

/// Aggregate one file with default settings: the collaborator contract for
/// the CLI and timing layers.
///
/// Fails with [`Error::FileNotFound`] before any partitioning begins if
/// `path` does not reference a regular file, and with
/// [`Error::InvalidConfig`] if `worker_count` is zero. Periodic metrics
/// reporting is disabled; callers wanting observability use
/// [`run_pipeline`] with a full [`Config`].
pub async fn run(
    path: impl AsRef<Path>,
    min_age: f64,
    max_age: f64,
    worker_count: usize,
) -> Result<Tally> {
    let mut config = Config::for_input(
        path.as_ref().to_path_buf(),
        min_age,
        max_age,
        worker_count,
    );
    config.processing.enable_metrics = false;

    Ok(run_pipeline(config).await?.tally)
}

/// Build a Tokio runtime with the specified configuration.
pub fn build_runtime(worker_threads: Option<usize>) -> Result<tokio::runtime::Runtime> {
    let mut builder = tokio::runtime::Builder::new_multi_thread();

    if let Some(threads) = worker_threads {
        builder.worker_threads(threads);
    }

    builder.enable_all();

    Ok(builder.build()?)
}
