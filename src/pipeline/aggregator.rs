//! Fan-out of workers across partitions and reduction of their tallies.

use std::sync::Arc;

use futures::future::join_all;
use serde::Serialize;
use tokio::sync::mpsc;

use crate::classify::{Classifier, Tally};
use crate::config::Config;
use crate::error::{Error, Result};
use crate::partition::ByteRange;
use crate::pipeline::{Metrics, MetricsReporter, WorkerReport, WorkerTask};
use crate::schema::Schema;

/// Runs one worker per partition and reduces their partial tallies.
pub struct Aggregator {
    config: Arc<Config>,
    schema: Arc<Schema>,
    ranges: Vec<ByteRange>,
    metrics: Arc<Metrics>,
}

impl Aggregator {
    /// Create an aggregator over a planned set of partitions.
    pub fn new(
        config: Arc<Config>,
        schema: Arc<Schema>,
        ranges: Vec<ByteRange>,
        metrics: Arc<Metrics>,
    ) -> Self {
        Self {
            config,
            schema,
            ranges,
            metrics,
        }
    }

    /// Run all workers to completion and merge their reports.
    ///
    /// Workers run on dedicated blocking threads with no shared mutable
    /// state; the single synchronization point is the join below. There is
    /// no cancellation: when one worker fails, already-running peers finish
    /// and their results are discarded, then the first fatal error is
    /// surfaced.
    pub async fn run(&self) -> Result<PipelineReport> {
        let total_partitions = self.ranges.len();
        let classifier = Classifier::new(
            &self.schema,
            self.config.filter.min_age,
            self.config.filter.max_age,
        );

        tracing::info!(
            "Dispatching {} partitions ({} bytes each, last absorbs remainder)",
            total_partitions,
            self.ranges.first().map_or(0, |r| r.len()),
        );

        // Start metrics reporter if enabled
        let (shutdown_tx, shutdown_rx) = mpsc::channel::<()>(1);
        let reporter_handle = if self.config.processing.enable_metrics {
            let reporter = MetricsReporter::new(
                self.metrics.clone(),
                self.config.processing.metrics_interval_secs,
                total_partitions as u64,
            );
            Some(tokio::spawn(reporter.run(shutdown_rx)))
        } else {
            drop(shutdown_rx);
            None
        };

        // One blocking task per partition: classification is CPU-bound, so
        // each worker gets its own OS thread and its own file handle.
        let handles: Vec<_> = self
            .ranges
            .iter()
            .copied()
            .enumerate()
            .map(|(partition, range)| {
                let task = WorkerTask::new(
                    partition,
                    range,
                    self.schema.clone(),
                    classifier.clone(),
                    self.metrics.clone(),
                    &self.config,
                );
                tokio::task::spawn_blocking(move || task.run())
            })
            .collect();

        let joined = join_all(handles).await;

        // Shutdown metrics reporter
        let _ = shutdown_tx.send(()).await;
        if let Some(handle) = reporter_handle {
            let _ = handle.await;
        }

        let mut reports = Vec::with_capacity(total_partitions);
        let mut first_error: Option<Error> = None;
        for (partition, joined_result) in joined.into_iter().enumerate() {
            match joined_result {
                Ok(Ok(report)) => reports.push(report),
                Ok(Err(e)) => {
                    self.metrics.add_partition_failed();
                    tracing::error!("partition {} failed: {}", partition, e);
                    first_error.get_or_insert(e);
                }
                Err(_) => {
                    self.metrics.add_partition_failed();
                    tracing::error!("partition {} worker panicked", partition);
                    first_error.get_or_insert(Error::WorkerPanic { partition });
                }
            }
        }

        // Partial results are never returned.
        if let Some(e) = first_error {
            return Err(e);
        }

        // Print final summary and optionally save metrics to file
        if self.config.processing.enable_metrics {
            let reporter = MetricsReporter::new(
                self.metrics.clone(),
                self.config.processing.metrics_interval_secs,
                total_partitions as u64,
            );
            reporter.print_summary();

            if let Some(ref path) = self.config.processing.metrics_output_path {
                let snapshot = self.metrics.snapshot();
                if let Err(e) = snapshot.save_to_file(path) {
                    tracing::warn!("Failed to save metrics to {}: {}", path, e);
                }
            }
        }

        Ok(reduce(total_partitions, &reports))
    }
}

/// Merge per-partition reports into the final result. Bucket sums are
/// commutative and associative, so the outcome does not depend on worker
/// completion order.
fn reduce(partitions: usize, reports: &[WorkerReport]) -> PipelineReport {
    let mut out = PipelineReport {
        tally: Tally::default(),
        partitions,
        records_scanned: 0,
        records_skipped: 0,
        records_out_of_range: 0,
        bytes_scanned: 0,
    };

    for report in reports {
        out.tally.merge(report.tally);
        out.records_scanned += report.records_scanned;
        out.records_skipped += report.records_skipped;
        out.records_out_of_range += report.records_out_of_range;
        out.bytes_scanned += report.bytes_scanned;
    }

    out
}

/// Final result of an aggregation run.
#[derive(Debug, Clone, Serialize)]
pub struct PipelineReport {
    /// Global bucket counts (element-wise sum of all partial tallies).
    pub tally: Tally,

    /// Number of partitions scanned.
    pub partitions: usize,

    /// Logical lines scanned across all partitions.
    pub records_scanned: u64,

    /// Malformed lines skipped across all partitions.
    pub records_skipped: u64,

    /// Records excluded by the age filter.
    pub records_out_of_range: u64,

    /// Bytes consumed across all partitions.
    pub bytes_scanned: u64,
}

impl std::fmt::Display for PipelineReport {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "{} | scanned: {}, skipped: {}, out of range: {}, partitions: {}",
            self.tally,
            self.records_scanned,
            self.records_skipped,
            self.records_out_of_range,
            self.partitions
        )
    }
}
