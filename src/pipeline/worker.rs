//! Per-partition scan and classify pass.

use std::path::PathBuf;
use std::sync::Arc;

use crate::classify::{Classifier, Outcome, Tally};
use crate::config::Config;
use crate::error::Result;
use crate::io::RangeScanner;
use crate::partition::ByteRange;
use crate::pipeline::Metrics;
use crate::schema::Schema;

/// One worker's pass over one partition.
///
/// Runs synchronously on a dedicated OS thread: record classification is
/// CPU-bound parsing, so workers must not share an execution context. Each
/// task opens its own file handle and owns its report exclusively until the
/// aggregator collects it; the only shared state it touches is the
/// read-only schema and the atomic metrics counters.
pub struct WorkerTask {
    path: PathBuf,
    range: ByteRange,
    partition: usize,
    schema: Arc<Schema>,
    classifier: Classifier,
    metrics: Arc<Metrics>,
    read_buffer_bytes: usize,
}

impl WorkerTask {
    /// Create a worker for one partition.
    pub fn new(
        partition: usize,
        range: ByteRange,
        schema: Arc<Schema>,
        classifier: Classifier,
        metrics: Arc<Metrics>,
        config: &Config,
    ) -> Self {
        Self {
            path: config.input.path.clone(),
            range,
            partition,
            schema,
            classifier,
            metrics,
            read_buffer_bytes: config.processing.read_buffer_bytes,
        }
    }

    /// Scan the partition and produce its partial tally.
    ///
    /// Malformed lines (bad encoding, wrong field count, unparseable age)
    /// are skipped and counted; a single damaged line never loses the rest
    /// of the partition. Seek/read failures are fatal for the whole run.
    pub fn run(&self) -> Result<WorkerReport> {
        let mut scanner = RangeScanner::open(&self.path, self.range, self.read_buffer_bytes)?;
        let mut report = WorkerReport::new(self.partition);

        for line in &mut scanner {
            let line = line?;
            report.records_scanned += 1;
            self.metrics.add_record_scanned();

            let text = match std::str::from_utf8(&line.bytes) {
                Ok(text) => text,
                Err(_) => {
                    self.skip(&mut report, line.offset, "invalid utf-8");
                    continue;
                }
            };

            let record = match self.schema.split_record(text) {
                Some(record) => record,
                None => {
                    self.skip(&mut report, line.offset, "field count mismatch");
                    continue;
                }
            };

            match self.classifier.classify(&record) {
                Outcome::Counted(bucket) => {
                    report.tally.record(bucket);
                    self.metrics.add_record_counted();
                }
                Outcome::OutOfRange => {
                    report.records_out_of_range += 1;
                    self.metrics.add_record_out_of_range();
                }
                Outcome::Invalid => {
                    self.skip(&mut report, line.offset, "invalid record");
                }
            }
        }

        report.bytes_scanned = scanner.position().saturating_sub(self.range.start);
        self.metrics.add_bytes_scanned(report.bytes_scanned);
        self.metrics.add_partition_completed();

        tracing::debug!(
            "partition {} {} done: {} ({} scanned, {} skipped)",
            self.partition,
            self.range,
            report.tally,
            report.records_scanned,
            report.records_skipped
        );

        Ok(report)
    }

    fn skip(&self, report: &mut WorkerReport, offset: u64, reason: &str) {
        report.records_skipped += 1;
        self.metrics.add_record_skipped();
        tracing::debug!(
            "partition {}: skipping line at byte {}: {}",
            self.partition,
            offset,
            reason
        );
    }
}

/// A partition's partial tally plus its scan counters.
///
/// Immutable after production; ownership transfers to the aggregator.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WorkerReport {
    /// Partition index this report belongs to.
    pub partition: usize,

    /// Partial bucket counts for this partition.
    pub tally: Tally,

    /// Logical lines scanned.
    pub records_scanned: u64,

    /// Malformed lines skipped.
    pub records_skipped: u64,

    /// Records excluded by the age filter.
    pub records_out_of_range: u64,

    /// Bytes consumed, including the realignment discard and the
    /// straddling line's overshoot.
    pub bytes_scanned: u64,
}

impl WorkerReport {
    fn new(partition: usize) -> Self {
        Self {
            partition,
            tally: Tally::default(),
            records_scanned: 0,
            records_skipped: 0,
            records_out_of_range: 0,
            bytes_scanned: 0,
        }
    }
}
