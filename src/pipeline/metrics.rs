//! Throughput monitoring and metrics collection.
//!
//! Counters are observational only: the tally result is computed solely
//! from worker-owned state, so metrics never participate in the answer.

use serde::{Serialize, Serializer};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::sync::mpsc;
use tokio::time::interval;

fn serialize_duration<S>(duration: &Duration, serializer: S) -> Result<S::Ok, S::Error>
where
    S: Serializer,
{
    serializer.serialize_f64(duration.as_secs_f64())
}

/// Metrics for one aggregation run.
#[derive(Debug, Default)]
pub struct Metrics {
    /// Total bytes consumed by scanners (including realignment discards)
    pub bytes_scanned: AtomicU64,

    /// Logical lines read across all partitions
    pub records_scanned: AtomicU64,

    /// Records that passed the filter and landed in a bucket
    pub records_counted: AtomicU64,

    /// Malformed lines skipped (wrong arity, bad encoding, unparseable age)
    pub records_skipped: AtomicU64,

    /// Records excluded by the age filter
    pub records_out_of_range: AtomicU64,

    /// Partitions fully scanned
    pub partitions_completed: AtomicU64,

    /// Partitions aborted by a fatal error
    pub partitions_failed: AtomicU64,

    /// Start time
    start_time: Option<Instant>,
}

impl Metrics {
    /// Create new metrics.
    pub fn new() -> Arc<Self> {
        Arc::new(Self {
            start_time: Some(Instant::now()),
            ..Default::default()
        })
    }

    /// Record bytes consumed by a scanner.
    pub fn add_bytes_scanned(&self, bytes: u64) {
        self.bytes_scanned.fetch_add(bytes, Ordering::Relaxed);
    }

    /// Record one scanned line.
    pub fn add_record_scanned(&self) {
        self.records_scanned.fetch_add(1, Ordering::Relaxed);
    }

    /// Record one counted record.
    pub fn add_record_counted(&self) {
        self.records_counted.fetch_add(1, Ordering::Relaxed);
    }

    /// Record one malformed line skipped.
    pub fn add_record_skipped(&self) {
        self.records_skipped.fetch_add(1, Ordering::Relaxed);
    }

    /// Record one record excluded by the age filter.
    pub fn add_record_out_of_range(&self) {
        self.records_out_of_range.fetch_add(1, Ordering::Relaxed);
    }

    /// Record a fully scanned partition.
    pub fn add_partition_completed(&self) {
        self.partitions_completed.fetch_add(1, Ordering::Relaxed);
    }

    /// Record a partition aborted by a fatal error.
    pub fn add_partition_failed(&self) {
        self.partitions_failed.fetch_add(1, Ordering::Relaxed);
    }

    /// Get elapsed time since start.
    pub fn elapsed(&self) -> Duration {
        self.start_time.map_or(Duration::ZERO, |t| t.elapsed())
    }

    /// Scan throughput in MB/s.
    pub fn scan_throughput_mbps(&self) -> f64 {
        let bytes = self.bytes_scanned.load(Ordering::Relaxed);
        let elapsed = self.elapsed().as_secs_f64();
        if elapsed > 0.0 {
            (bytes as f64) / (1024.0 * 1024.0) / elapsed
        } else {
            0.0
        }
    }

    /// Records scanned per second.
    pub fn records_per_second(&self) -> f64 {
        let records = self.records_scanned.load(Ordering::Relaxed);
        let elapsed = self.elapsed().as_secs_f64();
        if elapsed > 0.0 {
            records as f64 / elapsed
        } else {
            0.0
        }
    }

    /// Get a snapshot of current metrics.
    pub fn snapshot(&self) -> MetricsSnapshot {
        MetricsSnapshot {
            bytes_scanned: self.bytes_scanned.load(Ordering::Relaxed),
            records_scanned: self.records_scanned.load(Ordering::Relaxed),
            records_counted: self.records_counted.load(Ordering::Relaxed),
            records_skipped: self.records_skipped.load(Ordering::Relaxed),
            records_out_of_range: self.records_out_of_range.load(Ordering::Relaxed),
            partitions_completed: self.partitions_completed.load(Ordering::Relaxed),
            partitions_failed: self.partitions_failed.load(Ordering::Relaxed),
            elapsed: self.elapsed(),
            scan_throughput_mbps: self.scan_throughput_mbps(),
            records_per_second: self.records_per_second(),
        }
    }
}

/// Snapshot of metrics at a point in time.
#[derive(Debug, Clone, Serialize)]
pub struct MetricsSnapshot {
    pub bytes_scanned: u64,
    pub records_scanned: u64,
    pub records_counted: u64,
    pub records_skipped: u64,
    pub records_out_of_range: u64,
    pub partitions_completed: u64,
    pub partitions_failed: u64,
    #[serde(serialize_with = "serialize_duration")]
    pub elapsed: Duration,
    pub scan_throughput_mbps: f64,
    pub records_per_second: f64,
}

impl MetricsSnapshot {
    /// Save metrics to a JSON file.
    pub fn save_to_file(&self, path: &str) -> anyhow::Result<()> {
        let json = serde_json::to_string_pretty(self)?;
        std::fs::write(path, json)?;
        tracing::info!("Metrics saved to {}", path);
        Ok(())
    }
}

impl std::fmt::Display for MetricsSnapshot {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "Records: {} scanned, {} counted, {} skipped, {} out of range | \
             Partitions: {} done, {} failed | \
             Scanned: {:.2} MB @ {:.2} MB/s | Rate: {:.0} rec/s | Elapsed: {:.1}s",
            self.records_scanned,
            self.records_counted,
            self.records_skipped,
            self.records_out_of_range,
            self.partitions_completed,
            self.partitions_failed,
            self.bytes_scanned as f64 / (1024.0 * 1024.0),
            self.scan_throughput_mbps,
            self.records_per_second,
            self.elapsed.as_secs_f64(),
        )
    }
}

/// Periodic metrics reporter.
pub struct MetricsReporter {
    metrics: Arc<Metrics>,
    interval_secs: u64,
    total_partitions: u64,
}

impl MetricsReporter {
    /// Create a new metrics reporter.
    pub fn new(metrics: Arc<Metrics>, interval_secs: u64, total_partitions: u64) -> Self {
        Self {
            metrics,
            interval_secs,
            total_partitions,
        }
    }

    /// Start the periodic reporter.
    pub async fn run(self, mut shutdown: mpsc::Receiver<()>) {
        let mut ticker = interval(Duration::from_secs(self.interval_secs));

        loop {
            tokio::select! {
                _ = ticker.tick() => {
                    let snapshot = self.metrics.snapshot();
                    let progress = if self.total_partitions > 0 {
                        (snapshot.partitions_completed + snapshot.partitions_failed) as f64
                            / self.total_partitions as f64
                            * 100.0
                    } else {
                        0.0
                    };

                    tracing::info!("[{:.1}%] {}", progress, snapshot);
                }
                _ = shutdown.recv() => {
                    let snapshot = self.metrics.snapshot();
                    tracing::info!("Final: {}", snapshot);
                    break;
                }
            }
        }
    }

    /// Print a final summary.
    pub fn print_summary(&self) {
        let snapshot = self.metrics.snapshot();

        println!("\n=== Aggregation Summary ===");
        println!("Total time: {:.3}s", snapshot.elapsed.as_secs_f64());
        println!("Records scanned: {}", snapshot.records_scanned);
        println!("Records counted: {}", snapshot.records_counted);
        println!("Records skipped: {}", snapshot.records_skipped);
        println!("Records out of range: {}", snapshot.records_out_of_range);
        println!("Partitions completed: {}", snapshot.partitions_completed);
        println!("Partitions failed: {}", snapshot.partitions_failed);
        println!(
            "Data scanned: {:.2} MB",
            snapshot.bytes_scanned as f64 / (1024.0 * 1024.0)
        );
        println!("Scan throughput: {:.2} MB/s", snapshot.scan_throughput_mbps);
        println!("Processing rate: {:.0} records/s", snapshot.records_per_second);
        println!("===========================\n");
    }
}
