//! Partition planning: splitting a file into contiguous byte ranges.
//!
//! One range per worker. Ranges are half-open, non-overlapping, and tile
//! `[0, file_size)` exactly; the last range absorbs the division remainder,
//! so the final worker may cover a slightly larger span than the others.

use crate::error::{Error, Result};

/// A contiguous, half-open byte span `[start, stop)` assigned to one worker.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ByteRange {
    /// First byte owned by this partition.
    pub start: u64,

    /// One past the last byte owned by this partition.
    pub stop: u64,
}

impl ByteRange {
    /// Number of bytes in the range.
    pub fn len(&self) -> u64 {
        self.stop - self.start
    }

    /// Whether the range covers no bytes.
    pub fn is_empty(&self) -> bool {
        self.start == self.stop
    }
}

impl std::fmt::Display for ByteRange {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "[{}, {})", self.start, self.stop)
    }
}

/// Compute `worker_count` contiguous ranges covering `[0, file_size)`.
///
/// Each range spans `file_size / worker_count` bytes (integer division);
/// the final range's `stop` is forced to `file_size`. `file_size` does not
/// need to be divisible by `worker_count`, and `file_size == 0` is legal
/// (every range comes back empty).
pub fn plan_partitions(file_size: u64, worker_count: usize) -> Result<Vec<ByteRange>> {
    if worker_count == 0 {
        return Err(Error::InvalidConfig(
            "worker count must be at least 1".to_string(),
        ));
    }

    let chunk = file_size / worker_count as u64;

    let mut ranges = Vec::with_capacity(worker_count);
    for i in 0..worker_count as u64 {
        let start = i * chunk;
        let stop = if i == worker_count as u64 - 1 {
            file_size
        } else {
            (i + 1) * chunk
        };
        ranges.push(ByteRange { start, stop });
    }

    Ok(ranges)
}
