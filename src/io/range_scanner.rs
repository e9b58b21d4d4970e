//! Byte-range line scanning with boundary realignment.
//!
//! A raw byte offset almost never falls on a logical-line boundary, so each
//! scanner must realign before yielding records. Ownership follows the
//! left-inclusive rule: a logical line belongs to the partition whose range
//! contains the byte offset of the line's first character.
//!
//! Per partition `[start, stop)`:
//!
//! - `start == 0`: the partition owns the header line. The schema was
//!   already parsed from the file head before workers spawned, so the
//!   scanner skips exactly one line and yields records after it.
//! - `start > 0`: seek to `start - 1` and discard through the first
//!   newline. If `start` fell mid-line this drops the tail of a line owned
//!   by the previous partition; if `start` fell exactly on a line boundary
//!   the byte at `start - 1` is the previous line's newline, so the discard
//!   consumes one byte and the line beginning at `start` is preserved.
//! - Lines whose first byte lies before `stop` are yielded in full, even
//!   when they extend past `stop`; the next partition's realignment
//!   consumes the remainder.
//! - EOF ends the sequence early (only the last partition should see this).

use std::fs::File;
use std::io::{self, BufRead, BufReader, Seek, SeekFrom};
use std::path::Path;

use crate::partition::ByteRange;

/// One complete logical line owned by a partition.
///
/// `offset` is the absolute byte position of the line's first character.
/// The trailing newline is stripped; a trailing `\r` is left for the
/// record-splitting layer to handle.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ScannedLine {
    pub offset: u64,
    pub bytes: Vec<u8>,
}

/// Lazy reader of the complete lines owned by one byte range.
///
/// Each scanner opens its own file handle with an independent position, so
/// no locking is needed across workers.
pub struct RangeScanner {
    reader: BufReader<File>,
    /// Absolute offset of the next unread byte.
    pos: u64,
    stop: u64,
    done: bool,
}

impl RangeScanner {
    /// Open the file and realign to the first line owned by `range`.
    pub fn open(path: &Path, range: ByteRange, buffer_bytes: usize) -> io::Result<Self> {
        let file = File::open(path)?;
        let mut reader = BufReader::with_capacity(buffer_bytes, file);

        let mut pos;
        let mut done = false;
        let mut scratch = Vec::new();

        if range.start == 0 {
            // Skip the header line; records begin immediately after it.
            let skipped = reader.read_until(b'\n', &mut scratch)?;
            pos = skipped as u64;
            if skipped == 0 {
                done = true;
            }
        } else {
            // Realign: back up one byte so a range landing exactly on a
            // line boundary still owns that line.
            reader.seek(SeekFrom::Start(range.start - 1))?;
            let skipped = reader.read_until(b'\n', &mut scratch)?;
            pos = range.start - 1 + skipped as u64;
            if skipped == 0 || scratch.last() != Some(&b'\n') {
                // No newline before EOF: the fragment ran off the end of
                // the file and there is nothing left to own.
                done = true;
            }
        }

        tracing::trace!(
            "scanner for {} realigned to offset {} ({} bytes discarded)",
            range,
            pos,
            pos.saturating_sub(range.start)
        );

        Ok(Self {
            reader,
            pos,
            stop: range.stop,
            done,
        })
    }

    /// Absolute offset of the next unread byte. After the scanner is
    /// exhausted this includes the straddling line's overshoot past `stop`.
    pub fn position(&self) -> u64 {
        self.pos
    }

    fn read_owned_line(&mut self) -> Option<io::Result<ScannedLine>> {
        // Left-inclusive ownership: only lines starting before `stop`.
        if self.done || self.pos >= self.stop {
            return None;
        }

        let mut bytes = Vec::new();
        match self.reader.read_until(b'\n', &mut bytes) {
            Ok(0) => {
                self.done = true;
                None
            }
            Ok(n) => {
                let offset = self.pos;
                self.pos += n as u64;
                if bytes.last() == Some(&b'\n') {
                    bytes.pop();
                }
                Some(Ok(ScannedLine { offset, bytes }))
            }
            Err(e) => {
                self.done = true;
                Some(Err(e))
            }
        }
    }
}

impl Iterator for RangeScanner {
    type Item = io::Result<ScannedLine>;

    fn next(&mut self) -> Option<Self::Item> {
        self.read_owned_line()
    }
}
