//! File I/O for partitioned line scanning.

mod range_scanner;

pub use range_scanner::{RangeScanner, ScannedLine};
