//! Field schema shared by all workers, parsed once from the file head.
//!
//! The schema is derived from the first logical line of the file (offset 0)
//! before any worker spawns, then broadcast read-only to every partition.
//! No worker may infer a schema from a mid-file partial line; partitions
//! that do not contain offset 0 realign past their leading fragment instead
//! (see [`crate::io::RangeScanner`]).

use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::Path;

use crate::error::Result;

/// Ordered field names from the header line, plus the field delimiter.
///
/// Identical across all partitions for the lifetime of a run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Schema {
    fields: Vec<String>,
    delimiter: char,
}

impl Schema {
    /// Build a schema from an already-decoded header line.
    pub fn parse(header: &str, delimiter: char) -> Self {
        let line = header.strip_suffix('\r').unwrap_or(header);
        let fields = if line.is_empty() {
            Vec::new()
        } else {
            line.split(delimiter).map(|f| f.to_string()).collect()
        };
        Self { fields, delimiter }
    }

    /// Read and parse the header from the true head of the file.
    ///
    /// This is the only place in the engine that interprets file content as
    /// a header. An empty file yields an empty schema (and, downstream, no
    /// records).
    pub fn read_header(path: &Path, delimiter: char) -> Result<Self> {
        let file = File::open(path)?;
        let mut reader = BufReader::new(file);
        let mut raw = Vec::new();
        reader.read_until(b'\n', &mut raw)?;
        if raw.last() == Some(&b'\n') {
            raw.pop();
        }
        let header = String::from_utf8_lossy(&raw);
        Ok(Self::parse(&header, delimiter))
    }

    /// Field names in header order.
    pub fn fields(&self) -> &[String] {
        &self.fields
    }

    /// Number of fields a well-formed record must have.
    pub fn len(&self) -> usize {
        self.fields.len()
    }

    /// Whether the schema has no fields (empty input file).
    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }

    /// Position of a named field, if the header declares it.
    pub fn index_of(&self, name: &str) -> Option<usize> {
        self.fields.iter().position(|f| f == name)
    }

    /// The field delimiter.
    pub fn delimiter(&self) -> char {
        self.delimiter
    }

    /// Split one decoded line into a record.
    ///
    /// Returns `None` when the line does not split into exactly `len()`
    /// fields; such lines are malformed and the caller skips them.
    pub fn split_record<'a>(&self, line: &'a str) -> Option<Record<'a>> {
        let line = line.strip_suffix('\r').unwrap_or(line);
        let values: Vec<&str> = line.split(self.delimiter).collect();
        if values.len() != self.fields.len() {
            return None;
        }
        Some(Record { values })
    }
}

/// One record's field values, positionally matching the schema.
///
/// Borrows the worker's line buffer; exists only for the duration of
/// classification and is never retained.
#[derive(Debug)]
pub struct Record<'a> {
    values: Vec<&'a str>,
}

impl<'a> Record<'a> {
    /// Value at a schema field position.
    pub fn get(&self, index: usize) -> Option<&'a str> {
        self.values.get(index).copied()
    }
}
