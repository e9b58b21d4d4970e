//! Pure per-record bucket decision with age-filter bounds.

use crate::classify::Bucket;
use crate::schema::{Record, Schema};

/// What a single record contributed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Outcome {
    /// Record passed the age filter and landed in a bucket.
    Counted(Bucket),

    /// Age parsed but fell outside the filter bounds. Silently excluded
    /// from all buckets; tracked only as an observability counter.
    OutOfRange,

    /// Age unparseable, or a required column is absent from the schema.
    /// Recovered locally by the worker, never fatal.
    Invalid,
}

/// Stateless record classifier, built once per run from the shared schema.
///
/// Column positions for `age` and `gender` are resolved up front so the
/// per-record path is index lookups and a float parse.
#[derive(Debug, Clone)]
pub struct Classifier {
    age_idx: Option<usize>,
    gender_idx: Option<usize>,
    min_age: f64,
    max_age: f64,
}

impl Classifier {
    /// Resolve the required columns against the schema.
    pub fn new(schema: &Schema, min_age: f64, max_age: f64) -> Self {
        Self {
            age_idx: schema.index_of("age"),
            gender_idx: schema.index_of("gender"),
            min_age,
            max_age,
        }
    }

    /// Decide which bucket a record contributes to, if any.
    ///
    /// Bounds are inclusive on both ends. The gender column is only
    /// consulted for records inside the age range, so a file without a
    /// gender column still filters cleanly when every row is out of range.
    pub fn classify(&self, record: &Record<'_>) -> Outcome {
        let age_raw = match self.age_idx.and_then(|i| record.get(i)) {
            Some(raw) => raw,
            None => return Outcome::Invalid,
        };

        let age: f64 = match age_raw.trim().parse() {
            Ok(age) => age,
            Err(_) => return Outcome::Invalid,
        };

        if age < self.min_age || age > self.max_age {
            return Outcome::OutOfRange;
        }

        let gender = match self.gender_idx.and_then(|i| record.get(i)) {
            Some(raw) => raw,
            None => return Outcome::Invalid,
        };

        match gender.to_lowercase().as_str() {
            "f" => Outcome::Counted(Bucket::Female),
            "m" => Outcome::Counted(Bucket::Male),
            _ => Outcome::Counted(Bucket::Other),
        }
    }
}
