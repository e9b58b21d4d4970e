//! Bucket counts accumulated per partition and merged globally.

use serde::Serialize;

/// The bucket a counted record contributes to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Bucket {
    Female,
    Male,
    Other,
}

/// Per-bucket record counts.
///
/// Produced once per partition by exactly one worker (a partial tally),
/// then reduced element-wise into the final tally. `merge` is commutative
/// and associative with `Tally::default()` as identity, so the reduction is
/// deterministic regardless of worker completion order.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct Tally {
    /// Records with gender exactly `f` (case-insensitive).
    #[serde(rename = "f")]
    pub female: u64,

    /// Records with gender exactly `m` (case-insensitive).
    #[serde(rename = "m")]
    pub male: u64,

    /// Records with any other gender value.
    pub other: u64,
}

impl Tally {
    /// Count one record in the given bucket.
    pub fn record(&mut self, bucket: Bucket) {
        match bucket {
            Bucket::Female => self.female += 1,
            Bucket::Male => self.male += 1,
            Bucket::Other => self.other += 1,
        }
    }

    /// Fold another partial tally into this one.
    pub fn merge(&mut self, other: Tally) {
        self.female += other.female;
        self.male += other.male;
        self.other += other.other;
    }

    /// Total counted records across all buckets.
    pub fn total(&self) -> u64 {
        self.female + self.male + self.other
    }
}

impl std::fmt::Display for Tally {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "f: {}, m: {}, other: {}",
            self.female, self.male, self.other
        )
    }
}
