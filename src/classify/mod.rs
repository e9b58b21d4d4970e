//! Record classification and tally accumulation.

mod classifier;
mod tally;

pub use classifier::{Classifier, Outcome};
pub use tally::{Bucket, Tally};
