//! Loss, ordering, duplication, and timing statistics for one run.
mod engine;
mod stats;
mod types;


pub use engine::{compute_publisher_metrics, compute_run_record, expected_count};
pub use stats::{mean, sample_std_dev};
pub use types::{PublisherMetrics, RunMetrics, RunRecord};
