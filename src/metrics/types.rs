use crate::domain::RunParameters;
use crate::protocol::SysMetrics;

/// Metrics of one publisher's stream within a run.
#[derive(Debug, Clone, PartialEq)]
pub struct PublisherMetrics {
    pub publisher_id: u32,
    pub expected_count: u64,
    /// Distinct sequence numbers received.
    pub actual_count: u64,
    /// All receipts, duplicates included.
    pub received_count: u64,
    pub message_loss: f64,
    pub out_of_order: f64,
    pub duplicates: f64,
    pub mean_gap: f64,
    pub std_dev_gap: f64,
}

/// Aggregated numbers persisted for a run.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct RunMetrics {
    pub message_rate: f64,
    pub avg_message_loss: f64,
    pub avg_out_of_order: f64,
    pub avg_duplicates: f64,
    pub avg_mean_gap: f64,
    pub avg_std_dev_gap: f64,
}

/// Result of one run. Immutable once produced.
#[derive(Debug, Clone, PartialEq)]
pub struct RunRecord {
    pub params: RunParameters,
    pub metrics: RunMetrics,
    pub publishers: Vec<PublisherMetrics>,
    pub sys_metrics: SysMetrics,
}
