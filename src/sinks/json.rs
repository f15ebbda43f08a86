use std::collections::BTreeMap;

use crate::error::SinkError;
use crate::metrics::RunRecord;
use crate::protocol::SysMetrics;

/// Pretty JSON object mapping each run index (from 0) to the system metrics
/// captured during that run. JSON keys are strings, so the index is written
/// as `"0"`, `"1"`, ...
///
/// # Errors
///
/// Returns an error when serialization fails.
pub fn render_sys_metrics(records: &[RunRecord]) -> Result<String, SinkError> {
    let indexed: BTreeMap<usize, &SysMetrics> = records
        .iter()
        .enumerate()
        .map(|(index, record)| (index, &record.sys_metrics))
        .collect();
    serde_json::to_string_pretty(&indexed)
        .map_err(|err| SinkError::SerializeSysMetrics { source: err })
}
