use std::num::NonZeroU32;
use std::path::Path;

use crate::domain::{QosLevel, RunParameters};
use crate::error::{AppError, AppResult, SinkError};
use crate::metrics::{RunMetrics, RunRecord};

use super::format::write_line;

pub const RESULTS_HEADER: &str = "qos,delay,messagesize,instancecount,sub_qos,message_rate,avg_message_loss,avg_out_of_order,avg_duplicates,avg_mean_gap,avg_std_dev_gap";
const COLUMNS: [&str; 11] = [
    "qos",
    "delay",
    "messagesize",
    "instancecount",
    "sub_qos",
    "message_rate",
    "avg_message_loss",
    "avg_out_of_order",
    "avg_duplicates",
    "avg_mean_gap",
    "avg_std_dev_gap",
];

/// The persisted part of a [`RunRecord`].
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ResultRow {
    pub params: RunParameters,
    pub metrics: RunMetrics,
}

impl From<&RunRecord> for ResultRow {
    fn from(record: &RunRecord) -> Self {
        Self {
            params: record.params,
            metrics: record.metrics,
        }
    }
}

/// Renders the results table. Floats use the shortest form that parses back
/// to the same value.
///
/// # Errors
///
/// Returns an error when a line cannot be formatted.
pub fn render_results_csv(records: &[RunRecord]) -> AppResult<String> {
    let mut output = String::new();
    write_line(&mut output, RESULTS_HEADER)?;
    for row in records.iter().map(ResultRow::from) {
        let params = row.params;
        let metrics = row.metrics;
        write_line(
            &mut output,
            &format!(
                "{},{},{},{},{},{},{},{},{},{},{}",
                params.publish_qos,
                params.delay_ms,
                params.payload_size,
                params.publisher_count,
                params.subscribe_qos,
                metrics.message_rate,
                metrics.avg_message_loss,
                metrics.avg_out_of_order,
                metrics.avg_duplicates,
                metrics.avg_mean_gap,
                metrics.avg_std_dev_gap
            ),
        )?;
    }
    Ok(output)
}

/// Parses a results table written by [`render_results_csv`]. Blank lines are
/// skipped.
///
/// # Errors
///
/// Returns an error for a missing or unexpected header, a row with the wrong
/// number of columns, or a value that does not parse.
pub fn parse_results_csv(text: &str) -> Result<Vec<ResultRow>, SinkError> {
    let mut lines = text.lines().enumerate();
    let (_, header) = lines.next().ok_or(SinkError::MissingHeader)?;
    if header.trim() != RESULTS_HEADER {
        return Err(SinkError::UnexpectedHeader {
            found: header.to_owned(),
        });
    }

    let mut rows = Vec::new();
    for (index, line) in lines {
        if line.trim().is_empty() {
            continue;
        }
        rows.push(parse_row(index.saturating_add(1), line)?);
    }
    Ok(rows)
}

/// Loads a results file from disk.
///
/// # Errors
///
/// Returns an error when the file cannot be read or parsed.
pub async fn read_results_csv(path: &Path) -> AppResult<Vec<ResultRow>> {
    let text = tokio::fs::read_to_string(path)
        .await
        .map_err(|err| {
            AppError::sink(SinkError::Read {
                path: path.to_path_buf(),
                source: err,
            })
        })?;
    Ok(parse_results_csv(&text)?)
}

struct RowFields<'line> {
    line: usize,
    fields: Vec<&'line str>,
}

impl<'line> RowFields<'line> {
    fn field(&self, column: usize) -> Result<&'line str, SinkError> {
        let name = COLUMNS.get(column).copied().unwrap_or("?");
        self.fields
            .get(column)
            .copied()
            .map(str::trim)
            .ok_or(SinkError::InvalidValue {
                line: self.line,
                column: name,
                value: String::new(),
            })
    }

    fn parse<T: std::str::FromStr>(&self, column: usize) -> Result<T, SinkError> {
        let raw = self.field(column)?;
        raw.parse::<T>().map_err(|_err: T::Err| SinkError::InvalidValue {
            line: self.line,
            column: COLUMNS.get(column).copied().unwrap_or("?"),
            value: raw.to_owned(),
        })
    }
}

fn parse_row(line: usize, text: &str) -> Result<ResultRow, SinkError> {
    let fields: Vec<&str> = text.split(',').collect();
    if fields.len() != COLUMNS.len() {
        return Err(SinkError::ColumnCount {
            line,
            expected: COLUMNS.len(),
            found: fields.len(),
        });
    }
    let row = RowFields { line, fields };
    let params = RunParameters {
        publish_qos: row.parse::<QosLevel>(0)?,
        delay_ms: row.parse::<u64>(1)?,
        payload_size: row.parse::<usize>(2)?,
        publisher_count: row.parse::<NonZeroU32>(3)?,
        subscribe_qos: row.parse::<QosLevel>(4)?,
    };
    let metrics = RunMetrics {
        message_rate: row.parse::<f64>(5)?,
        avg_message_loss: row.parse::<f64>(6)?,
        avg_out_of_order: row.parse::<f64>(7)?,
        avg_duplicates: row.parse::<f64>(8)?,
        avg_mean_gap: row.parse::<f64>(9)?,
        avg_std_dev_gap: row.parse::<f64>(10)?,
    };
    Ok(ResultRow { params, metrics })
}
