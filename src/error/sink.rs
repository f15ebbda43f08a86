use std::path::PathBuf;

use thiserror::Error;

#[derive(Debug, Error)]
pub enum SinkError {
    #[error("Failed to create results directory '{path}': {source}")]
    CreateDir {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("Failed to write '{path}': {source}")]
    Write {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("Failed to read '{path}': {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("Failed to format output line: {source}")]
    WriteLine {
        #[source]
        source: std::fmt::Error,
    },
    #[error("Failed to serialize system metrics: {source}")]
    SerializeSysMetrics {
        #[source]
        source: serde_json::Error,
    },
    #[error("Results file is empty.")]
    MissingHeader,
    #[error("Unexpected results header '{found}'.")]
    UnexpectedHeader { found: String },
    #[error("Line {line}: expected {expected} columns, found {found}.")]
    ColumnCount {
        line: usize,
        expected: usize,
        found: usize,
    },
    #[error("Line {line}: invalid value '{value}' for column '{column}'.")]
    InvalidValue {
        line: usize,
        column: &'static str,
        value: String,
    },
}
