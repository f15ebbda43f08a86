use std::path::{Path, PathBuf};

use async_trait::async_trait;
use tokio::io::{AsyncWriteExt, BufWriter};
use tracing::info;

use super::{render_results_csv, render_sys_metrics};
use crate::error::{AppError, AppResult, SinkError};
use crate::metrics::RunRecord;
use crate::sweep::RecordSink;

const STAMP_FORMAT: &str = "%Y%m%d_%H%M%S";

/// Results of one sweep: a CSV table and a JSON document, both rewritten in
/// full on every save.
#[derive(Debug, Clone)]
pub struct ResultStore {
    dir: PathBuf,
    stamp: String,
}

impl ResultStore {
    /// Store under `dir` stamped with the current local time.
    #[must_use]
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self::with_stamp(dir, chrono::Local::now().format(STAMP_FORMAT).to_string())
    }

    #[must_use]
    pub fn with_stamp(dir: impl Into<PathBuf>, stamp: impl Into<String>) -> Self {
        Self {
            dir: dir.into(),
            stamp: stamp.into(),
        }
    }

    #[must_use]
    pub fn results_path(&self) -> PathBuf {
        self.dir
            .join(format!("broker_test_results_{}.csv", self.stamp))
    }

    #[must_use]
    pub fn sys_metrics_path(&self) -> PathBuf {
        self.dir
            .join(format!("broker_sys_metrics_{}.json", self.stamp))
    }

    /// Writes both files for `records`.
    ///
    /// # Errors
    ///
    /// Returns an error when the directory cannot be created or a file cannot
    /// be written.
    pub async fn save_records(&self, records: &[RunRecord]) -> AppResult<()> {
        tokio::fs::create_dir_all(&self.dir).await.map_err(|err| {
            AppError::sink(SinkError::CreateDir {
                path: self.dir.clone(),
                source: err,
            })
        })?;

        let results_path = self.results_path();
        let table = render_results_csv(records)?;
        write_file(&results_path, table.as_bytes()).await?;
        info!("Results saved to {}", results_path.display());

        let sys_path = self.sys_metrics_path();
        let document = render_sys_metrics(records)?;
        write_file(&sys_path, document.as_bytes()).await?;
        info!("System metrics saved to {}", sys_path.display());
        Ok(())
    }
}

#[async_trait]
impl RecordSink for ResultStore {
    async fn save(&mut self, records: &[RunRecord]) -> AppResult<()> {
        self.save_records(records).await
    }
}

async fn write_file(path: &Path, bytes: &[u8]) -> AppResult<()> {
    let to_sink_error = |err: std::io::Error| {
        AppError::sink(SinkError::Write {
            path: path.to_path_buf(),
            source: err,
        })
    };
    let file = tokio::fs::File::create(path).await.map_err(to_sink_error)?;
    let mut writer = BufWriter::new(file);
    writer.write_all(bytes).await.map_err(to_sink_error)?;
    writer.flush().await.map_err(to_sink_error)?;
    Ok(())
}
