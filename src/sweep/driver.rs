use std::num::NonZeroUsize;

use async_trait::async_trait;
use tokio::sync::broadcast::error::TryRecvError;
use tracing::{error, info, warn};

use crate::coordinator::RunExecutor;
use crate::domain::RunParameters;
use crate::error::{AppError, AppResult};
use crate::metrics::RunRecord;
use crate::shutdown::ShutdownReceiver;

/// Persists the records accumulated so far. Every call receives the full
/// list and replaces what was written before.
#[async_trait]
pub trait RecordSink: Send {
    /// # Errors
    ///
    /// Returns an error when the records cannot be written.
    async fn save(&mut self, records: &[RunRecord]) -> AppResult<()>;
}

#[derive(Debug)]
pub struct SweepOutcome {
    pub records: Vec<RunRecord>,
    pub planned: usize,
    /// Stopped early by a shutdown request.
    pub interrupted: bool,
}

/// Executes `runs` in order, saving after every `checkpoint_every` completed
/// runs and once more at the end.
///
/// A shutdown request is honoured between runs, never during one. The first
/// failed run stops the sweep; records saved at earlier checkpoints stay on
/// disk.
///
/// # Errors
///
/// Returns the error of the failed run or of the failed save.
pub async fn run_sweep<E, S>(
    executor: &mut E,
    runs: &[RunParameters],
    sink: &mut S,
    checkpoint_every: NonZeroUsize,
    shutdown_rx: &mut ShutdownReceiver,
) -> AppResult<SweepOutcome>
where
    E: RunExecutor + ?Sized,
    S: RecordSink + ?Sized,
{
    let planned = runs.len();
    let mut records = Vec::with_capacity(planned);
    let mut saved = 0usize;
    let mut interrupted = false;

    for (index, params) in runs.iter().enumerate() {
        if shutdown_requested(shutdown_rx) {
            warn!("Stopping sweep after {} of {} runs", records.len(), planned);
            interrupted = true;
            break;
        }
        info!("Run {}/{}: {}", index.saturating_add(1), planned, params);
        let record = match executor.run_once(*params).await {
            Ok(record) => record,
            Err(err) => {
                error!(
                    "Run {} failed ({}); {} records remain saved: {}",
                    index.saturating_add(1),
                    failure_kind(&err),
                    saved,
                    err
                );
                return Err(err);
            }
        };
        records.push(record);

        if records.len().checked_rem(checkpoint_every.get()) == Some(0) {
            sink.save(&records).await?;
            saved = records.len();
            info!("Checkpoint: {} records saved", saved);
        }
    }

    if saved != records.len() {
        sink.save(&records).await?;
        info!("Saved {} records", records.len());
    }

    Ok(SweepOutcome {
        records,
        planned,
        interrupted,
    })
}

/// Broker connection failures abort the sweep just like any other failed run,
/// but are reported separately.
pub(crate) const fn failure_kind(err: &AppError) -> &'static str {
    if err.is_transport() {
        "transport failure"
    } else {
        "run error"
    }
}

fn shutdown_requested(shutdown_rx: &mut ShutdownReceiver) -> bool {
    match shutdown_rx.try_recv() {
        Ok(()) | Err(TryRecvError::Lagged(_)) => true,
        Err(TryRecvError::Empty | TryRecvError::Closed) => false,
    }
}
