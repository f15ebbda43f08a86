use std::time::Duration;

use tokio::time::Instant;
use tracing::{error, info, warn};

use super::session::run_analysis;
use crate::agent::{publisher_client_id, publisher_ids, run_fleet};
use crate::args::LocalArgs;
use crate::error::{AppResult, TransportError};
use crate::protocol::CONTROL_TOPICS;
use crate::shutdown::ShutdownSender;
use crate::sweep::SweepOutcome;
use crate::transport::MemoryBroker;

/// How long the publishers get to attach before the sweep starts.
const FLEET_READY_TIMEOUT: Duration = Duration::from_secs(5);
const FLEET_READY_POLL: Duration = Duration::from_millis(10);

/// Runs the publisher fleet and a sweep against one in-process broker.
pub(crate) async fn run_local(args: LocalArgs, shutdown_tx: &ShutdownSender) -> AppResult<()> {
    run_local_sweep(&args, shutdown_tx).await.map(|_| ())
}

pub(crate) async fn run_local_sweep(
    args: &LocalArgs,
    shutdown_tx: &ShutdownSender,
) -> AppResult<SweepOutcome> {
    let broker = MemoryBroker::new();
    let ids = publisher_ids(1, args.instances.get())?;
    let timings = args.timing.timings();
    info!("Starting {} local publishers", ids.len());

    let fleet = {
        let broker = broker.clone();
        let ids = ids.clone();
        let fleet_shutdown = shutdown_tx.clone();
        tokio::spawn(async move {
            run_fleet(&broker, &ids, timings.run_duration, &fleet_shutdown).await
        })
    };
    let outcome = match wait_for_fleet(&broker, &ids).await {
        Ok(()) => run_analysis(&broker, timings, &args.sweep, shutdown_tx).await,
        Err(err) => Err(err.into()),
    };

    if shutdown_tx.send(()).is_err() {
        warn!("No publisher was listening for shutdown");
    }
    let fleet_result = fleet.await.unwrap_or_else(|err| Err(err.into()));
    combine_results(outcome, fleet_result)
}

/// The sweep's own error wins; a fleet failure is reported when the sweep
/// itself succeeded and only logged otherwise.
pub(crate) fn combine_results<T>(outcome: AppResult<T>, fleet: AppResult<()>) -> AppResult<T> {
    match (outcome, fleet) {
        (outcome, Ok(())) => outcome,
        (Ok(_), Err(fleet_err)) => Err(fleet_err),
        (Err(err), Err(fleet_err)) => {
            error!("Publisher fleet also failed: {}", fleet_err);
            Err(err)
        }
    }
}

async fn wait_for_fleet(broker: &MemoryBroker, ids: &[u32]) -> Result<(), TransportError> {
    let deadline = Instant::now()
        .checked_add(FLEET_READY_TIMEOUT)
        .unwrap_or_else(Instant::now);
    loop {
        let ready = ids.iter().all(|id| {
            broker.subscriptions(&publisher_client_id(*id)).len() == CONTROL_TOPICS.len()
        });
        if ready {
            return Ok(());
        }
        if Instant::now() >= deadline {
            return Err(TransportError::ConnectTimeout {
                addr: "memory://".to_owned(),
                timeout_ms: u64::try_from(FLEET_READY_TIMEOUT.as_millis()).unwrap_or(u64::MAX),
            });
        }
        tokio::time::sleep(FLEET_READY_POLL).await;
    }
}
