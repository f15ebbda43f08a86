use tracing::{info, warn};

use crate::args::SweepArgs;
use crate::coordinator::Coordinator;
use crate::domain::{RunParameters, RunTimings};
use crate::error::{AppResult, ValidationError};
use crate::shutdown::ShutdownSender;
use crate::sinks::ResultStore;
use crate::sweep::{SweepOutcome, handshake_runs, run_sweep};
use crate::transport::{BrokerEndpoint, Connector, MqttConnector};

/// The runs a sweep executes: the plan's grid with any command-line axis
/// overrides applied.
pub(crate) fn resolve_runs(sweep: &SweepArgs) -> Result<Vec<RunParameters>, ValidationError> {
    let has_overrides = !sweep.grid.is_empty();
    let Some(mut grid) = sweep.plan.grid(sweep.config_grid.as_ref(), has_overrides)? else {
        if has_overrides {
            warn!("Grid overrides do not apply to the handshake plan");
        }
        return Ok(handshake_runs());
    };
    sweep.grid.apply_to(&mut grid);
    grid.expand()
}

/// Resolves a broker address for the commands that talk to a real broker.
pub(crate) fn mqtt_connector(
    broker: &str,
    connect_timeout: std::time::Duration,
) -> Result<MqttConnector, ValidationError> {
    match broker.parse::<BrokerEndpoint>()? {
        BrokerEndpoint::Mqtt { host, port } => Ok(MqttConnector::new(host, port, connect_timeout)),
        BrokerEndpoint::Memory => Err(ValidationError::MemoryBrokerNotAllowed),
    }
}

/// Connects the coordinator, runs the sweep and closes the session.
pub(crate) async fn run_analysis<C>(
    connector: &C,
    timings: RunTimings,
    sweep: &SweepArgs,
    shutdown_tx: &ShutdownSender,
) -> AppResult<SweepOutcome>
where
    C: Connector,
{
    let runs = resolve_runs(sweep)?;
    info!(
        "Sweep plan {:?}: {} runs, about {}s each",
        sweep.plan,
        runs.len(),
        timings
            .settle
            .saturating_add(timings.window())
            .saturating_add(timings.cooldown)
            .as_secs()
    );

    let mut coordinator = Coordinator::connect(connector, timings).await?;
    let mut store = ResultStore::new(&sweep.results_dir);
    let mut shutdown_rx = shutdown_tx.subscribe();
    let outcome = run_sweep(
        &mut coordinator,
        &runs,
        &mut store,
        sweep.checkpoint_every.as_non_zero(),
        &mut shutdown_rx,
    )
    .await;

    if let Err(err) = coordinator.disconnect().await {
        warn!("Failed to disconnect analyzer: {}", err);
    }
    let outcome = outcome?;
    for line in sweep_summary_lines(&outcome, &store) {
        println!("{}", line);
    }
    Ok(outcome)
}

pub(crate) fn sweep_summary_lines(outcome: &SweepOutcome, store: &ResultStore) -> Vec<String> {
    let mut lines = vec![format!(
        "Completed {} of {} runs{}",
        outcome.records.len(),
        outcome.planned,
        if outcome.interrupted { " (interrupted)" } else { "" }
    )];
    if !outcome.records.is_empty() {
        lines.push(format!("Results: {}", store.results_path().display()));
        lines.push(format!(
            "System metrics: {}",
            store.sys_metrics_path().display()
        ));
    }
    lines
}
