use std::time::Duration;

use tracing::{error, info};

use super::PublisherAgent;
use crate::error::{AppResult, ValidationError};
use crate::shutdown::ShutdownSender;
use crate::transport::Connector;

/// Broker client id of publisher `instance_id`.
#[must_use]
pub fn publisher_client_id(instance_id: u32) -> String {
    format!("publisher-{}", instance_id)
}

/// `count` consecutive instance ids starting at `first`.
///
/// # Errors
///
/// Returns an error when `first` is zero or the range overflows `u32`.
pub fn publisher_ids(first: u32, count: u32) -> Result<Vec<u32>, ValidationError> {
    if first == 0 {
        return Err(ValidationError::PublisherIdZero { first });
    }
    let last = first
        .checked_add(count.saturating_sub(1))
        .ok_or(ValidationError::PublisherIdOverflow { first, count })?;
    if count == 0 {
        return Ok(Vec::new());
    }
    Ok((first..=last).collect())
}

/// Connects one agent per id and runs them until shutdown. Every agent has
/// its own broker session.
///
/// # Errors
///
/// Returns an error when a connection cannot be opened, or the first error
/// an agent ended with.
pub async fn run_fleet<C>(
    connector: &C,
    ids: &[u32],
    run_duration: Duration,
    shutdown_tx: &ShutdownSender,
) -> AppResult<()>
where
    C: Connector,
{
    let mut handles = Vec::with_capacity(ids.len());
    for id in ids {
        let connection = connector.connect(&publisher_client_id(*id)).await?;
        let agent = PublisherAgent::new(*id, run_duration);
        let shutdown_rx = shutdown_tx.subscribe();
        handles.push((*id, tokio::spawn(agent.run(connection, shutdown_rx))));
    }
    info!("Started {} publishers", handles.len());

    let mut first_error = None;
    for (id, handle) in handles {
        match handle.await {
            Ok(Ok(())) => {}
            Ok(Err(err)) => {
                error!("Publisher {} failed: {}", id, err);
                first_error.get_or_insert(err);
            }
            Err(err) => {
                error!("Publisher {} task failed: {}", id, err);
                first_error.get_or_insert(err.into());
            }
        }
    }
    first_error.map_or(Ok(()), Err)
}
