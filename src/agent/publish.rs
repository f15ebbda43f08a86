use std::time::Duration;

use tokio::sync::watch;
use tokio::time::Instant;
use tracing::{debug, warn};

use super::PublishPlan;
use crate::protocol::DataMessage;
use crate::transport::Transport;

/// Wall-clock milliseconds since the Unix epoch, as carried in data payloads.
#[must_use]
pub fn current_time_ms() -> u64 {
    u64::try_from(chrono::Utc::now().timestamp_millis()).unwrap_or(0)
}

/// Publishes `plan` from sequence 0 until its duration elapses or `stop`
/// flips to true. A failed publish ends the stream. Returns how many
/// messages were handed to the transport.
pub async fn run_publish_loop<T>(
    transport: &T,
    plan: &PublishPlan,
    mut stop: watch::Receiver<bool>,
) -> u64
where
    T: Transport + ?Sized,
{
    let topic = plan.topic();
    let started = Instant::now();
    let deadline = started.checked_add(plan.duration).unwrap_or(started);
    let delay = Duration::from_millis(plan.delay_ms);
    let mut sequence: u64 = 0;

    while Instant::now() < deadline && !*stop.borrow() {
        let payload = DataMessage::new(sequence, current_time_ms()).encode(plan.payload_size);
        if let Err(err) = transport.publish(&topic, payload, plan.qos).await {
            warn!("Publisher {} stopped: {}", plan.instance_id, err);
            break;
        }
        sequence = sequence.saturating_add(1);

        if delay.is_zero() {
            tokio::task::yield_now().await;
            continue;
        }
        tokio::select! {
            () = tokio::time::sleep(delay) => {}
            changed = stop.changed() => {
                if changed.is_err() {
                    break;
                }
            }
        }
    }

    debug!(
        "Publisher {} sent {} messages on {} in {:?}",
        plan.instance_id,
        sequence,
        topic,
        started.elapsed()
    );
    sequence
}
