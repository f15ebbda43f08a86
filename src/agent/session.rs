use std::sync::Arc;
use std::time::Duration;

use tokio::sync::{mpsc, watch};
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

use super::{AgentAction, AgentStateMachine, PublishPlan, run_publish_loop};
use crate::domain::QosLevel;
use crate::error::{AppError, AppResult, TransportError};
use crate::protocol::{CONTROL_TOPICS, ControlMessage};
use crate::shutdown::ShutdownReceiver;
use crate::transport::{Connection, InboundEvent, Transport};

const CONTROL_SUBSCRIBE_QOS: QosLevel = QosLevel::AtMostOnce;

struct ActiveStream {
    generation: u64,
    stop: watch::Sender<bool>,
    handle: JoinHandle<()>,
}

impl ActiveStream {
    fn signal_stop(&self) {
        if self.stop.send(true).is_err() {
            // Stream task already finished.
        }
    }
}

/// One publisher instance bound to a broker session.
pub struct PublisherAgent {
    machine: AgentStateMachine,
}

impl PublisherAgent {
    #[must_use]
    pub fn new(instance_id: u32, run_duration: Duration) -> Self {
        Self {
            machine: AgentStateMachine::new(instance_id, run_duration),
        }
    }

    #[must_use]
    pub const fn instance_id(&self) -> u32 {
        self.machine.instance_id()
    }

    /// Serves control traffic until shutdown or connection loss.
    ///
    /// # Errors
    ///
    /// Returns an error when subscribing fails or the broker connection is
    /// lost.
    pub async fn run<T>(
        mut self,
        connection: Connection<T>,
        mut shutdown_rx: ShutdownReceiver,
    ) -> AppResult<()>
    where
        T: Transport,
    {
        let Connection {
            client,
            mut inbound,
        } = connection;
        let client = Arc::new(client);
        for topic in CONTROL_TOPICS {
            client.subscribe(topic, CONTROL_SUBSCRIBE_QOS).await?;
        }
        info!("Publisher {} ready", self.instance_id());

        let (finished_tx, mut finished_rx) = mpsc::unbounded_channel::<u64>();
        let mut active: Option<ActiveStream> = None;
        let mut generation: u64 = 0;

        let outcome = loop {
            tokio::select! {
                _ = shutdown_rx.recv() => break Ok(()),
                Some(finished) = finished_rx.recv() => {
                    if active.as_ref().is_some_and(|stream| stream.generation == finished) {
                        active = None;
                        self.machine.on_stream_finished();
                    }
                }
                event = inbound.recv() => match event {
                    Some(InboundEvent::Message { topic, payload }) => {
                        let message = match ControlMessage::parse(&topic, &payload) {
                            Ok(message) => message,
                            Err(err) => {
                                warn!("Publisher {} ignored control message on {}: {}", self.instance_id(), topic, err);
                                continue;
                            }
                        };
                        match self.machine.on_control(message) {
                            AgentAction::None => {}
                            AgentAction::Start(plan) => {
                                if let Some(previous) = active.take() {
                                    debug!("Publisher {} restarting its stream", self.instance_id());
                                    previous.signal_stop();
                                }
                                generation = generation.saturating_add(1);
                                active = Some(spawn_stream(&client, plan, generation, finished_tx.clone()));
                            }
                            AgentAction::Stop => {
                                if let Some(previous) = active.take() {
                                    info!("Publisher {} deactivated", self.instance_id());
                                    previous.signal_stop();
                                }
                            }
                        }
                    }
                    Some(InboundEvent::Disconnected { reason }) => {
                        break Err(AppError::transport(TransportError::Disconnected { reason }));
                    }
                    None => break Err(AppError::transport(TransportError::InboundClosed)),
                },
            }
        };

        if let Some(stream) = active.take() {
            stream.signal_stop();
            if let Err(err) = stream.handle.await {
                warn!("Publisher {} stream task failed: {}", self.instance_id(), err);
            }
        }
        if outcome.is_ok() {
            client.disconnect().await?;
        }
        outcome
    }
}

fn spawn_stream<T>(
    client: &Arc<T>,
    plan: PublishPlan,
    generation: u64,
    finished_tx: mpsc::UnboundedSender<u64>,
) -> ActiveStream
where
    T: Transport,
{
    let (stop, stop_rx) = watch::channel(false);
    let client = Arc::clone(client);
    info!(
        "Publisher {} starting: QoS={}, Delay={}, Size={}",
        plan.instance_id, plan.qos, plan.delay_ms, plan.payload_size
    );
    let handle = tokio::spawn(async move {
        let published = run_publish_loop(client.as_ref(), &plan, stop_rx).await;
        info!(
            "Publisher {} finished after {} messages",
            plan.instance_id, published
        );
        if finished_tx.send(generation).is_err() {
            // Agent already gone.
        }
    });
    ActiveStream {
        generation,
        stop,
        handle,
    }
}
