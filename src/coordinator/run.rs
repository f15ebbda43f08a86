use async_trait::async_trait;
use tokio::time::{Instant, sleep_until};
use tracing::{debug, info};

use crate::domain::{QosLevel, RunParameters, RunTimings};
use crate::error::{AppError, AppResult, TransportError};
use crate::metrics::{RunRecord, compute_run_record};
use crate::protocol::{ControlMessage, SYS_TOPIC_FILTER};
use crate::recorder::RunContext;
use crate::transport::{Connection, Connector, InboundEvent, InboundReceiver, Transport};

pub const ANALYZER_CLIENT_ID: &str = "analyzer";

/// Control broadcasts are fire-and-forget.
const CONTROL_QOS: QosLevel = QosLevel::AtMostOnce;

/// Executes one run and returns its record. The sweep driver depends on this
/// seam rather than on a live broker session.
#[async_trait]
pub trait RunExecutor: Send {
    /// Runs `params` end to end.
    ///
    /// # Errors
    ///
    /// Returns an error when the broker connection fails during the run.
    async fn run_once(&mut self, params: RunParameters) -> AppResult<RunRecord>;
}

/// Analyzer side of the protocol. Owns its broker session and the inbound
/// stream; each run gets a fresh [`RunContext`].
pub struct Coordinator<T> {
    client: T,
    inbound: InboundReceiver,
    timings: RunTimings,
    previous_filter: Option<String>,
}

impl<T> Coordinator<T>
where
    T: Transport,
{
    /// Connects as the analyzer and subscribes to the broker's system topics.
    ///
    /// # Errors
    ///
    /// Returns an error when the connection or the subscription fails.
    pub async fn connect<C>(connector: &C, timings: RunTimings) -> AppResult<Self>
    where
        C: Connector<Client = T>,
    {
        let connection = connector.connect(ANALYZER_CLIENT_ID).await?;
        let coordinator = Self::new(connection, timings);
        coordinator
            .client
            .subscribe(SYS_TOPIC_FILTER, QosLevel::AtMostOnce)
            .await?;
        info!("Analyzer connected; listening on {}", SYS_TOPIC_FILTER);
        Ok(coordinator)
    }

    #[must_use]
    pub fn new(connection: Connection<T>, timings: RunTimings) -> Self {
        let Connection { client, inbound } = connection;
        Self {
            client,
            inbound,
            timings,
            previous_filter: None,
        }
    }

    #[must_use]
    pub const fn timings(&self) -> &RunTimings {
        &self.timings
    }

    /// Closes the broker session.
    ///
    /// # Errors
    ///
    /// Returns an error when the disconnect request cannot be sent.
    pub async fn disconnect(self) -> AppResult<()> {
        self.client.disconnect().await?;
        Ok(())
    }

    async fn execute(&mut self, params: RunParameters) -> AppResult<RunRecord> {
        let mut context = RunContext::new(params);

        if let Some(previous) = self.previous_filter.take() {
            self.client.unsubscribe(&previous).await?;
        }
        self.client
            .subscribe(context.filter(), params.subscribe_qos)
            .await?;
        self.previous_filter = Some(context.filter().to_owned());
        info!(
            "Subscribed to {} with QoS {}",
            context.filter(),
            params.subscribe_qos
        );

        for message in ControlMessage::parameters(&params) {
            self.client
                .publish(message.topic(), message.encode(), CONTROL_QOS)
                .await?;
        }

        let settle_deadline = Instant::now()
            .checked_add(self.timings.settle)
            .unwrap_or_else(Instant::now);
        self.pump_until(settle_deadline, Some(&mut context)).await?;

        info!("Starting test: {}", params);
        let go = ControlMessage::Go;
        self.client
            .publish(go.topic(), go.encode(), CONTROL_QOS)
            .await?;
        let started = Instant::now();

        let window_deadline = started
            .checked_add(self.timings.window())
            .unwrap_or(started);
        self.pump_until(window_deadline, Some(&mut context)).await?;
        let elapsed = started.elapsed();

        if context.malformed() > 0 {
            debug!("Discarded {} malformed messages", context.malformed());
        }
        let record = compute_run_record(context, self.timings.run_duration, elapsed);
        info!("Test completed: {}", record.params);
        info!(
            "Message rate: {:.2} msg/s, Loss: {:.2}%, Out-of-order: {:.2}%, Duplicates: {:.2}%",
            record.metrics.message_rate,
            record.metrics.avg_message_loss,
            record.metrics.avg_out_of_order,
            record.metrics.avg_duplicates
        );

        let cooldown_deadline = Instant::now()
            .checked_add(self.timings.cooldown)
            .unwrap_or_else(Instant::now);
        self.pump_until(cooldown_deadline, None).await?;

        Ok(record)
    }

    /// Drains inbound events until `deadline`. Messages go to `context` when
    /// one is live and are dropped otherwise.
    async fn pump_until(
        &mut self,
        deadline: Instant,
        mut context: Option<&mut RunContext>,
    ) -> AppResult<()> {
        let sleep = sleep_until(deadline);
        tokio::pin!(sleep);
        loop {
            tokio::select! {
                () = &mut sleep => return Ok(()),
                event = self.inbound.recv() => match event {
                    Some(InboundEvent::Message { topic, payload }) => {
                        if let Some(context) = context.as_deref_mut() {
                            context.ingest(&topic, &payload);
                        }
                    }
                    Some(InboundEvent::Disconnected { reason }) => {
                        return Err(AppError::transport(TransportError::Disconnected { reason }));
                    }
                    None => return Err(AppError::transport(TransportError::InboundClosed)),
                },
            }
        }
    }
}

#[async_trait]
impl<T> RunExecutor for Coordinator<T>
where
    T: Transport,
{
    async fn run_once(&mut self, params: RunParameters) -> AppResult<RunRecord> {
        self.execute(params).await
    }
}
