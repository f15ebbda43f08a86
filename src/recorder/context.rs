use tracing::{debug, warn};

use super::ObservedStream;
use crate::domain::RunParameters;
use crate::error::MessageError;
use crate::protocol::{
    DataMessage, SYS_TOPIC_PREFIX, SysMetrics, SysValue, data_filter, publisher_id_from_topic,
};
use crate::transport::topic_matches;

/// What happened to one inbound message.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IngestOutcome {
    Recorded,
    SysMetric,
    /// Outside this run's data filter (stale or foreign traffic).
    OutOfScope,
    Malformed,
}

/// State of exactly one run. Created at run start, consumed by the metrics
/// engine, never reused.
#[derive(Debug)]
pub struct RunContext {
    params: RunParameters,
    filter: String,
    observed: ObservedStream,
    sys_metrics: SysMetrics,
    malformed: u64,
}

impl RunContext {
    #[must_use]
    pub fn new(params: RunParameters) -> Self {
        Self {
            filter: data_filter(&params.shape()),
            params,
            observed: ObservedStream::default(),
            sys_metrics: SysMetrics::new(),
            malformed: 0,
        }
    }

    #[must_use]
    pub const fn params(&self) -> &RunParameters {
        &self.params
    }

    /// Data topic filter this run subscribes to.
    #[must_use]
    pub fn filter(&self) -> &str {
        &self.filter
    }

    #[must_use]
    pub const fn observed(&self) -> &ObservedStream {
        &self.observed
    }

    #[must_use]
    pub const fn sys_metrics(&self) -> &SysMetrics {
        &self.sys_metrics
    }

    #[must_use]
    pub const fn malformed(&self) -> u64 {
        self.malformed
    }

    /// Splits the context into what the metrics engine needs.
    #[must_use]
    pub fn into_parts(self) -> (RunParameters, ObservedStream, SysMetrics) {
        (self.params, self.observed, self.sys_metrics)
    }

    /// Attributes one inbound message. Data messages count only when their
    /// topic falls under this run's filter; the payload is never used to
    /// decide which run a message belongs to.
    pub fn ingest(&mut self, topic: &str, payload: &[u8]) -> IngestOutcome {
        if topic.starts_with(SYS_TOPIC_PREFIX) {
            self.sys_metrics
                .insert(topic.to_owned(), SysValue::parse(payload));
            return IngestOutcome::SysMetric;
        }
        if !topic_matches(&self.filter, topic) {
            debug!("Ignoring message on {} (outside {})", topic, self.filter);
            return IngestOutcome::OutOfScope;
        }
        match parse_data(topic, payload) {
            Ok((publisher_id, message)) => {
                self.observed
                    .record(publisher_id, message.sequence, message.emitted_at_ms);
                IngestOutcome::Recorded
            }
            Err(err) => {
                self.malformed = self.malformed.saturating_add(1);
                warn!("Error processing message on {}: {}", topic, err);
                IngestOutcome::Malformed
            }
        }
    }
}

fn parse_data(topic: &str, payload: &[u8]) -> Result<(u32, DataMessage), MessageError> {
    let publisher_id = publisher_id_from_topic(topic)?;
    let message = DataMessage::parse(payload)?;
    Ok((publisher_id, message))
}
