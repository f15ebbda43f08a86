use std::fmt;
use std::num::NonZeroU32;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::error::ValidationError;

/// Default publishing window per run (matches the agents' fixed duration).
const DEFAULT_RUN_DURATION: Duration = Duration::from_secs(30);
/// Grace period between the parameter broadcast and the start signal.
const DEFAULT_SETTLE: Duration = Duration::from_secs(1);
/// Extra time the coordinator keeps listening after the publishing window.
const DEFAULT_BUFFER: Duration = Duration::from_secs(2);
/// Pause between two consecutive runs.
const DEFAULT_COOLDOWN: Duration = Duration::from_secs(2);

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "u8", into = "u8")]
pub enum QosLevel {
    AtMostOnce,
    AtLeastOnce,
    ExactlyOnce,
}

impl QosLevel {
    pub const ALL: [QosLevel; 3] = [
        QosLevel::AtMostOnce,
        QosLevel::AtLeastOnce,
        QosLevel::ExactlyOnce,
    ];

    #[must_use]
    pub const fn as_u8(self) -> u8 {
        match self {
            QosLevel::AtMostOnce => 0,
            QosLevel::AtLeastOnce => 1,
            QosLevel::ExactlyOnce => 2,
        }
    }
}

impl TryFrom<u8> for QosLevel {
    type Error = ValidationError;

    fn try_from(value: u8) -> Result<Self, Self::Error> {
        match value {
            0 => Ok(QosLevel::AtMostOnce),
            1 => Ok(QosLevel::AtLeastOnce),
            2 => Ok(QosLevel::ExactlyOnce),
            other => Err(ValidationError::InvalidQos {
                value: other.to_string(),
            }),
        }
    }
}

impl From<QosLevel> for u8 {
    fn from(value: QosLevel) -> Self {
        value.as_u8()
    }
}

impl std::str::FromStr for QosLevel {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let trimmed = s.trim();
        let value: u8 = trimmed.parse().map_err(|_err: std::num::ParseIntError| {
            ValidationError::InvalidQos {
                value: trimmed.to_owned(),
            }
        })?;
        QosLevel::try_from(value)
    }
}

impl fmt::Display for QosLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_u8())
    }
}

/// The part of the run parameters that is encoded in a data topic.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StreamShape {
    pub qos: QosLevel,
    pub delay_ms: u64,
    pub payload_size: usize,
}

/// Parameters of one run. Immutable for the duration of the run.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RunParameters {
    pub publish_qos: QosLevel,
    pub subscribe_qos: QosLevel,
    pub delay_ms: u64,
    pub payload_size: usize,
    pub publisher_count: NonZeroU32,
}

impl RunParameters {
    #[must_use]
    pub const fn shape(&self) -> StreamShape {
        StreamShape {
            qos: self.publish_qos,
            delay_ms: self.delay_ms,
            payload_size: self.payload_size,
        }
    }
}

impl fmt::Display for RunParameters {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "QoS={}, Delay={}, Size={}, Count={}, Sub_QoS={}",
            self.publish_qos,
            self.delay_ms,
            self.payload_size,
            self.publisher_count,
            self.subscribe_qos
        )
    }
}

/// Fixed waits of the coordination protocol.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RunTimings {
    pub settle: Duration,
    pub run_duration: Duration,
    pub buffer: Duration,
    pub cooldown: Duration,
}

impl RunTimings {
    /// How long the coordinator listens after sending the start signal.
    #[must_use]
    pub fn window(&self) -> Duration {
        self.run_duration.saturating_add(self.buffer)
    }
}

impl Default for RunTimings {
    fn default() -> Self {
        Self {
            settle: DEFAULT_SETTLE,
            run_duration: DEFAULT_RUN_DURATION,
            buffer: DEFAULT_BUFFER,
            cooldown: DEFAULT_COOLDOWN,
        }
    }
}
