use crate::domain::{QosLevel, RunParameters};
use crate::error::MessageError;

use super::topics::{
    TOPIC_DELAY, TOPIC_GO, TOPIC_INSTANCE_COUNT, TOPIC_MESSAGE_SIZE, TOPIC_QOS,
};

/// Payload sent with the start trigger. Receivers ignore its content.
const GO_PAYLOAD: &str = "1";

/// A coordinator broadcast as seen by a publisher agent.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ControlMessage {
    Qos(QosLevel),
    Delay(u64),
    MessageSize(usize),
    InstanceCount(u32),
    Go,
}

impl ControlMessage {
    /// The four parameter broadcasts for a run, in publish order.
    #[must_use]
    pub const fn parameters(params: &RunParameters) -> [ControlMessage; 4] {
        [
            ControlMessage::Qos(params.publish_qos),
            ControlMessage::Delay(params.delay_ms),
            ControlMessage::MessageSize(params.payload_size),
            ControlMessage::InstanceCount(params.publisher_count.get()),
        ]
    }

    #[must_use]
    pub const fn topic(&self) -> &'static str {
        match self {
            ControlMessage::Qos(_) => TOPIC_QOS,
            ControlMessage::Delay(_) => TOPIC_DELAY,
            ControlMessage::MessageSize(_) => TOPIC_MESSAGE_SIZE,
            ControlMessage::InstanceCount(_) => TOPIC_INSTANCE_COUNT,
            ControlMessage::Go => TOPIC_GO,
        }
    }

    /// Scalars travel as UTF-8 decimal text.
    #[must_use]
    pub fn encode(&self) -> Vec<u8> {
        match self {
            ControlMessage::Qos(qos) => qos.to_string().into_bytes(),
            ControlMessage::Delay(delay) => delay.to_string().into_bytes(),
            ControlMessage::MessageSize(size) => size.to_string().into_bytes(),
            ControlMessage::InstanceCount(count) => count.to_string().into_bytes(),
            ControlMessage::Go => GO_PAYLOAD.as_bytes().to_vec(),
        }
    }

    /// Interprets a message received on one of the control topics.
    ///
    /// # Errors
    ///
    /// Returns an error for unknown topics and for scalars that are not
    /// valid integers.
    pub fn parse(topic: &str, payload: &[u8]) -> Result<Self, MessageError> {
        match topic {
            TOPIC_GO => Ok(ControlMessage::Go),
            TOPIC_QOS => {
                let text = scalar_text(payload, "qos")?;
                text.parse::<QosLevel>()
                    .map(ControlMessage::Qos)
                    .map_err(|_err| MessageError::InvalidQos {
                        value: text.to_owned(),
                    })
            }
            TOPIC_DELAY => parse_scalar(payload, "delay").map(ControlMessage::Delay),
            TOPIC_MESSAGE_SIZE => {
                parse_scalar(payload, "messagesize").map(ControlMessage::MessageSize)
            }
            TOPIC_INSTANCE_COUNT => {
                parse_scalar(payload, "instancecount").map(ControlMessage::InstanceCount)
            }
            other => Err(MessageError::UnknownControlTopic {
                topic: other.to_owned(),
            }),
        }
    }
}

fn scalar_text<'payload>(
    payload: &'payload [u8],
    field: &'static str,
) -> Result<&'payload str, MessageError> {
    std::str::from_utf8(payload)
        .map(str::trim)
        .map_err(|err| MessageError::InvalidUtf8 { field, source: err })
}

fn parse_scalar<T>(payload: &[u8], field: &'static str) -> Result<T, MessageError>
where
    T: std::str::FromStr<Err = std::num::ParseIntError>,
{
    let text = scalar_text(payload, field)?;
    text.parse::<T>()
        .map_err(|err| MessageError::InvalidInteger {
            field,
            value: text.to_owned(),
            source: err,
        })
}
