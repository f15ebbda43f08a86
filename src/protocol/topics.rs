use crate::domain::StreamShape;
use crate::error::MessageError;

pub const TOPIC_QOS: &str = "request/qos";
pub const TOPIC_DELAY: &str = "request/delay";
pub const TOPIC_MESSAGE_SIZE: &str = "request/messagesize";
pub const TOPIC_INSTANCE_COUNT: &str = "request/instancecount";
pub const TOPIC_GO: &str = "request/go";

pub const CONTROL_TOPICS: [&str; 5] = [
    TOPIC_QOS,
    TOPIC_DELAY,
    TOPIC_MESSAGE_SIZE,
    TOPIC_INSTANCE_COUNT,
    TOPIC_GO,
];

pub const DATA_TOPIC_ROOT: &str = "counter";
pub const SYS_TOPIC_PREFIX: &str = "$SYS/";
pub const SYS_TOPIC_FILTER: &str = "$SYS/#";

/// `counter/{publisher_id}/{qos}/{delay}/{size}`
#[must_use]
pub fn data_topic(publisher_id: u32, shape: &StreamShape) -> String {
    format!(
        "{}/{}/{}/{}/{}",
        DATA_TOPIC_ROOT, publisher_id, shape.qos, shape.delay_ms, shape.payload_size
    )
}

/// `counter/+/{qos}/{delay}/{size}`, matching every publisher of one run.
#[must_use]
pub fn data_filter(shape: &StreamShape) -> String {
    format!(
        "{}/+/{}/{}/{}",
        DATA_TOPIC_ROOT, shape.qos, shape.delay_ms, shape.payload_size
    )
}

/// Extracts the publisher id (second level) from a data topic.
///
/// # Errors
///
/// Returns an error when the topic is not under the data root or the id is
/// not an integer.
pub fn publisher_id_from_topic(topic: &str) -> Result<u32, MessageError> {
    let mut levels = topic.split('/');
    if levels.next() != Some(DATA_TOPIC_ROOT) {
        return Err(MessageError::NotDataTopic {
            topic: topic.to_owned(),
        });
    }
    let raw = levels.next().ok_or_else(|| MessageError::NotDataTopic {
        topic: topic.to_owned(),
    })?;
    raw.parse::<u32>()
        .map_err(|err| MessageError::InvalidInteger {
            field: "publisher_id",
            value: raw.to_owned(),
            source: err,
        })
}
