use thiserror::Error;

/// A single inbound payload or topic that could not be interpreted. Always
/// recovered locally by discarding the message.
#[derive(Debug, Error)]
pub enum MessageError {
    #[error("Missing '{field}' field in payload.")]
    MissingField { field: &'static str },
    #[error("Field '{field}' is not valid UTF-8: {source}")]
    InvalidUtf8 {
        field: &'static str,
        #[source]
        source: std::str::Utf8Error,
    },
    #[error("Field '{field}' is not an integer ('{value}'): {source}")]
    InvalidInteger {
        field: &'static str,
        value: String,
        #[source]
        source: std::num::ParseIntError,
    },
    #[error("Invalid QoS '{value}' on control topic.")]
    InvalidQos { value: String },
    #[error("Topic '{topic}' is not a data topic.")]
    NotDataTopic { topic: String },
    #[error("Topic '{topic}' is not a control topic.")]
    UnknownControlTopic { topic: String },
}
