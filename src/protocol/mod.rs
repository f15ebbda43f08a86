//! Topics and payload formats of the coordination protocol.
//!
//! Control and data traffic share the broker. The coordinator broadcasts one
//! scalar per control topic and a start trigger; publishers answer with data
//! messages on a topic that encodes the stream shape.
mod control;
mod data;
mod sys;
mod topics;


pub use control::ControlMessage;
pub use data::{DataMessage, FILLER_BYTE};
pub use sys::{SysMetrics, SysValue};
pub use topics::{
    CONTROL_TOPICS, DATA_TOPIC_ROOT, SYS_TOPIC_FILTER, SYS_TOPIC_PREFIX, TOPIC_DELAY, TOPIC_GO,
    TOPIC_INSTANCE_COUNT, TOPIC_MESSAGE_SIZE, TOPIC_QOS, data_filter, data_topic,
    publisher_id_from_topic,
};
