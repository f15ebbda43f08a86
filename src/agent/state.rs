use std::time::Duration;

use crate::domain::{QosLevel, StreamShape};
use crate::protocol::{ControlMessage, data_topic};

const DEFAULT_DELAY_MS: u64 = 100;
const DEFAULT_INSTANCE_COUNT: u32 = 1;

/// Last broadcast values seen by an agent.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AgentSettings {
    pub qos: QosLevel,
    pub delay_ms: u64,
    pub payload_size: usize,
    pub instance_count: u32,
}

impl Default for AgentSettings {
    fn default() -> Self {
        Self {
            qos: QosLevel::AtMostOnce,
            delay_ms: DEFAULT_DELAY_MS,
            payload_size: 0,
            instance_count: DEFAULT_INSTANCE_COUNT,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AgentState {
    Idle,
    Configured,
    Publishing,
}

/// Snapshot of the settings a stream was started with.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PublishPlan {
    pub instance_id: u32,
    pub qos: QosLevel,
    pub delay_ms: u64,
    pub payload_size: usize,
    pub duration: Duration,
}

impl PublishPlan {
    #[must_use]
    pub const fn shape(&self) -> StreamShape {
        StreamShape {
            qos: self.qos,
            delay_ms: self.delay_ms,
            payload_size: self.payload_size,
        }
    }

    #[must_use]
    pub fn topic(&self) -> String {
        data_topic(self.instance_id, &self.shape())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AgentAction {
    None,
    /// Start a stream, replacing the running one if any.
    Start(PublishPlan),
    /// Stop the running stream.
    Stop,
}

/// Pure agent logic: no I/O, no clock.
///
/// There is no acknowledgement in the protocol. A start trigger that arrives
/// before the matching parameter broadcasts is acted on with whatever
/// settings the agent holds at that moment.
#[derive(Debug, Clone)]
pub struct AgentStateMachine {
    instance_id: u32,
    run_duration: Duration,
    settings: AgentSettings,
    state: AgentState,
}

impl AgentStateMachine {
    #[must_use]
    pub fn new(instance_id: u32, run_duration: Duration) -> Self {
        Self {
            instance_id,
            run_duration,
            settings: AgentSettings::default(),
            state: AgentState::Idle,
        }
    }

    #[must_use]
    pub const fn instance_id(&self) -> u32 {
        self.instance_id
    }

    #[must_use]
    pub const fn state(&self) -> AgentState {
        self.state
    }

    #[must_use]
    pub const fn settings(&self) -> &AgentSettings {
        &self.settings
    }

    /// Applies one control message and says what the session should do.
    pub fn on_control(&mut self, message: ControlMessage) -> AgentAction {
        match message {
            ControlMessage::Qos(qos) => self.configure(|settings| settings.qos = qos),
            ControlMessage::Delay(delay_ms) => {
                self.configure(|settings| settings.delay_ms = delay_ms)
            }
            ControlMessage::MessageSize(size) => {
                self.configure(|settings| settings.payload_size = size)
            }
            ControlMessage::InstanceCount(count) => {
                self.configure(|settings| settings.instance_count = count)
            }
            ControlMessage::Go => self.on_go(),
        }
    }

    /// The running stream ended on its own.
    pub fn on_stream_finished(&mut self) {
        if self.state == AgentState::Publishing {
            self.state = AgentState::Idle;
        }
    }

    fn configure<F>(&mut self, apply: F) -> AgentAction
    where
        F: FnOnce(&mut AgentSettings),
    {
        apply(&mut self.settings);
        if self.state == AgentState::Idle {
            self.state = AgentState::Configured;
        }
        AgentAction::None
    }

    fn on_go(&mut self) -> AgentAction {
        if self.instance_id <= self.settings.instance_count {
            self.state = AgentState::Publishing;
            return AgentAction::Start(PublishPlan {
                instance_id: self.instance_id,
                qos: self.settings.qos,
                delay_ms: self.settings.delay_ms,
                payload_size: self.settings.payload_size,
                duration: self.run_duration,
            });
        }
        let was_publishing = self.state == AgentState::Publishing;
        self.state = AgentState::Idle;
        if was_publishing {
            AgentAction::Stop
        } else {
            AgentAction::None
        }
    }
}
