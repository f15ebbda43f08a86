//! Publisher side of the protocol.
//!
//! Each agent listens on the control topics, keeps the latest broadcast
//! settings and, when the start trigger selects it, publishes a sequenced
//! stream for a fixed duration on its own task.
mod fleet;
mod publish;
mod session;
mod state;

#[cfg(test)]
mod tests;

pub use fleet::{publisher_client_id, publisher_ids, run_fleet};
pub use publish::{current_time_ms, run_publish_loop};
pub use session::PublisherAgent;
pub use state::{AgentAction, AgentSettings, AgentState, AgentStateMachine, PublishPlan};
