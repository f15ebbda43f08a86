//! Run parameters shared by the coordinator, the publisher agents, and the
//! metrics engine.
mod run;


pub use run::{QosLevel, RunParameters, RunTimings, StreamShape};
