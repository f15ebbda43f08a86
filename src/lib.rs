//! Core library for the `brokerbench` CLI.
//!
//! A coordinator broadcasts run parameters over a publish/subscribe broker,
//! a fleet of publisher agents answers with sequenced, timestamped streams,
//! and the coordinator turns what it received into per-run loss, duplicate,
//! ordering and timing metrics. Sweeps over QoS, rate, payload size and
//! publisher count are checkpointed to CSV and JSON. The primary user-facing
//! interface is the `brokerbench` command-line application; library APIs may
//! evolve as the CLI grows.
pub mod agent;
pub mod args;
pub mod config;
pub mod coordinator;
pub mod domain;
pub mod error;
pub mod metrics;
pub mod protocol;
pub mod recorder;
pub mod shutdown;
pub mod shutdown_handlers;
pub mod sinks;
pub mod sweep;
pub mod transport;

#[cfg(feature = "fuzzing")]
pub mod fuzzing;
