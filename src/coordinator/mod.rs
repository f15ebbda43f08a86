//! Drives one parameterised run over the broker.
mod run;

#[cfg(test)]
mod tests;

pub use run::{ANALYZER_CLIENT_ID, Coordinator, RunExecutor};
