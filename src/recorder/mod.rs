//! Per-run accumulation of inbound traffic.
mod context;
mod stream;

#[cfg(test)]
mod tests;

pub use context::{IngestOutcome, RunContext};
pub use stream::{ObservedStream, PublisherStream};
