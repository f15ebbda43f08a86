//! CLI argument types and parsing helpers.
mod cli;
pub(crate) mod parsers;
mod types;

#[cfg(test)]
mod tests;

pub use cli::{
    AnalyzeArgs, BenchArgs, BrokerArgs, Command, GridArgs, LocalArgs, PublishArgs, ReportArgs,
    SweepArgs, TimingArgs,
};
pub use types::{PositiveU32, PositiveUsize};
