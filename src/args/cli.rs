use std::num::NonZeroU32;
use std::path::PathBuf;
use std::time::Duration;

use clap::{Args, Parser, Subcommand};

use crate::domain::{QosLevel, RunTimings};
use crate::sweep::{SweepGrid, SweepPlan};

use super::parsers::{
    parse_duration_arg, parse_positive_u32, parse_positive_usize, parse_publisher_count,
    parse_qos_arg,
};
use super::types::{PositiveU32, PositiveUsize};

#[derive(Debug, Parser, Clone)]
#[clap(
    version,
    about = "Publish/subscribe broker benchmark: sweeps QoS, rate, payload size and publisher count, and records loss, duplication, ordering and timing per run."
)]
pub struct BenchArgs {
    #[command(subcommand)]
    pub command: Command,

    /// Enable debug logging (overridden by BROKERBENCH_LOG / RUST_LOG)
    #[arg(long, short = 'v', global = true)]
    pub verbose: bool,

    /// Disable colored log output
    #[arg(long = "no-color", global = true)]
    pub no_color: bool,

    /// Path to config file (TOML or JSON); defaults to ./brokerbench.toml or ./brokerbench.json
    #[arg(long, global = true)]
    pub config: Option<String>,
}

#[derive(Debug, Subcommand, Clone)]
pub enum Command {
    /// Coordinate a sweep against a running broker and record the results
    Analyze(AnalyzeArgs),
    /// Run the publisher fleet that answers the coordinator's broadcasts
    Publish(PublishArgs),
    /// Run the publishers and a sweep in one process over an in-process broker
    Local(LocalArgs),
    /// Print a results CSV as a table
    Report(ReportArgs),
}

#[derive(Debug, Args, Clone)]
pub struct BrokerArgs {
    /// Broker address: host, host:port or mqtt://host:port
    #[arg(long, short = 'b', default_value = "localhost")]
    pub broker: String,

    /// Give up connecting after this long (supports ms/s/m/h)
    #[arg(long = "connect-timeout", default_value = "10s", value_parser = parse_duration_arg)]
    pub connect_timeout: Duration,
}

#[derive(Debug, Args, Clone)]
pub struct TimingArgs {
    /// Wait between the parameter broadcast and the start signal
    #[arg(long = "settle", default_value = "1s", value_parser = parse_duration_arg)]
    pub settle: Duration,

    /// Publishing window of every run
    #[arg(long = "duration", short = 't', default_value = "30s", value_parser = parse_duration_arg)]
    pub run_duration: Duration,

    /// Extra listening time after the publishing window
    #[arg(long = "buffer", default_value = "2s", value_parser = parse_duration_arg)]
    pub buffer: Duration,

    /// Pause between runs
    #[arg(long = "cooldown", default_value = "2s", value_parser = parse_duration_arg)]
    pub cooldown: Duration,
}

impl TimingArgs {
    #[must_use]
    pub const fn timings(&self) -> RunTimings {
        RunTimings {
            settle: self.settle,
            run_duration: self.run_duration,
            buffer: self.buffer,
            cooldown: self.cooldown,
        }
    }
}

/// Axis overrides applied on top of the selected plan's grid.
#[derive(Debug, Args, Clone, Default)]
pub struct GridArgs {
    /// Subscriber QoS levels (comma separated)
    #[arg(long = "sub-qos", value_delimiter = ',', value_parser = parse_qos_arg)]
    pub sub_qos: Vec<QosLevel>,

    /// Publisher QoS levels (comma separated)
    #[arg(long = "qos", value_delimiter = ',', value_parser = parse_qos_arg)]
    pub qos: Vec<QosLevel>,

    /// Inter-message delays in milliseconds (comma separated)
    #[arg(long = "delays", value_delimiter = ',')]
    pub delays: Vec<u64>,

    /// Payload filler sizes in bytes (comma separated)
    #[arg(long = "sizes", value_delimiter = ',')]
    pub message_sizes: Vec<usize>,

    /// Active publisher counts (comma separated)
    #[arg(long = "counts", value_delimiter = ',', value_parser = parse_publisher_count)]
    pub instance_counts: Vec<NonZeroU32>,
}

impl GridArgs {
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.sub_qos.is_empty()
            && self.qos.is_empty()
            && self.delays.is_empty()
            && self.message_sizes.is_empty()
            && self.instance_counts.is_empty()
    }

    /// Replaces every axis of `grid` that was given on the command line.
    pub fn apply_to(&self, grid: &mut SweepGrid) {
        if !self.sub_qos.is_empty() {
            grid.sub_qos.clone_from(&self.sub_qos);
        }
        if !self.qos.is_empty() {
            grid.qos.clone_from(&self.qos);
        }
        if !self.delays.is_empty() {
            grid.delays.clone_from(&self.delays);
        }
        if !self.message_sizes.is_empty() {
            grid.message_sizes.clone_from(&self.message_sizes);
        }
        if !self.instance_counts.is_empty() {
            grid.instance_counts.clone_from(&self.instance_counts);
        }
    }
}

#[derive(Debug, Args, Clone)]
pub struct SweepArgs {
    /// Which runs to execute
    #[arg(long, value_enum, default_value = "full")]
    pub plan: SweepPlan,

    /// Save results after every N completed runs
    #[arg(long = "checkpoint-every", default_value = "10", value_parser = parse_positive_usize)]
    pub checkpoint_every: PositiveUsize,

    /// Directory for the results CSV and system metrics JSON
    #[arg(long = "results-dir", default_value = "results")]
    pub results_dir: String,

    #[command(flatten)]
    pub grid: GridArgs,

    /// Grid from the config file (`[grid]`), set when the config is applied
    #[arg(skip)]
    pub config_grid: Option<SweepGrid>,
}

#[derive(Debug, Args, Clone)]
pub struct AnalyzeArgs {
    #[command(flatten)]
    pub broker: BrokerArgs,

    #[command(flatten)]
    pub timing: TimingArgs,

    #[command(flatten)]
    pub sweep: SweepArgs,
}

#[derive(Debug, Args, Clone)]
pub struct PublishArgs {
    #[command(flatten)]
    pub broker: BrokerArgs,

    /// Number of publisher instances to start
    #[arg(long = "instances", short = 'n', default_value = "10", value_parser = parse_positive_u32)]
    pub instances: PositiveU32,

    /// Instance id of the first publisher
    #[arg(long = "first-id", default_value = "1", value_parser = parse_positive_u32)]
    pub first_id: PositiveU32,

    /// How long each stream publishes after a start signal
    #[arg(long = "duration", short = 't', default_value = "30s", value_parser = parse_duration_arg)]
    pub run_duration: Duration,
}

#[derive(Debug, Args, Clone)]
pub struct LocalArgs {
    /// Number of publisher instances to start
    #[arg(long = "instances", short = 'n', default_value = "10", value_parser = parse_positive_u32)]
    pub instances: PositiveU32,

    #[command(flatten)]
    pub timing: TimingArgs,

    #[command(flatten)]
    pub sweep: SweepArgs,
}

#[derive(Debug, Args, Clone)]
pub struct ReportArgs {
    /// Results CSV written by `analyze` or `local`
    pub path: PathBuf,

    /// Only show runs whose subscriber QoS equals the publisher QoS
    #[arg(long = "matched-qos")]
    pub matched_qos: bool,
}
