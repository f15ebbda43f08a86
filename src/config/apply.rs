use clap::ArgMatches;
use clap::parser::ValueSource;

use crate::args::{
    AnalyzeArgs, BrokerArgs, LocalArgs, PositiveU32, PositiveUsize, PublishArgs, SweepArgs,
    TimingArgs,
};
use crate::error::{AppError, AppResult, ConfigError};

use super::types::{ConfigFile, DurationValue, TimingConfig};

/// Applies config values to `analyze` arguments that were not given on the
/// command line.
///
/// # Errors
///
/// Returns an error when a config value is invalid.
pub fn apply_analyze_config(
    args: &mut AnalyzeArgs,
    matches: &ArgMatches,
    config: &ConfigFile,
) -> AppResult<()> {
    apply_broker(&mut args.broker, matches, config)?;
    if let Some(timing) = config.timing.as_ref() {
        apply_timing(&mut args.timing, matches, timing)?;
    }
    apply_sweep(&mut args.sweep, matches, config)
}

/// Applies config values to `publish` arguments that were not given on the
/// command line.
///
/// # Errors
///
/// Returns an error when a config value is invalid.
pub fn apply_publish_config(
    args: &mut PublishArgs,
    matches: &ArgMatches,
    config: &ConfigFile,
) -> AppResult<()> {
    apply_broker(&mut args.broker, matches, config)?;

    if !is_cli(matches, "instances")
        && let Some(instances) = config.instances
    {
        args.instances = ensure_positive_u32(instances, "instances")?;
    }

    if !is_cli(matches, "first_id")
        && let Some(first_id) = config.first_id
    {
        args.first_id = ensure_positive_u32(first_id, "first_id")?;
    }

    if !is_cli(matches, "run_duration")
        && let Some(duration) = config.timing.as_ref().and_then(|timing| timing.duration.as_ref())
    {
        args.run_duration = to_duration(duration, "timing.duration")?;
    }
    Ok(())
}

/// Applies config values to `local` arguments that were not given on the
/// command line. The broker address is ignored; `local` always runs its own.
///
/// # Errors
///
/// Returns an error when a config value is invalid.
pub fn apply_local_config(
    args: &mut LocalArgs,
    matches: &ArgMatches,
    config: &ConfigFile,
) -> AppResult<()> {
    if !is_cli(matches, "instances")
        && let Some(instances) = config.instances
    {
        args.instances = ensure_positive_u32(instances, "instances")?;
    }
    if let Some(timing) = config.timing.as_ref() {
        apply_timing(&mut args.timing, matches, timing)?;
    }
    apply_sweep(&mut args.sweep, matches, config)
}

fn apply_broker(args: &mut BrokerArgs, matches: &ArgMatches, config: &ConfigFile) -> AppResult<()> {
    if !is_cli(matches, "broker")
        && let Some(broker) = config.broker.clone()
    {
        args.broker = broker;
    }

    if !is_cli(matches, "connect_timeout")
        && let Some(timeout) = config.connect_timeout.as_ref()
    {
        args.connect_timeout = to_duration(timeout, "connect_timeout")?;
    }
    Ok(())
}

fn apply_timing(args: &mut TimingArgs, matches: &ArgMatches, config: &TimingConfig) -> AppResult<()> {
    if !is_cli(matches, "settle")
        && let Some(settle) = config.settle.as_ref()
    {
        args.settle = to_duration(settle, "timing.settle")?;
    }

    if !is_cli(matches, "run_duration")
        && let Some(duration) = config.duration.as_ref()
    {
        args.run_duration = to_duration(duration, "timing.duration")?;
    }

    if !is_cli(matches, "buffer")
        && let Some(buffer) = config.buffer.as_ref()
    {
        args.buffer = to_duration(buffer, "timing.buffer")?;
    }

    if !is_cli(matches, "cooldown")
        && let Some(cooldown) = config.cooldown.as_ref()
    {
        args.cooldown = to_duration(cooldown, "timing.cooldown")?;
    }
    Ok(())
}

fn apply_sweep(args: &mut SweepArgs, matches: &ArgMatches, config: &ConfigFile) -> AppResult<()> {
    if !is_cli(matches, "plan")
        && let Some(plan) = config.plan
    {
        args.plan = plan;
    }

    if !is_cli(matches, "checkpoint_every")
        && let Some(every) = config.checkpoint_every
    {
        args.checkpoint_every = PositiveUsize::try_from(every).map_err(|err| {
            AppError::config(ConfigError::FieldMustBePositive {
                field: "checkpoint_every",
                source: err,
            })
        })?;
    }

    if !is_cli(matches, "results_dir")
        && let Some(dir) = config.results_dir.clone()
    {
        args.results_dir = dir;
    }

    if let Some(grid) = config.grid.as_ref() {
        grid.validate().map_err(|err| {
            AppError::config(ConfigError::InvalidField {
                field: "grid",
                source: err,
            })
        })?;
        args.config_grid = Some(grid.clone());
    }
    Ok(())
}

fn to_duration(value: &DurationValue, field: &'static str) -> AppResult<std::time::Duration> {
    value
        .to_duration()
        .map_err(|err| AppError::config(ConfigError::InvalidDuration { field, source: err }))
}

fn ensure_positive_u32(value: u32, field: &'static str) -> AppResult<PositiveU32> {
    PositiveU32::try_from(value).map_err(|err| {
        AppError::config(ConfigError::FieldMustBePositive { field, source: err })
    })
}

fn is_cli(matches: &ArgMatches, id: &str) -> bool {
    matches!(matches.value_source(id), Some(ValueSource::CommandLine))
}
