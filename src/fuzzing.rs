use std::path::PathBuf;
use std::time::Duration;

use clap::{ArgMatches, CommandFactory, FromArgMatches};

use crate::args::{AnalyzeArgs, BenchArgs, Command};
use crate::config::apply_analyze_config;
use crate::config::parse_duration_value;
use crate::config::types::ConfigFile;
use crate::error::{AppError, AppResult, ConfigError};
use crate::protocol::{ControlMessage, DataMessage, SysValue, publisher_id_from_topic};
use crate::sinks::{ResultRow, parse_results_csv};
use crate::transport::topic_matches;

thread_local! {
    static BASE_MATCHES: ArgMatches =
        BenchArgs::command().get_matches_from(["brokerbench", "analyze"]);
}

/// Parses a duration value from config or the command line.
///
/// # Errors
///
/// Returns an error when the duration is invalid.
pub fn parse_duration_value_input(input: &str) -> AppResult<Duration> {
    parse_duration_value(input).map_err(AppError::from)
}

/// Parses a data message payload.
///
/// # Errors
///
/// Returns an error when the payload is not a valid data message.
pub fn parse_data_payload_input(payload: &[u8]) -> AppResult<DataMessage> {
    DataMessage::parse(payload).map_err(AppError::from)
}

/// Parses a control message received on `topic`.
///
/// # Errors
///
/// Returns an error when the topic or payload is not a valid control message.
pub fn parse_control_input(topic: &str, payload: &[u8]) -> AppResult<ControlMessage> {
    ControlMessage::parse(topic, payload).map_err(AppError::from)
}

/// Extracts the publisher id from a data topic.
///
/// # Errors
///
/// Returns an error when the topic does not carry a publisher id.
pub fn publisher_id_input(topic: &str) -> AppResult<u32> {
    publisher_id_from_topic(topic).map_err(AppError::from)
}

#[must_use]
pub fn sys_value_input(payload: &[u8]) -> SysValue {
    SysValue::parse(payload)
}

#[must_use]
pub fn topic_matches_input(filter: &str, topic: &str) -> bool {
    topic_matches(filter, topic)
}

/// Parses results CSV text.
///
/// # Errors
///
/// Returns an error when the header or a row is malformed.
pub fn parse_results_csv_input(text: &str) -> AppResult<Vec<ResultRow>> {
    parse_results_csv(text).map_err(AppError::from)
}

/// Parses TOML config and applies it to default `analyze` arguments.
///
/// # Errors
///
/// Returns an error when parsing or validation fails.
pub fn apply_config_from_toml(input: &str) -> AppResult<AnalyzeArgs> {
    let config: ConfigFile = toml::from_str(input).map_err(|err| {
        AppError::config(ConfigError::ParseToml {
            path: PathBuf::from("fuzz.toml"),
            source: err,
        })
    })?;
    apply_to_defaults(&config)
}

/// Parses JSON config and applies it to default `analyze` arguments.
///
/// # Errors
///
/// Returns an error when parsing or validation fails.
pub fn apply_config_from_json(input: &[u8]) -> AppResult<AnalyzeArgs> {
    let config: ConfigFile = serde_json::from_slice(input)?;
    apply_to_defaults(&config)
}

fn apply_to_defaults(config: &ConfigFile) -> AppResult<AnalyzeArgs> {
    BASE_MATCHES.with(|matches| {
        let args = BenchArgs::from_arg_matches(matches)?;
        let Command::Analyze(mut analyze) = args.command else {
            return Err(AppError::Clap {
                source: clap::Error::new(clap::error::ErrorKind::MissingSubcommand),
            });
        };
        let sub_matches = matches
            .subcommand_matches("analyze")
            .ok_or_else(|| AppError::Clap {
                source: clap::Error::new(clap::error::ErrorKind::MissingSubcommand),
            })?;
        apply_analyze_config(&mut analyze, sub_matches, config)?;
        Ok(analyze)
    })
}
