use std::num::NonZeroU32;
use std::time::Duration;

use clap::Parser;

use super::*;
use crate::domain::{QosLevel, RunTimings};
use crate::sweep::{SweepGrid, SweepPlan};

fn parse(argv: &[&str]) -> Result<BenchArgs, String> {
    BenchArgs::try_parse_from(argv).map_err(|err| format!("parse failed: {}", err))
}

#[test]
fn analyze_defaults_match_reference_timings() -> Result<(), String> {
    let args = parse(&["brokerbench", "analyze"])?;
    let Command::Analyze(analyze) = args.command else {
        return Err("Expected analyze".to_owned());
    };
    if analyze.timing.timings() != RunTimings::default() {
        return Err(format!("Unexpected timings: {:?}", analyze.timing.timings()));
    }
    if analyze.broker.broker != "localhost" || analyze.broker.connect_timeout != Duration::from_secs(10) {
        return Err(format!("Unexpected broker args: {:?}", analyze.broker));
    }
    if analyze.sweep.plan != SweepPlan::Full
        || analyze.sweep.checkpoint_every.get() != 10
        || analyze.sweep.results_dir != "results"
        || !analyze.sweep.grid.is_empty()
    {
        return Err(format!("Unexpected sweep args: {:?}", analyze.sweep));
    }
    Ok(())
}

#[test]
fn global_flags_work_after_subcommand() -> Result<(), String> {
    let args = parse(&["brokerbench", "publish", "--verbose", "--no-color", "--config", "x.toml"])?;
    if !args.verbose || !args.no_color || args.config.as_deref() != Some("x.toml") {
        return Err(format!("Global flags not parsed: {:?}", args));
    }
    let Command::Publish(publish) = args.command else {
        return Err("Expected publish".to_owned());
    };
    if publish.instances.get() != 10 || publish.first_id.get() != 1 {
        return Err(format!("Unexpected publish defaults: {:?}", publish));
    }
    Ok(())
}

#[test]
fn grid_overrides_parse_comma_lists() -> Result<(), String> {
    let args = parse(&[
        "brokerbench",
        "local",
        "--plan",
        "custom",
        "--qos",
        "0,2",
        "--delays",
        "0,10,100",
        "--counts",
        "1,3",
    ])?;
    let Command::Local(local) = args.command else {
        return Err("Expected local".to_owned());
    };
    let mut grid = SweepGrid::reduced();
    local.sweep.grid.apply_to(&mut grid);
    if grid.qos != vec![QosLevel::AtMostOnce, QosLevel::ExactlyOnce]
        || grid.delays != vec![0, 10, 100]
        || grid.instance_counts
            != [1, 3].iter().copied().filter_map(NonZeroU32::new).collect::<Vec<_>>()
    {
        return Err(format!("Unexpected grid: {:?}", grid));
    }
    if grid.sub_qos != vec![QosLevel::AtMostOnce] {
        return Err("Axes not given must stay untouched".to_owned());
    }
    Ok(())
}

#[test]
fn invalid_values_are_rejected() -> Result<(), String> {
    let cases: [&[&str]; 5] = [
        &["brokerbench", "analyze", "--qos", "3"],
        &["brokerbench", "analyze", "--counts", "0"],
        &["brokerbench", "analyze", "--checkpoint-every", "0"],
        &["brokerbench", "publish", "--instances", "0"],
        &["brokerbench", "local", "--duration", "0s"],
    ];
    for argv in cases {
        if BenchArgs::try_parse_from(argv).is_ok() {
            return Err(format!("Expected rejection of {:?}", argv));
        }
    }
    Ok(())
}

#[test]
fn report_takes_a_path() -> Result<(), String> {
    let args = parse(&["brokerbench", "report", "results/run.csv", "--matched-qos"])?;
    let Command::Report(report) = args.command else {
        return Err("Expected report".to_owned());
    };
    if report.path != std::path::Path::new("results/run.csv") || !report.matched_qos {
        return Err(format!("Unexpected report args: {:?}", report));
    }
    Ok(())
}

#[test]
fn positive_types_reject_zero() -> Result<(), String> {
    if "0".parse::<PositiveU32>().is_ok() || "0".parse::<PositiveUsize>().is_ok() {
        return Err("Zero must be rejected".to_owned());
    }
    let value = " 7 ".parse::<PositiveU32>().map_err(|err| err.to_string())?;
    if value.get() != 7 {
        return Err(format!("Unexpected value: {}", value.get()));
    }
    Ok(())
}
