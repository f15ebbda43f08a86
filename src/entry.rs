use std::ffi::OsString;

use clap::{ArgMatches, CommandFactory, FromArgMatches};

use crate::app::{run_analyze, run_local, run_publish, run_report};
use crate::args::{BenchArgs, Command};
use crate::config::{
    apply_analyze_config, apply_local_config, apply_publish_config, load_config,
};
use crate::error::AppResult;
use crate::shutdown::ShutdownSender;
use crate::shutdown_handlers::{setup_signal_shutdown_handler, shutdown_channel};

pub(crate) fn run() -> AppResult<()> {
    let (mut args, matches) = match parse_args()? {
        Some(parsed) => parsed,
        None => return Ok(()),
    };

    crate::logger::init_logging(args.verbose, args.no_color);
    apply_config(&mut args, &matches)?;

    let runtime = tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .build()?;

    runtime.block_on(run_async(args))
}

fn parse_args() -> AppResult<Option<(BenchArgs, ArgMatches)>> {
    let mut cmd = BenchArgs::command();
    let raw_args: Vec<OsString> = std::env::args_os().collect();

    if matches!(raw_args.as_slice(), [] | [_]) {
        cmd.print_help()?;
        println!();
        return Ok(None);
    }

    let matches = cmd.get_matches_from(raw_args);
    let args = BenchArgs::from_arg_matches(&matches)?;
    Ok(Some((args, matches)))
}

fn apply_config(args: &mut BenchArgs, matches: &ArgMatches) -> AppResult<()> {
    if matches!(args.command, Command::Report(_)) {
        return Ok(());
    }
    let Some(config) = load_config(args.config.as_deref())? else {
        return Ok(());
    };
    let Some((_, sub_matches)) = matches.subcommand() else {
        return Ok(());
    };
    match &mut args.command {
        Command::Analyze(analyze) => apply_analyze_config(analyze, sub_matches, &config),
        Command::Publish(publish) => apply_publish_config(publish, sub_matches, &config),
        Command::Local(local) => apply_local_config(local, sub_matches, &config),
        Command::Report(_) => Ok(()),
    }
}

async fn run_async(args: BenchArgs) -> AppResult<()> {
    let (shutdown_tx, _) = shutdown_channel();
    let signal_handle = setup_signal_shutdown_handler(&shutdown_tx);
    let result = execute(args.command, &shutdown_tx).await;
    stop_signal_handler(&shutdown_tx, signal_handle).await;
    if let Err(err) = &result {
        tracing::error!("{}", err);
    }
    result
}

async fn execute(command: Command, shutdown_tx: &ShutdownSender) -> AppResult<()> {
    match command {
        Command::Analyze(args) => run_analyze(args, shutdown_tx).await,
        Command::Publish(args) => run_publish(args, shutdown_tx).await,
        Command::Local(args) => run_local(args, shutdown_tx).await,
        Command::Report(args) => run_report(args).await,
    }
}

async fn stop_signal_handler(shutdown_tx: &ShutdownSender, handle: tokio::task::JoinHandle<()>) {
    if shutdown_tx.send(()).is_err() {
        handle.abort();
    }
    if let Err(err) = handle.await
        && !err.is_cancelled()
    {
        tracing::debug!("Signal handler ended abnormally: {}", err);
    }
}
