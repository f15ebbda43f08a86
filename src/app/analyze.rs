use tracing::info;

use super::session::{mqtt_connector, run_analysis};
use crate::args::AnalyzeArgs;
use crate::error::AppResult;
use crate::shutdown::ShutdownSender;

pub(crate) async fn run_analyze(args: AnalyzeArgs, shutdown_tx: &ShutdownSender) -> AppResult<()> {
    let connector = mqtt_connector(&args.broker.broker, args.broker.connect_timeout)?;
    info!("Coordinating sweep on {}", args.broker.broker);
    run_analysis(&connector, args.timing.timings(), &args.sweep, shutdown_tx).await?;
    Ok(())
}
