use tracing::info;

use super::session::mqtt_connector;
use crate::agent::{publisher_ids, run_fleet};
use crate::args::PublishArgs;
use crate::error::AppResult;
use crate::shutdown::ShutdownSender;

pub(crate) async fn run_publish(args: PublishArgs, shutdown_tx: &ShutdownSender) -> AppResult<()> {
    let connector = mqtt_connector(&args.broker.broker, args.broker.connect_timeout)?;
    let ids = publisher_ids(args.first_id.get(), args.instances.get())?;
    info!(
        "Starting publishers {:?} against {} (Ctrl+C to stop)",
        ids, args.broker.broker
    );
    run_fleet(&connector, &ids, args.run_duration, shutdown_tx).await
}
