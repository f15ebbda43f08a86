mod app;
mod entry;
mod logger;

use brokerbench::{
    agent, args, config, coordinator, domain, error, protocol, shutdown,
    shutdown_handlers, sinks, sweep, transport,
};

use error::AppResult;

fn main() -> AppResult<()> {
    entry::run()
}
