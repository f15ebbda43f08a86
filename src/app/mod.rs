mod analyze;
mod local;
mod publish;
mod report;
mod session;


pub(crate) use analyze::run_analyze;
pub(crate) use local::run_local;
pub(crate) use publish::run_publish;
pub(crate) use report::run_report;
