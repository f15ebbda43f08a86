//! On-disk results: one CSV row per run plus the per-run system metrics.
mod csv;
mod format;
mod json;
mod store;


pub use csv::{RESULTS_HEADER, ResultRow, parse_results_csv, read_results_csv, render_results_csv};
pub use json::render_sys_metrics;
pub use store::ResultStore;
