//! Parameter sweeps: which runs to execute and how results are checkpointed.
mod driver;
mod grid;


pub use driver::{RecordSink, SweepOutcome, run_sweep};
pub use grid::{SweepGrid, SweepPlan, handshake_runs};
