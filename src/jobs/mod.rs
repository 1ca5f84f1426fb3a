//! Batch jobs: commission recalculation, scheduled-change execution, and the
//! periodic scheduler that drives both.

pub mod recalculation;
pub mod scheduled_changes;
pub mod scheduler;

pub use recalculation::{recalculate_commissions, RecalculationReport};
pub use scheduled_changes::{execute_scheduled_changes, ExecutionReport};
pub use scheduler::JobScheduler;
