//! Job lifecycle tracking and background pipeline driving.

pub mod ledger;
pub mod runner;

pub use ledger::JobLedger;
pub use runner::{JobService, friendly_error, spawn_retention_sweep};
