//! Execution control
//!
//! Runs the check registry and collects one result per entry.

pub mod runner;

pub use runner::{run_checks, run_registry, CheckResult, Outcome};
