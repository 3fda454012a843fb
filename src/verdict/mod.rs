//! Compliance grading and reporting
//!
//! Turns per-check outcomes into a run verdict and renders it.

pub mod grade;
pub mod report;

pub use grade::{grade, FatalFailure, MultiError, RunResult};
