//! Compliance grading
//!
//! Failures at or above the requested level are fatal; weaker failures are
//! still reported but do not change the exit status.

use crate::config::types::ComplianceLevel;
use crate::exec::runner::{CheckResult, Outcome};
use thiserror::Error;

/// One failure that counts against the run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FatalFailure {
    /// 1-based position in the report.
    pub number: usize,
    pub description: &'static str,
    pub level: ComplianceLevel,
    pub message: String,
}

/// All fatal failures of one run, combined.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("{} fatal failure(s)", .failures.len())]
pub struct MultiError {
    pub failures: Vec<FatalFailure>,
}

#[derive(Debug)]
pub struct RunResult {
    pub results: Vec<CheckResult>,
    pub error: Option<MultiError>,
}

impl RunResult {
    pub fn is_success(&self) -> bool {
        self.error.is_none()
    }
}

/// Keep failures whose level is at least `minimum`.
pub fn grade(results: Vec<CheckResult>, minimum: ComplianceLevel) -> RunResult {
    let failures: Vec<FatalFailure> = results
        .iter()
        .enumerate()
        .filter(|(_, r)| r.level >= minimum)
        .filter_map(|(i, r)| match &r.outcome {
            Outcome::Fail(failure) => Some(FatalFailure {
                number: i + 1,
                description: r.description,
                level: r.level,
                message: failure.to_string(),
            }),
            _ => None,
        })
        .collect();

    let error = if failures.is_empty() {
        None
    } else {
        Some(MultiError { failures })
    };
    RunResult { results, error }
}
