//! TAP-style report and stderr summary.

use super::grade::{MultiError, RunResult};
use crate::exec::runner::{CheckResult, Outcome};
use std::io::{self, Write};

fn line(number: usize, result: &CheckResult) -> String {
    match &result.outcome {
        Outcome::Pass => format!("ok {} - {}", number, result.description),
        Outcome::Skip(reason) => {
            format!("ok {} - {} # SKIP {}", number, result.description, reason)
        }
        Outcome::Fail(failure) => format!(
            "not ok {} - {} # {}: {}",
            number, result.description, result.level, failure
        ),
    }
}

/// One line per check followed by the plan line.
pub fn write_report<W: Write>(out: &mut W, run: &RunResult) -> io::Result<()> {
    for (i, result) in run.results.iter().enumerate() {
        writeln!(out, "{}", line(i + 1, result))?;
    }
    writeln!(out, "1..{}", run.results.len())
}

pub fn write_summary<W: Write>(out: &mut W, error: &MultiError) -> io::Result<()> {
    writeln!(out, "{}:", error)?;
    for failure in &error.failures {
        writeln!(
            out,
            "  {} {} [{}]: {}",
            failure.number, failure.description, failure.level, failure.message
        )?;
    }
    Ok(())
}
