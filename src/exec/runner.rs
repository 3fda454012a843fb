//! Validation runner
//!
//! Walks the registry in order against one live system. Each check sees the
//! same document; nothing a check learns is shared with the next one.

use crate::checks::{registry, Check, CheckFailure};
use crate::config::spec::Spec;
use crate::config::types::ComplianceLevel;
use crate::kernel::SystemState;

/// What happened to one registry entry.
#[derive(Debug)]
pub enum Outcome {
    Pass,
    Skip(String),
    Fail(CheckFailure),
}

impl Outcome {
    pub fn is_fail(&self) -> bool {
        matches!(self, Outcome::Fail(_))
    }
}

#[derive(Debug)]
pub struct CheckResult {
    pub description: &'static str,
    pub level: ComplianceLevel,
    pub outcome: Outcome,
}

fn run_one(check: &Check, spec: &Spec, state: &dyn SystemState) -> CheckResult {
    let platform = spec.target_platform();
    let outcome = if !(check.applies)(&platform) {
        Outcome::Skip(format!("not applicable to {}", platform))
    } else {
        log::debug!("Running check: {}", check.description);
        match (check.run)(spec, state) {
            Ok(()) => Outcome::Pass,
            Err(failure) if failure.is_unsupported() => Outcome::Skip(failure.to_string()),
            Err(failure) => {
                log::debug!("Check {} failed: {}", check.description, failure);
                Outcome::Fail(failure)
            }
        }
    };

    CheckResult {
        description: check.description,
        level: check.level,
        outcome,
    }
}

/// Run the given checks in order.
pub fn run_registry(checks: &[Check], spec: &Spec, state: &dyn SystemState) -> Vec<CheckResult> {
    checks.iter().map(|c| run_one(c, spec, state)).collect()
}

/// Run the full registry.
pub fn run_checks(spec: &Spec, state: &dyn SystemState) -> Vec<CheckResult> {
    let results = run_registry(&registry(), spec, state);
    let failed = results.iter().filter(|r| r.outcome.is_fail()).count();
    log::info!("Ran {} checks, {} failed", results.len(), failed);
    results
}
