//! Kernel parameters under /proc/sys.

use super::{CheckError, CheckFailure, OsQuery};
use crate::config::spec::Spec;
use crate::kernel::SystemState;

/// Every declared key must read back the declared value.
pub fn validate_sysctl(spec: &Spec, state: &dyn SystemState) -> Result<(), CheckFailure> {
    let sysctl = match spec.linux.as_ref() {
        Some(linux) => &linux.sysctl,
        None => return Ok(()),
    };

    let mut failure = CheckFailure::new();
    for (key, expected) in sysctl {
        let actual = state.sysctl(key).query(format!("sysctl {}", key))?;
        if &actual != expected {
            failure.push(CheckError::mismatch(format!("sysctl {}", key), expected, actual));
        }
    }
    failure.into_result()
}
