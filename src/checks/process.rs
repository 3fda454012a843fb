//! Identity, environment and resource checks of the calling process.

use super::{CheckError, CheckFailure, OsQuery};
use crate::config::spec::{Process, Spec};
use crate::kernel::resources::is_known_rlimit;
use crate::kernel::SystemState;
use std::ffi::OsStr;

fn process(spec: &Spec) -> Option<&Process> {
    spec.process.as_ref()
}

pub fn validate_uid(spec: &Spec, state: &dyn SystemState) -> Result<(), CheckFailure> {
    let expected = match process(spec) {
        Some(p) => p.user.uid,
        None => return Ok(()),
    };
    let actual = state.uid();
    if actual != expected {
        return Err(CheckError::mismatch("UID", expected, actual).into());
    }
    Ok(())
}

pub fn validate_gid(spec: &Spec, state: &dyn SystemState) -> Result<(), CheckFailure> {
    let expected = match process(spec) {
        Some(p) => p.user.gid,
        None => return Ok(()),
    };
    let actual = state.gid();
    if actual != expected {
        return Err(CheckError::mismatch("GID", expected, actual).into());
    }
    Ok(())
}

/// Declared additional gids must all be among the live groups.
pub fn validate_additional_gids(spec: &Spec, state: &dyn SystemState) -> Result<(), CheckFailure> {
    let declared = match process(spec) {
        Some(p) if !p.user.additional_gids.is_empty() => &p.user.additional_gids,
        _ => return Ok(()),
    };

    let groups = state.groups().query("supplementary groups")?;
    let mut failure = CheckFailure::new();
    for gid in declared.iter().filter(|g| !groups.contains(g)) {
        failure.push(CheckError::violation(format!(
            "expected supplementary group {} is missing",
            gid
        )));
    }
    failure.into_result()
}

pub fn validate_cwd(spec: &Spec, state: &dyn SystemState) -> Result<(), CheckFailure> {
    let expected = match process(spec) {
        Some(p) if !p.cwd.is_empty() => &p.cwd,
        _ => return Ok(()),
    };
    let actual = state.cwd().query("working directory")?;
    if actual.as_os_str() != OsStr::new(expected) {
        return Err(CheckError::mismatch("Cwd", expected, actual.display()).into());
    }
    Ok(())
}

/// Positional comparison with the live argument vector; a length mismatch
/// is reported before any per-position difference.
pub fn validate_args(spec: &Spec, state: &dyn SystemState) -> Result<(), CheckFailure> {
    let expected = match process(spec) {
        Some(p) => &p.args,
        None => return Ok(()),
    };
    let actual = state.args().query("process arguments")?;

    if actual.len() != expected.len() {
        return Err(
            CheckError::mismatch("Process arguments length", expected.len(), actual.len()).into(),
        );
    }

    let mut failure = CheckFailure::new();
    for (i, (want, got)) in expected.iter().zip(&actual).enumerate() {
        if want != got {
            failure.push(CheckError::mismatch(format!("Process arguments[{}]", i), want, got));
        }
    }
    failure.into_result()
}

/// Each declared `KEY=VALUE` must match the live variable; unset reads as
/// empty.
pub fn validate_env(spec: &Spec, state: &dyn SystemState) -> Result<(), CheckFailure> {
    let env = match process(spec) {
        Some(p) => &p.env,
        None => return Ok(()),
    };

    let mut failure = CheckFailure::new();
    for entry in env {
        let (key, expected) = entry.split_once('=').unwrap_or((entry.as_str(), ""));
        let actual = state.env_var(key).unwrap_or_default();
        if actual != expected {
            failure.push(CheckError::mismatch(
                format!("Env {}", key),
                expected,
                actual,
            ));
        }
    }
    failure.into_result()
}

pub fn validate_no_new_privileges(
    spec: &Spec,
    state: &dyn SystemState,
) -> Result<(), CheckFailure> {
    let expected = match process(spec) {
        Some(p) => p.no_new_privileges,
        None => return Ok(()),
    };
    let actual = state.no_new_privs().query("no_new_privs flag")?;
    if actual != expected {
        return Err(CheckError::mismatch("NoNewPrivileges", expected, actual).into());
    }
    Ok(())
}

pub fn validate_hostname(spec: &Spec, state: &dyn SystemState) -> Result<(), CheckFailure> {
    let expected = match spec.hostname.as_deref() {
        Some(h) if !h.is_empty() => h,
        _ => return Ok(()),
    };
    let actual = state.hostname().query("hostname")?;
    if actual != expected {
        return Err(CheckError::mismatch("Hostname", expected, actual).into());
    }
    Ok(())
}

/// Soft and hard values of every declared limit.
pub fn validate_rlimits(spec: &Spec, state: &dyn SystemState) -> Result<(), CheckFailure> {
    let rlimits = match process(spec) {
        Some(p) => &p.rlimits,
        None => return Ok(()),
    };

    let mut failure = CheckFailure::new();
    for rlimit in rlimits {
        if !is_known_rlimit(&rlimit.kind) {
            failure.push(CheckError::UnknownRlimit(rlimit.kind.clone()));
            continue;
        }
        let (soft, hard) = state.rlimit(&rlimit.kind).query(&rlimit.kind)?;
        if soft != rlimit.soft {
            failure.push(CheckError::mismatch(
                format!("{} soft limit", rlimit.kind),
                rlimit.soft,
                soft,
            ));
        }
        if hard != rlimit.hard {
            failure.push(CheckError::mismatch(
                format!("{} hard limit", rlimit.kind),
                rlimit.hard,
                hard,
            ));
        }
    }
    failure.into_result()
}

pub fn validate_oom_score_adj(spec: &Spec, state: &dyn SystemState) -> Result<(), CheckFailure> {
    let expected = match spec.oom_score_adj() {
        Some(score) => score,
        None => return Ok(()),
    };
    let actual = state.oom_score_adj().query("oom_score_adj")?;
    if actual != expected {
        return Err(CheckError::mismatch("oom_score_adj", expected, actual).into());
    }
    Ok(())
}
