//! User namespace id mappings.

use super::{CheckError, CheckFailure, OsQuery};
use crate::config::spec::{IdMapping, Spec};
use crate::kernel::idmap::IdMapKind;
use crate::kernel::SystemState;

fn validate_mappings(
    kind: IdMapKind,
    declared: &[IdMapping],
    state: &dyn SystemState,
) -> Result<(), CheckFailure> {
    if declared.is_empty() {
        return Ok(());
    }

    let live = state
        .id_map(kind)
        .query(format!("{} mappings", kind.name()))?;
    if live.len() != declared.len() {
        return Err(CheckError::mismatch(
            format!("{} mappings count", kind.name()),
            declared.len(),
            live.len(),
        )
        .into());
    }

    let mut failure = CheckFailure::new();
    for mapping in declared.iter().filter(|m| !live.contains(m)) {
        failure.push(CheckError::violation(format!(
            "{} mapping hostID {} containerID {} size {} not found",
            kind.name(),
            mapping.host_id,
            mapping.container_id,
            mapping.size
        )));
    }
    failure.into_result()
}

pub fn validate_uid_mappings(spec: &Spec, state: &dyn SystemState) -> Result<(), CheckFailure> {
    let declared = spec.linux.as_ref().map_or(&[][..], |l| &l.uid_mappings[..]);
    validate_mappings(IdMapKind::Uid, declared, state)
}

pub fn validate_gid_mappings(spec: &Spec, state: &dyn SystemState) -> Result<(), CheckFailure> {
    let declared = spec.linux.as_ref().map_or(&[][..], |l| &l.gid_mappings[..]);
    validate_mappings(IdMapKind::Gid, declared, state)
}
