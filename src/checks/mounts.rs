//! Declared mounts against the live mount table.

use super::{CheckError, CheckFailure, OsQuery};
use crate::config::spec::Spec;
use crate::kernel::mount::MountRecord;
use crate::kernel::SystemState;
use crate::utils::path::{clean, is_strict_ancestor};

/// Every non-bind mount must appear with the same type and source.
pub fn validate_mounts_exist(spec: &Spec, state: &dyn SystemState) -> Result<(), CheckFailure> {
    let live = state.mounts().query("mount table")?;
    let mut failure = CheckFailure::new();

    for mount in spec.mounts.iter().filter(|m| !m.is_bind()) {
        let destination = clean(&mount.destination);
        let source = clean(&mount.source);

        let at_destination: Vec<&MountRecord> = live
            .iter()
            .filter(|r| clean(&r.mountpoint) == destination)
            .collect();
        let found = at_destination
            .iter()
            .any(|r| r.fstype == mount.kind && clean(&r.source) == source);
        if found {
            continue;
        }

        let actual = match at_destination.last() {
            Some(r) => format!("type {}, source {}", r.fstype, r.source),
            None => "not mounted".to_string(),
        };
        failure.push(CheckError::mismatch(
            format!("mount {}", destination),
            format!("type {}, source {}", mount.kind, source),
            actual,
        ));
    }

    failure.into_result()
}

/// First (ancestor, descendant) index pair among `destinations`, scanning
/// ancestors in declared order and then descendants in declared order.
fn find_nested_pair(destinations: &[String]) -> Option<(usize, usize)> {
    destinations.iter().enumerate().find_map(|(a, ancestor)| {
        destinations
            .iter()
            .position(|d| is_strict_ancestor(ancestor, d))
            .map(|b| (a, b))
    })
}

/// `path` is mounted and nothing mounted after it sits at one of its
/// ancestors.
fn is_active_mountpoint(live: &[MountRecord], path: &str) -> bool {
    let last = match live.iter().rposition(|r| clean(&r.mountpoint) == path) {
        Some(i) => i,
        None => return false,
    };
    !live[last + 1..]
        .iter()
        .any(|r| is_strict_ancestor(&clean(&r.mountpoint), path))
}

fn activity(active: bool) -> &'static str {
    if active {
        "active"
    } else {
        "shadowed"
    }
}

/// Nested mounts must stack in declaration order.
///
/// For the first nested pair the ancestor must always be active. The
/// descendant must be active when it was declared after the ancestor and
/// shadowed when it was declared before.
pub fn validate_mount_order(spec: &Spec, state: &dyn SystemState) -> Result<(), CheckFailure> {
    let platform = spec.target_platform();
    if !platform.has_stacked_mounts() {
        return Err(CheckError::Unsupported(platform.to_string()).into());
    }

    let destinations: Vec<String> = spec.mounts.iter().map(|m| clean(&m.destination)).collect();
    let (a, b) = match find_nested_pair(&destinations) {
        Some(pair) => pair,
        None => return Ok(()),
    };
    let ancestor = &destinations[a];
    let descendant = &destinations[b];
    log::debug!("Checking mount order of {} and {}", ancestor, descendant);

    let live = state.mounts().query("mount table")?;
    let mut failure = CheckFailure::new();

    if !is_active_mountpoint(&live, ancestor) {
        failure.push(CheckError::mismatch(
            format!("mount order: {} (ancestor of {})", ancestor, descendant),
            activity(true),
            activity(false),
        ));
    }

    let ancestor_first = a < b;
    let descendant_active = is_active_mountpoint(&live, descendant);
    if descendant_active != ancestor_first {
        let relation = if ancestor_first { "after" } else { "before" };
        failure.push(CheckError::mismatch(
            format!(
                "mount order: {} (declared {} {})",
                descendant, relation, ancestor
            ),
            activity(ancestor_first),
            activity(descendant_active),
        ));
    }

    failure.into_result()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::spec::{Mount, PlatformSpec};
    use crate::testing::{FakeSystem, Query};

    fn mount(destination: &str, kind: &str, source: &str) -> Mount {
        Mount {
            destination: destination.into(),
            kind: kind.into(),
            source: source.into(),
            options: Vec::new(),
        }
    }

    fn spec_with(mounts: Vec<Mount>) -> Spec {
        Spec {
            mounts,
            ..Default::default()
        }
    }

    fn live(paths: &[&str]) -> FakeSystem {
        FakeSystem {
            mounts: paths
                .iter()
                .map(|p| MountRecord::new(p, "tmpfs", "tmpfs"))
                .collect(),
            ..Default::default()
        }
    }

    #[test]
    fn declared_mounts_match_after_cleaning() {
        let spec = spec_with(vec![mount("/data//x/", "tmpfs", "tmpfs")]);
        let state = live(&["/data/x"]);
        assert!(validate_mounts_exist(&spec, &state).is_ok());
    }

    #[test]
    fn missing_mount_names_destination() {
        let spec = spec_with(vec![mount("/data", "tmpfs", "tmpfs")]);
        let err = validate_mounts_exist(&spec, &live(&[])).unwrap_err();
        assert_eq!(err.errors.len(), 1);
        assert!(err.to_string().starts_with("mount /data expected"));
        assert!(err.to_string().ends_with("not mounted"));
    }

    #[test]
    fn type_mismatch_is_reported() {
        let spec = spec_with(vec![mount("/data", "ext4", "/dev/sda1")]);
        let err = validate_mounts_exist(&spec, &live(&["/data"])).unwrap_err();
        assert!(err.to_string().contains("actual: type tmpfs, source tmpfs"));
    }

    #[test]
    fn bind_mounts_are_not_compared() {
        let mut bind = mount("/etc/resolv.conf", "none", "/host/resolv.conf");
        bind.options = vec!["rbind".into()];
        let spec = spec_with(vec![bind, mount("/etc/hosts", "bind", "/host/hosts")]);
        assert!(validate_mounts_exist(&spec, &live(&[])).is_ok());
    }

    #[test]
    fn mount_table_failure_aborts_check() {
        let spec = spec_with(vec![mount("/data", "tmpfs", "tmpfs")]);
        let state = FakeSystem::default().fail(Query::Mounts);
        let err = validate_mounts_exist(&spec, &state).unwrap_err();
        assert!(matches!(err.errors[0], CheckError::OsQuery { .. }));
    }

    #[test]
    fn nested_pair_scans_ancestors_first() {
        let dests: Vec<String> = ["/x", "/a/b", "/a", "/x/y"]
            .iter()
            .map(|s| s.to_string())
            .collect();
        assert_eq!(find_nested_pair(&dests), Some((0, 3)));

        let dests: Vec<String> = ["/a/b", "/c", "/a"].iter().map(|s| s.to_string()).collect();
        assert_eq!(find_nested_pair(&dests), Some((2, 0)));

        let dests: Vec<String> = ["/a", "/ab"].iter().map(|s| s.to_string()).collect();
        assert_eq!(find_nested_pair(&dests), None);
    }

    #[test]
    fn later_ancestor_mount_shadows() {
        let records: Vec<MountRecord> = ["/a/b", "/a"]
            .iter()
            .map(|p| MountRecord::new(p, "tmpfs", "tmpfs"))
            .collect();
        assert!(is_active_mountpoint(&records, "/a"));
        assert!(!is_active_mountpoint(&records, "/a/b"));
        assert!(!is_active_mountpoint(&records, "/c"));
    }

    #[test]
    fn remount_after_shadowing_is_active_again() {
        let records: Vec<MountRecord> = ["/a/b", "/a", "/a/b"]
            .iter()
            .map(|p| MountRecord::new(p, "tmpfs", "tmpfs"))
            .collect();
        assert!(is_active_mountpoint(&records, "/a/b"));
    }

    #[test]
    fn ancestor_first_requires_both_active() {
        let spec = spec_with(vec![mount("/a", "tmpfs", "tmpfs"), mount("/a/b", "tmpfs", "tmpfs")]);
        assert!(validate_mount_order(&spec, &live(&["/a", "/a/b"])).is_ok());

        let err = validate_mount_order(&spec, &live(&["/a/b", "/a"])).unwrap_err();
        assert_eq!(err.errors.len(), 1);
        assert!(err.to_string().contains("/a/b (declared after /a)"));
        assert!(err.to_string().contains("expected: active, actual: shadowed"));
    }

    #[test]
    fn descendant_first_must_be_shadowed() {
        let spec = spec_with(vec![mount("/a/b", "tmpfs", "tmpfs"), mount("/a", "tmpfs", "tmpfs")]);
        assert!(validate_mount_order(&spec, &live(&["/a/b", "/a"])).is_ok());
        assert!(validate_mount_order(&spec, &live(&["/a", "/a/b"])).is_err());
    }

    #[test]
    fn inactive_ancestor_always_fails() {
        let spec = spec_with(vec![mount("/a", "tmpfs", "tmpfs"), mount("/a/b", "tmpfs", "tmpfs")]);
        let err = validate_mount_order(&spec, &live(&["/a/b"])).unwrap_err();
        assert!(err.to_string().contains("/a (ancestor of /a/b)"));
    }

    #[test]
    fn root_destination_is_an_ancestor_of_every_mount() {
        let dests: Vec<String> = ["/", "/data"].iter().map(|s| s.to_string()).collect();
        assert_eq!(find_nested_pair(&dests), Some((0, 1)));

        let spec = spec_with(vec![mount("/", "tmpfs", "tmpfs"), mount("/data", "tmpfs", "tmpfs")]);
        assert!(validate_mount_order(&spec, &live(&["/", "/data"])).is_ok());

        let err = validate_mount_order(&spec, &live(&["/data", "/"])).unwrap_err();
        assert_eq!(err.errors.len(), 1);
        assert!(err.to_string().contains("/data (declared after /)"));
    }

    #[test]
    fn unrelated_destinations_pass_for_any_table() {
        let spec = spec_with(vec![mount("/a", "tmpfs", "tmpfs"), mount("/b", "tmpfs", "tmpfs")]);
        assert!(validate_mount_order(&spec, &live(&[])).is_ok());
        assert!(validate_mount_order(&spec, &FakeSystem::default().fail(Query::Mounts)).is_ok());
    }

    #[test]
    fn order_is_unsupported_on_windows() {
        let mut spec = spec_with(vec![
            mount("/a", "tmpfs", "tmpfs"),
            mount("/a/b", "tmpfs", "tmpfs"),
        ]);
        spec.platform = Some(PlatformSpec {
            os: "windows".into(),
            arch: "amd64".into(),
        });
        let err = validate_mount_order(&spec, &live(&[])).unwrap_err();
        assert!(err.is_unsupported());
    }
}
