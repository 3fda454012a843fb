//! Integration tests for the host readers
//!
//! These read the live state of the test process itself, so they assert
//! shape and consistency rather than specific values.

#![cfg(target_os = "linux")]

use runtimetest::kernel::capabilities::{
    check_no_new_privs, read_snapshot, CapabilityNumber, CapabilitySet,
};
use runtimetest::kernel::idmap::IdMapKind;
use runtimetest::kernel::{HostSystem, SystemState};
use std::path::Path;

#[test]
fn test_mount_table_contains_root() {
    let mounts = HostSystem.mounts().expect("mountinfo should be readable");
    assert!(!mounts.is_empty());
    assert!(mounts.iter().any(|m| m.mountpoint == "/"));
    assert!(mounts.iter().all(|m| !m.fstype.is_empty()));
}

#[test]
fn test_proc_is_mounted_as_proc() {
    let mounts = HostSystem.mounts().unwrap();
    assert!(mounts
        .iter()
        .any(|m| m.mountpoint == "/proc" && m.fstype == "proc"));
}

#[test]
fn test_capability_snapshot_is_consistent() {
    let snapshot = read_snapshot().expect("status should list capabilities");
    assert!(snapshot.last_cap <= CapabilityNumber::MAX_CAP);

    let effective = snapshot.mask(CapabilitySet::Effective);
    let permitted = snapshot.mask(CapabilitySet::Permitted);
    assert_eq!(effective & !permitted, 0, "effective must be a subset of permitted");
}

#[test]
fn test_no_new_privs_query_is_stable() {
    let first = check_no_new_privs().unwrap();
    let second = check_no_new_privs().unwrap();
    assert_eq!(first, second);
}

#[test]
fn test_identity_matches_libc() {
    let state = HostSystem;
    assert_eq!(state.uid(), unsafe { libc::getuid() });
    assert_eq!(state.gid(), unsafe { libc::getgid() });
    assert!(state.groups().is_ok());
}

#[test]
fn test_args_include_test_binary() {
    let args = HostSystem.args().unwrap();
    assert!(!args.is_empty());
    let own: Vec<String> = std::env::args().collect();
    assert_eq!(args, own);
}

#[test]
fn test_cwd_matches_std() {
    assert_eq!(HostSystem.cwd().unwrap(), std::env::current_dir().unwrap());
}

#[test]
fn test_nofile_limit_is_ordered() {
    let (soft, hard) = HostSystem.rlimit("RLIMIT_NOFILE").unwrap();
    assert!(soft <= hard);
    assert!(HostSystem.rlimit("RLIMIT_BOGUS").is_err());
}

#[test]
fn test_sysctl_reads_are_trimmed() {
    let value = HostSystem.sysctl("kernel.ostype").unwrap();
    assert_eq!(value, "Linux");
}

#[test]
fn test_oom_score_adj_in_range() {
    let score = HostSystem.oom_score_adj().unwrap();
    assert!((-1000..=1000).contains(&score));
}

#[test]
fn test_id_maps_parse() {
    let uid_map = HostSystem.id_map(IdMapKind::Uid).unwrap();
    assert!(!uid_map.is_empty());
    assert!(HostSystem.id_map(IdMapKind::Gid).is_ok());
}

#[test]
fn test_default_devices_and_symlinks() {
    let null = HostSystem.stat(Path::new("/dev/null")).unwrap();
    assert!(null.kind().is_device());
    // minimal chroots may lack /dev/fd entirely
    if let Ok(target) = HostSystem.read_link(Path::new("/dev/fd")) {
        assert_eq!(target, Path::new("/proc/self/fd"));
    }
}

#[test]
fn test_probe_leaves_no_trace() {
    let dir = tempfile::tempdir().unwrap();
    HostSystem.probe_write(dir.path()).unwrap();
    assert_eq!(std::fs::read_dir(dir.path()).unwrap().count(), 0);
}
