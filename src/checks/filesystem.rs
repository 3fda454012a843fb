//! Root filesystem, default layout, devices and path protections.

use super::{CheckError, CheckFailure, OsQuery};
use crate::config::defaults::{required_devices, DEFAULT_FILESYSTEMS, DEFAULT_SYMLINKS};
use crate::config::spec::Spec;
use crate::kernel::filesystem::{DeviceKind, FileStat};
use crate::kernel::SystemState;
use crate::utils::path::clean;
use std::collections::HashMap;
use std::io;
use std::path::Path;

/// A read-only root must reject a write probe.
pub fn validate_rootfs(spec: &Spec, state: &dyn SystemState) -> Result<(), CheckFailure> {
    let readonly = spec.root.as_ref().map_or(false, |r| r.readonly);
    if !readonly {
        return Ok(());
    }
    match state.probe_write(Path::new("/")) {
        Ok(()) => Err(CheckError::violation(
            "root filesystem should be readonly but it is writable",
        )
        .into()),
        Err(e) => {
            log::debug!("Write probe at / rejected: {}", e);
            Ok(())
        }
    }
}

/// `/proc`, `/sys`, `/dev/pts` and `/dev/shm` carry their usual filesystems.
pub fn validate_default_filesystems(
    _spec: &Spec,
    state: &dyn SystemState,
) -> Result<(), CheckFailure> {
    let live = state.mounts().query("mount table")?;

    // later mounts at the same point replace earlier ones
    let mut current: HashMap<String, &str> = HashMap::new();
    for record in &live {
        current.insert(clean(&record.mountpoint), record.fstype.as_str());
    }

    let mut failure = CheckFailure::new();
    for (mountpoint, fstype) in DEFAULT_FILESYSTEMS {
        match current.get(*mountpoint) {
            Some(actual) if actual == fstype => {}
            Some(actual) => failure.push(CheckError::mismatch(
                format!("mount {}", mountpoint),
                fstype,
                actual,
            )),
            None => failure.push(CheckError::mismatch(
                format!("mount {}", mountpoint),
                fstype,
                "not mounted",
            )),
        }
    }
    failure.into_result()
}

/// stat(2) that turns a missing node into `None`.
fn stat_node(state: &dyn SystemState, path: &str) -> Result<Option<FileStat>, CheckError> {
    match state.stat(Path::new(path)) {
        Ok(st) => Ok(Some(st)),
        Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(None),
        Err(e) => Err(e).query(path),
    }
}

pub fn validate_default_devices(spec: &Spec, state: &dyn SystemState) -> Result<(), CheckFailure> {
    let mut failure = CheckFailure::new();

    for path in required_devices(spec.terminal()) {
        match stat_node(state, path)? {
            None => failure.push(CheckError::violation(format!("device node {} not found", path))),
            Some(st) if !st.kind().is_device() => {
                failure.push(CheckError::violation(format!("file {} is not a device", path)))
            }
            Some(_) => {}
        }
    }
    failure.into_result()
}

pub fn validate_default_symlinks(
    _spec: &Spec,
    state: &dyn SystemState,
) -> Result<(), CheckFailure> {
    let mut failure = CheckFailure::new();

    for (link, target) in DEFAULT_SYMLINKS {
        let actual = match state.read_link(Path::new(link)) {
            Ok(actual) => actual,
            Err(e) if e.kind() == io::ErrorKind::NotFound => {
                failure.push(CheckError::violation(format!("symlink {} not found", link)));
                continue;
            }
            // readlink(2) reports EINVAL for anything that is not a link
            Err(e) if e.kind() == io::ErrorKind::InvalidInput => {
                failure.push(CheckError::violation(format!("{} is not a symlink", link)));
                continue;
            }
            Err(source) => {
                return Err(CheckError::OsQuery {
                    what: link.to_string(),
                    source,
                }
                .into())
            }
        };

        if actual != Path::new(target) {
            failure.push(CheckError::mismatch(
                format!("symlink {}", link),
                target,
                actual.display(),
            ));
        }
    }
    failure.into_result()
}

/// Declared device nodes: type, numbers, permission bits and owner.
pub fn validate_devices(spec: &Spec, state: &dyn SystemState) -> Result<(), CheckFailure> {
    let devices = match spec.linux.as_ref() {
        Some(linux) => &linux.devices,
        None => return Ok(()),
    };

    let mut failure = CheckFailure::new();
    for device in devices {
        let st = match stat_node(state, &device.path)? {
            Some(st) => st,
            None => {
                failure.push(CheckError::violation(format!(
                    "device node {} not found",
                    device.path
                )));
                continue;
            }
        };

        let kind = st.kind();
        if !kind.satisfies(&device.kind) {
            failure.push(CheckError::mismatch(
                format!("device {} type", device.path),
                &device.kind,
                kind.as_str(),
            ));
            continue;
        }

        if kind != DeviceKind::Fifo {
            if st.major() as i64 != device.major {
                failure.push(CheckError::mismatch(
                    format!("device {} major number", device.path),
                    device.major,
                    st.major(),
                ));
            }
            if st.minor() as i64 != device.minor {
                failure.push(CheckError::mismatch(
                    format!("device {} minor number", device.path),
                    device.minor,
                    st.minor(),
                ));
            }
        }

        if let Some(mode) = device.file_mode {
            let expected = mode & 0o777;
            if st.permissions() != expected {
                failure.push(CheckError::mismatch(
                    format!("device {} file mode", device.path),
                    format!("{:o}", expected),
                    format!("{:o}", st.permissions()),
                ));
            }
        }
        if let Some(uid) = device.uid {
            if st.uid != uid {
                failure.push(CheckError::mismatch(
                    format!("device {} uid", device.path),
                    uid,
                    st.uid,
                ));
            }
        }
        if let Some(gid) = device.gid {
            if st.gid != gid {
                failure.push(CheckError::mismatch(
                    format!("device {} gid", device.path),
                    gid,
                    st.gid,
                ));
            }
        }
    }
    failure.into_result()
}

pub fn validate_masked_paths(spec: &Spec, state: &dyn SystemState) -> Result<(), CheckFailure> {
    let paths = match spec.linux.as_ref() {
        Some(linux) => &linux.masked_paths,
        None => return Ok(()),
    };

    let mut failure = CheckFailure::new();
    for path in paths {
        if state.is_readable(Path::new(path)).query(path)? {
            failure.push(CheckError::violation(format!("{} should not be readable", path)));
        }
    }
    failure.into_result()
}

pub fn validate_readonly_paths(spec: &Spec, state: &dyn SystemState) -> Result<(), CheckFailure> {
    let paths = match spec.linux.as_ref() {
        Some(linux) => &linux.readonly_paths,
        None => return Ok(()),
    };

    let mut failure = CheckFailure::new();
    for path in paths {
        match state.probe_write(Path::new(path)) {
            Ok(()) => failure.push(CheckError::violation(format!("{} should be readonly", path))),
            Err(e) => log::debug!("Write probe at {} rejected: {}", path, e),
        }
    }
    failure.into_result()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::spec::{Device, Linux, Process, Root};
    use crate::kernel::filesystem::device_id;
    use crate::kernel::mount::MountRecord;
    use crate::testing::{FakeSystem, Query};
    use std::path::PathBuf;

    fn linux_spec(linux: Linux) -> Spec {
        Spec {
            linux: Some(linux),
            ..Default::default()
        }
    }

    fn device(path: &str, kind: &str, major: i64, minor: i64) -> Device {
        Device {
            path: path.into(),
            kind: kind.into(),
            major,
            minor,
            ..Default::default()
        }
    }

    #[test]
    fn readonly_root_rejects_writes() {
        let mut spec = Spec {
            root: Some(Root {
                path: "rootfs".into(),
                readonly: true,
            }),
            ..Default::default()
        };
        let mut state = FakeSystem::conforming_to(&spec);
        assert!(validate_rootfs(&spec, &state).is_ok());

        state.writable.insert(PathBuf::from("/"));
        assert!(validate_rootfs(&spec, &state).is_err());

        spec.root = Some(Root {
            path: "rootfs".into(),
            readonly: false,
        });
        assert!(validate_rootfs(&spec, &state).is_ok());
    }

    #[test]
    fn last_mount_at_a_point_wins() {
        let mut state = FakeSystem::conforming_to(&Spec::default());
        assert!(validate_default_filesystems(&Spec::default(), &state).is_ok());

        state.mounts.push(MountRecord::new("/dev/shm", "ramfs", "none"));
        let err = validate_default_filesystems(&Spec::default(), &state).unwrap_err();
        assert_eq!(err.to_string(), "mount /dev/shm expected: tmpfs, actual: ramfs");

        state.mounts.push(MountRecord::new("/dev/shm", "tmpfs", "shm"));
        assert!(validate_default_filesystems(&Spec::default(), &state).is_ok());
    }

    #[test]
    fn missing_default_filesystem() {
        let mut state = FakeSystem::conforming_to(&Spec::default());
        state.mounts.retain(|m| m.mountpoint != "/sys");
        let err = validate_default_filesystems(&Spec::default(), &state).unwrap_err();
        assert_eq!(err.to_string(), "mount /sys expected: sysfs, actual: not mounted");
    }

    #[test]
    fn console_required_with_terminal() {
        let spec = Spec {
            process: Some(Process {
                terminal: true,
                ..Default::default()
            }),
            ..Default::default()
        };
        let mut state = FakeSystem::conforming_to(&spec);
        assert!(validate_default_devices(&spec, &state).is_ok());

        state.files.remove(Path::new("/dev/console"));
        let err = validate_default_devices(&spec, &state).unwrap_err();
        assert_eq!(err.to_string(), "device node /dev/console not found");
    }

    #[test]
    fn default_device_must_be_a_device() {
        let mut state = FakeSystem::conforming_to(&Spec::default());
        state.files.insert(
            PathBuf::from("/dev/null"),
            FileStat {
                mode: libc::S_IFREG as u32 | 0o644,
                rdev: 0,
                uid: 0,
                gid: 0,
            },
        );
        let err = validate_default_devices(&Spec::default(), &state).unwrap_err();
        assert_eq!(err.to_string(), "file /dev/null is not a device");
    }

    #[test]
    fn stat_failure_aborts_device_check() {
        let state = FakeSystem::conforming_to(&Spec::default()).fail(Query::Stat);
        let err = validate_default_devices(&Spec::default(), &state).unwrap_err();
        assert!(matches!(err.errors[0], CheckError::OsQuery { .. }));
    }

    #[test]
    fn symlink_targets_are_compared() {
        let mut state = FakeSystem::conforming_to(&Spec::default());
        assert!(validate_default_symlinks(&Spec::default(), &state).is_ok());

        state
            .links
            .insert(PathBuf::from("/dev/stderr"), PathBuf::from("/proc/self/fd/1"));
        state.links.remove(Path::new("/dev/fd"));
        let err = validate_default_symlinks(&Spec::default(), &state).unwrap_err();
        assert_eq!(
            err.to_string(),
            "symlink /dev/fd not found; \
             symlink /dev/stderr expected: /proc/self/fd/2, actual: /proc/self/fd/1"
        );
    }

    #[test]
    fn block_declared_but_char_observed() {
        let spec = linux_spec(Linux {
            devices: vec![device("/dev/fancy", "b", 1, 2)],
            ..Default::default()
        });
        let mut state = FakeSystem::conforming_to(&spec);
        assert!(validate_devices(&spec, &state).is_ok());

        state.files.insert(
            PathBuf::from("/dev/fancy"),
            FileStat {
                mode: libc::S_IFCHR as u32 | 0o666,
                rdev: device_id(1, 2),
                uid: 0,
                gid: 0,
            },
        );
        let err = validate_devices(&spec, &state).unwrap_err();
        assert_eq!(err.to_string(), "device /dev/fancy type expected: b, actual: c");
    }

    #[test]
    fn unbuffered_device_is_a_char_device() {
        let spec = linux_spec(Linux {
            devices: vec![device("/dev/fuse", "u", 10, 229)],
            ..Default::default()
        });
        let state = FakeSystem::conforming_to(&spec);
        assert!(validate_devices(&spec, &state).is_ok());
    }

    #[test]
    fn fifo_numbers_are_not_compared() {
        let spec = linux_spec(Linux {
            devices: vec![device("/dev/pipe", "p", 7, 7)],
            ..Default::default()
        });
        let mut state = FakeSystem::conforming_to(&spec);
        if let Some(st) = state.files.get_mut(Path::new("/dev/pipe")) {
            st.rdev = 0;
        }
        assert!(validate_devices(&spec, &state).is_ok());
    }

    #[test]
    fn device_numbers_mode_and_owner() {
        let mut dev = device("/dev/sda", "b", 8, 0);
        dev.file_mode = Some(0o660);
        dev.uid = Some(0);
        dev.gid = Some(6);
        let spec = linux_spec(Linux {
            devices: vec![dev],
            ..Default::default()
        });
        let mut state = FakeSystem::conforming_to(&spec);
        assert!(validate_devices(&spec, &state).is_ok());

        state.files.insert(
            PathBuf::from("/dev/sda"),
            FileStat {
                mode: libc::S_IFBLK as u32 | 0o600,
                rdev: device_id(8, 16),
                uid: 0,
                gid: 0,
            },
        );
        let err = validate_devices(&spec, &state).unwrap_err();
        let messages: Vec<String> = err.errors.iter().map(|e| e.to_string()).collect();
        assert_eq!(
            messages,
            vec![
                "device /dev/sda minor number expected: 0, actual: 16",
                "device /dev/sda file mode expected: 660, actual: 600",
                "device /dev/sda gid expected: 6, actual: 0",
            ]
        );
    }

    #[test]
    fn readable_masked_path_fails() {
        let spec = linux_spec(Linux {
            masked_paths: vec!["/proc/kcore".into(), "/proc/keys".into()],
            ..Default::default()
        });
        let mut state = FakeSystem::conforming_to(&spec);
        assert!(validate_masked_paths(&spec, &state).is_ok());

        state.readable.insert(PathBuf::from("/proc/kcore"));
        let err = validate_masked_paths(&spec, &state).unwrap_err();
        assert_eq!(err.to_string(), "/proc/kcore should not be readable");
    }

    #[test]
    fn writable_readonly_path_fails() {
        let spec = linux_spec(Linux {
            readonly_paths: vec!["/proc/sys".into(), "/proc/bus".into()],
            ..Default::default()
        });
        let mut state = FakeSystem::conforming_to(&spec);
        assert!(validate_readonly_paths(&spec, &state).is_ok());

        state.writable.insert(PathBuf::from("/proc/bus"));
        let err = validate_readonly_paths(&spec, &state).unwrap_err();
        assert_eq!(err.to_string(), "/proc/bus should be readonly");
    }
}
