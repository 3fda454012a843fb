//! Filesystem layout every Linux container is expected to provide
//!
//! The tables are immutable; anything that depends on the document (the
//! console device) is derived per run by [`required_devices`].

/// Mountpoint and filesystem type pairs that must be mounted.
pub const DEFAULT_FILESYSTEMS: &[(&str, &str)] = &[
    ("/proc", "proc"),
    ("/sys", "sysfs"),
    ("/dev/pts", "devpts"),
    ("/dev/shm", "tmpfs"),
];

/// Device nodes that must exist regardless of the document.
pub const DEFAULT_DEVICES: &[&str] = &[
    "/dev/null",
    "/dev/zero",
    "/dev/full",
    "/dev/random",
    "/dev/urandom",
    "/dev/tty",
    "/dev/ptmx",
];

/// Only present when the process was given a terminal.
pub const TERMINAL_DEVICE: &str = "/dev/console";

/// Symlink path and expected target.
pub const DEFAULT_SYMLINKS: &[(&str, &str)] = &[
    ("/dev/fd", "/proc/self/fd"),
    ("/dev/stdin", "/proc/self/fd/0"),
    ("/dev/stdout", "/proc/self/fd/1"),
    ("/dev/stderr", "/proc/self/fd/2"),
];

/// Device list for one run.
pub fn required_devices(terminal: bool) -> Vec<&'static str> {
    let mut devices = DEFAULT_DEVICES.to_vec();
    if terminal {
        devices.push(TERMINAL_DEVICE);
    }
    devices
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn console_is_required_only_with_terminal() {
        assert!(!required_devices(false).contains(&TERMINAL_DEVICE));
        assert_eq!(required_devices(true).last(), Some(&TERMINAL_DEVICE));
        // the base table is untouched by the terminal variant
        assert!(!DEFAULT_DEVICES.contains(&TERMINAL_DEVICE));
    }
}
