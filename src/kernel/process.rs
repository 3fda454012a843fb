//! Command line, environment, hostname and sysctl readers.

use std::fs;
use std::io;
use std::path::{Path, PathBuf};

const CMDLINE_PATH: &str = "/proc/self/cmdline";
const SYSCTL_ROOT: &str = "/proc/sys";

/// Argument vector of the calling process as the kernel recorded it.
pub fn read_args() -> io::Result<Vec<String>> {
    let raw = fs::read(CMDLINE_PATH)?;
    Ok(parse_cmdline(&raw))
}

/// Split NUL-separated cmdline bytes, ignoring leading and trailing NULs.
pub fn parse_cmdline(raw: &[u8]) -> Vec<String> {
    let start = raw.iter().position(|b| *b != 0).unwrap_or(raw.len());
    let end = raw.iter().rposition(|b| *b != 0).map(|i| i + 1).unwrap_or(start);
    if start >= end {
        return Vec::new();
    }
    raw[start..end]
        .split(|b| *b == 0)
        .map(|arg| String::from_utf8_lossy(arg).into_owned())
        .collect()
}

/// Working directory of the process.
pub fn read_cwd() -> io::Result<PathBuf> {
    std::env::current_dir()
}

/// Hostname from the UTS namespace.
pub fn read_hostname() -> io::Result<String> {
    let name = nix::unistd::gethostname().map_err(io::Error::from)?;
    Ok(name.to_string_lossy().into_owned())
}

/// Virtual filesystem path of a dotted sysctl key.
pub fn sysctl_path(key: &str) -> PathBuf {
    Path::new(SYSCTL_ROOT).join(key.replace('.', "/"))
}

/// Value of a sysctl with NULs stripped and whitespace trimmed.
pub fn read_sysctl(key: &str) -> io::Result<String> {
    let raw = fs::read(sysctl_path(key))?;
    Ok(normalize_sysctl(&raw))
}

pub fn normalize_sysctl(raw: &[u8]) -> String {
    let text = String::from_utf8_lossy(raw);
    text.trim_matches('\0').trim().to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn cmdline_splits_on_nul() {
        assert_eq!(
            parse_cmdline(b"/runtimetest\0--log-level\0debug\0"),
            vec!["/runtimetest", "--log-level", "debug"]
        );
    }

    #[test]
    fn cmdline_keeps_empty_inner_arguments() {
        assert_eq!(parse_cmdline(b"sh\0\0-c\0"), vec!["sh", "", "-c"]);
    }

    #[test]
    fn empty_cmdline_has_no_arguments() {
        assert!(parse_cmdline(b"").is_empty());
        assert!(parse_cmdline(b"\0\0").is_empty());
    }

    #[test]
    fn sysctl_keys_map_to_proc_sys() {
        assert_eq!(
            sysctl_path("net.ipv4.ip_forward"),
            PathBuf::from("/proc/sys/net/ipv4/ip_forward")
        );
    }

    #[test]
    fn sysctl_values_are_trimmed() {
        assert_eq!(normalize_sysctl(b"1\n"), "1");
        assert_eq!(normalize_sysctl(b"4096\t87380\t6291456\n\0"), "4096\t87380\t6291456");
    }

    #[cfg(target_os = "linux")]
    #[test]
    fn live_readers_work() {
        assert!(!read_args().unwrap().is_empty());
        assert!(read_cwd().unwrap().is_absolute());
        assert!(!read_hostname().unwrap().is_empty());
        assert!(read_sysctl("kernel.ostype").unwrap().contains("Linux"));
    }
}
