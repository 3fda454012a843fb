//! Readers for live kernel and process state.
//!
//! Every read the checks perform goes through [`SystemState`]. [`HostSystem`]
//! answers from the real kernel interfaces; tests substitute an in-memory
//! implementation. Nothing here caches: each call samples the system again.

pub mod capabilities;
pub mod credentials;
pub mod filesystem;
pub mod idmap;
pub mod mount;
pub mod process;
pub mod resources;

use crate::config::spec::IdMapping;
use capabilities::CapabilitySnapshot;
use filesystem::FileStat;
use idmap::IdMapKind;
use mount::MountRecord;
use std::io;
use std::path::{Path, PathBuf};

/// Live state of the process and its environment.
pub trait SystemState {
    /// Mount table in kernel order, oldest first.
    fn mounts(&self) -> io::Result<Vec<MountRecord>>;

    fn capabilities(&self) -> io::Result<CapabilitySnapshot>;

    fn uid(&self) -> u32;

    fn gid(&self) -> u32;

    fn groups(&self) -> io::Result<Vec<u32>>;

    fn cwd(&self) -> io::Result<PathBuf>;

    fn args(&self) -> io::Result<Vec<String>>;

    /// `None` when the variable is unset.
    fn env_var(&self, key: &str) -> Option<String>;

    fn no_new_privs(&self) -> io::Result<bool>;

    fn hostname(&self) -> io::Result<String>;

    /// (soft, hard) for a known `RLIMIT_*` name.
    fn rlimit(&self, name: &str) -> io::Result<(u64, u64)>;

    /// Normalized value of a dotted sysctl key.
    fn sysctl(&self, key: &str) -> io::Result<String>;

    fn oom_score_adj(&self) -> io::Result<i32>;

    fn id_map(&self, kind: IdMapKind) -> io::Result<Vec<IdMapping>>;

    /// stat(2), following symlinks.
    fn stat(&self, path: &Path) -> io::Result<FileStat>;

    fn read_link(&self, path: &Path) -> io::Result<PathBuf>;

    /// Whether any data can be read from `path`.
    fn is_readable(&self, path: &Path) -> io::Result<bool>;

    /// `Ok` if `path` accepted a write probe.
    fn probe_write(&self, path: &Path) -> io::Result<()>;
}

/// The running system, as seen by the calling process.
#[derive(Debug, Default, Clone, Copy)]
pub struct HostSystem;

impl SystemState for HostSystem {
    fn mounts(&self) -> io::Result<Vec<MountRecord>> {
        mount::read_mounts()
    }

    fn capabilities(&self) -> io::Result<CapabilitySnapshot> {
        capabilities::read_snapshot()
    }

    fn uid(&self) -> u32 {
        credentials::current_uid()
    }

    fn gid(&self) -> u32 {
        credentials::current_gid()
    }

    fn groups(&self) -> io::Result<Vec<u32>> {
        credentials::current_groups()
    }

    fn cwd(&self) -> io::Result<PathBuf> {
        process::read_cwd()
    }

    fn args(&self) -> io::Result<Vec<String>> {
        process::read_args()
    }

    fn env_var(&self, key: &str) -> Option<String> {
        std::env::var_os(key).map(|v| v.to_string_lossy().into_owned())
    }

    fn no_new_privs(&self) -> io::Result<bool> {
        capabilities::check_no_new_privs()
    }

    fn hostname(&self) -> io::Result<String> {
        process::read_hostname()
    }

    fn rlimit(&self, name: &str) -> io::Result<(u64, u64)> {
        resources::read_rlimit(name)
    }

    fn sysctl(&self, key: &str) -> io::Result<String> {
        process::read_sysctl(key)
    }

    fn oom_score_adj(&self) -> io::Result<i32> {
        resources::read_oom_score_adj()
    }

    fn id_map(&self, kind: IdMapKind) -> io::Result<Vec<IdMapping>> {
        idmap::read_id_map(kind)
    }

    fn stat(&self, path: &Path) -> io::Result<FileStat> {
        filesystem::stat(path)
    }

    fn read_link(&self, path: &Path) -> io::Result<PathBuf> {
        std::fs::read_link(path)
    }

    fn is_readable(&self, path: &Path) -> io::Result<bool> {
        filesystem::is_readable(path)
    }

    fn probe_write(&self, path: &Path) -> io::Result<()> {
        filesystem::probe_write(path)
    }
}
