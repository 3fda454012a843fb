//! In-memory system state for exercising checks without a container.

use crate::config::defaults::{DEFAULT_FILESYSTEMS, DEFAULT_SYMLINKS};
use crate::config::spec::{IdMapping, Spec};
use crate::kernel::capabilities::{CapabilityNumber, CapabilitySet, CapabilitySnapshot};
use crate::kernel::filesystem::{device_id, FileStat};
use crate::kernel::idmap::IdMapKind;
use crate::kernel::mount::MountRecord;
use crate::kernel::SystemState;
use crate::utils::path::clean;
use std::collections::{HashMap, HashSet};
use std::io;
use std::path::{Path, PathBuf};

/// A query the fake can be told to fail.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Query {
    Mounts,
    Capabilities,
    Groups,
    Cwd,
    Args,
    NoNewPrivs,
    Hostname,
    Rlimit,
    Sysctl,
    OomScoreAdj,
    IdMap,
    Stat,
    ReadLink,
    Readable,
}

/// Hand-assembled live state. Every field is public so tests can bend one
/// aspect of an otherwise conforming system.
#[derive(Debug, Clone)]
pub struct FakeSystem {
    pub mounts: Vec<MountRecord>,
    pub capabilities: CapabilitySnapshot,
    pub uid: u32,
    pub gid: u32,
    pub groups: Vec<u32>,
    pub cwd: PathBuf,
    pub args: Vec<String>,
    pub env: HashMap<String, String>,
    pub no_new_privs: bool,
    pub hostname: String,
    pub rlimits: HashMap<String, (u64, u64)>,
    pub sysctls: HashMap<String, String>,
    pub oom_score_adj: i32,
    pub uid_map: Vec<IdMapping>,
    pub gid_map: Vec<IdMapping>,
    pub files: HashMap<PathBuf, FileStat>,
    pub links: HashMap<PathBuf, PathBuf>,
    pub readable: HashSet<PathBuf>,
    pub writable: HashSet<PathBuf>,
    pub failing: HashSet<Query>,
}

impl Default for FakeSystem {
    fn default() -> Self {
        Self {
            mounts: Vec::new(),
            capabilities: CapabilitySnapshot::new(CapabilityNumber::MAX_CAP),
            uid: 0,
            gid: 0,
            groups: Vec::new(),
            cwd: PathBuf::from("/"),
            args: Vec::new(),
            env: HashMap::new(),
            no_new_privs: false,
            hostname: String::new(),
            rlimits: HashMap::new(),
            sysctls: HashMap::new(),
            oom_score_adj: 0,
            uid_map: Vec::new(),
            gid_map: Vec::new(),
            files: HashMap::new(),
            links: HashMap::new(),
            readable: HashSet::new(),
            writable: HashSet::new(),
            failing: HashSet::new(),
        }
    }
}

const CHAR_DEVICE: u32 = libc::S_IFCHR as u32;
const BLOCK_DEVICE: u32 = libc::S_IFBLK as u32;
const FIFO: u32 = libc::S_IFIFO as u32;

fn char_device(major: u64, minor: u64) -> FileStat {
    FileStat {
        mode: CHAR_DEVICE | 0o666,
        rdev: device_id(major, minor),
        uid: 0,
        gid: 0,
    }
}

impl FakeSystem {
    /// A system that passes every check for `spec`.
    pub fn conforming_to(spec: &Spec) -> Self {
        let mut fake = Self::default();

        for (mountpoint, fstype) in DEFAULT_FILESYSTEMS {
            fake.mounts.push(MountRecord::new(mountpoint, fstype, fstype));
        }
        for mount in &spec.mounts {
            fake.mounts.push(MountRecord::new(
                &clean(&mount.destination),
                &mount.kind,
                &clean(&mount.source),
            ));
        }

        let readonly_root = spec.root.as_ref().map_or(false, |r| r.readonly);
        if !readonly_root {
            fake.writable.insert(PathBuf::from("/"));
        }

        if let Some(process) = &spec.process {
            fake.uid = process.user.uid;
            fake.gid = process.user.gid;
            fake.groups = process.user.additional_gids.clone();
            if !process.cwd.is_empty() {
                fake.cwd = PathBuf::from(&process.cwd);
            }
            fake.args = process.args.clone();
            for entry in &process.env {
                let (key, value) = entry.split_once('=').unwrap_or((entry.as_str(), ""));
                fake.env.insert(key.to_string(), value.to_string());
            }
            fake.no_new_privs = process.no_new_privileges;
            for rlimit in &process.rlimits {
                fake.rlimits
                    .insert(rlimit.kind.clone(), (rlimit.soft, rlimit.hard));
            }
            if let Some(caps) = &process.capabilities {
                let declared = [
                    (CapabilitySet::Bounding, &caps.bounding),
                    (CapabilitySet::Effective, &caps.effective),
                    (CapabilitySet::Inheritable, &caps.inheritable),
                    (CapabilitySet::Permitted, &caps.permitted),
                    (CapabilitySet::Ambient, &caps.ambient),
                ];
                for (set, names) in declared {
                    for cap in names.iter().filter_map(|n| CapabilityNumber::from_name(n)) {
                        fake.capabilities.set(set, cap, true);
                    }
                }
            }
        }

        if let Some(hostname) = &spec.hostname {
            fake.hostname = hostname.clone();
        }
        if let Some(score) = spec.oom_score_adj() {
            fake.oom_score_adj = score;
        }

        let defaults = [
            ("/dev/null", 1, 3),
            ("/dev/zero", 1, 5),
            ("/dev/full", 1, 7),
            ("/dev/random", 1, 8),
            ("/dev/urandom", 1, 9),
            ("/dev/tty", 5, 0),
            ("/dev/ptmx", 5, 2),
        ];
        for (path, major, minor) in defaults {
            fake.files.insert(PathBuf::from(path), char_device(major, minor));
        }
        if spec.terminal() {
            fake.files
                .insert(PathBuf::from("/dev/console"), char_device(136, 0));
        }
        for (link, target) in DEFAULT_SYMLINKS {
            fake.links.insert(PathBuf::from(link), PathBuf::from(target));
        }

        if let Some(linux) = &spec.linux {
            for device in &linux.devices {
                let kind = match device.kind.as_str() {
                    "b" => BLOCK_DEVICE,
                    "p" => FIFO,
                    _ => CHAR_DEVICE,
                };
                let stat = FileStat {
                    mode: kind | (device.file_mode.unwrap_or(0o666) & 0o777),
                    rdev: device_id(device.major as u64, device.minor as u64),
                    uid: device.uid.unwrap_or(0),
                    gid: device.gid.unwrap_or(0),
                };
                fake.files.insert(PathBuf::from(&device.path), stat);
            }
            for (key, value) in &linux.sysctl {
                fake.sysctls.insert(key.clone(), value.clone());
            }
            fake.uid_map = linux.uid_mappings.clone();
            fake.gid_map = linux.gid_mappings.clone();
        }

        fake
    }

    /// Make every call to `query` return an I/O error.
    pub fn fail(mut self, query: Query) -> Self {
        self.failing.insert(query);
        self
    }

    fn answer<T>(&self, query: Query, value: impl FnOnce() -> io::Result<T>) -> io::Result<T> {
        if self.failing.contains(&query) {
            return Err(io::Error::new(
                io::ErrorKind::Other,
                format!("{:?} query failed", query),
            ));
        }
        value()
    }
}

fn not_found(what: impl std::fmt::Display) -> io::Error {
    io::Error::new(io::ErrorKind::NotFound, format!("{} not found", what))
}

impl SystemState for FakeSystem {
    fn mounts(&self) -> io::Result<Vec<MountRecord>> {
        self.answer(Query::Mounts, || Ok(self.mounts.clone()))
    }

    fn capabilities(&self) -> io::Result<CapabilitySnapshot> {
        self.answer(Query::Capabilities, || Ok(self.capabilities))
    }

    fn uid(&self) -> u32 {
        self.uid
    }

    fn gid(&self) -> u32 {
        self.gid
    }

    fn groups(&self) -> io::Result<Vec<u32>> {
        self.answer(Query::Groups, || Ok(self.groups.clone()))
    }

    fn cwd(&self) -> io::Result<PathBuf> {
        self.answer(Query::Cwd, || Ok(self.cwd.clone()))
    }

    fn args(&self) -> io::Result<Vec<String>> {
        self.answer(Query::Args, || Ok(self.args.clone()))
    }

    fn env_var(&self, key: &str) -> Option<String> {
        self.env.get(key).cloned()
    }

    fn no_new_privs(&self) -> io::Result<bool> {
        self.answer(Query::NoNewPrivs, || Ok(self.no_new_privs))
    }

    fn hostname(&self) -> io::Result<String> {
        self.answer(Query::Hostname, || Ok(self.hostname.clone()))
    }

    fn rlimit(&self, name: &str) -> io::Result<(u64, u64)> {
        self.answer(Query::Rlimit, || {
            self.rlimits.get(name).copied().ok_or_else(|| not_found(name))
        })
    }

    fn sysctl(&self, key: &str) -> io::Result<String> {
        self.answer(Query::Sysctl, || {
            self.sysctls.get(key).cloned().ok_or_else(|| not_found(key))
        })
    }

    fn oom_score_adj(&self) -> io::Result<i32> {
        self.answer(Query::OomScoreAdj, || Ok(self.oom_score_adj))
    }

    fn id_map(&self, kind: IdMapKind) -> io::Result<Vec<IdMapping>> {
        self.answer(Query::IdMap, || {
            Ok(match kind {
                IdMapKind::Uid => self.uid_map.clone(),
                IdMapKind::Gid => self.gid_map.clone(),
            })
        })
    }

    fn stat(&self, path: &Path) -> io::Result<FileStat> {
        self.answer(Query::Stat, || {
            self.files
                .get(path)
                .copied()
                .ok_or_else(|| not_found(path.display()))
        })
    }

    fn read_link(&self, path: &Path) -> io::Result<PathBuf> {
        self.answer(Query::ReadLink, || {
            self.links
                .get(path)
                .cloned()
                .ok_or_else(|| not_found(path.display()))
        })
    }

    fn is_readable(&self, path: &Path) -> io::Result<bool> {
        self.answer(Query::Readable, || Ok(self.readable.contains(path)))
    }

    fn probe_write(&self, path: &Path) -> io::Result<()> {
        if self.writable.contains(path) {
            Ok(())
        } else {
            Err(io::Error::new(
                io::ErrorKind::PermissionDenied,
                format!("{} is read-only", path.display()),
            ))
        }
    }
}
