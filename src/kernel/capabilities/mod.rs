//! Linux capability sets of the calling process.
//!
//! Snapshots are read-only; nothing here changes the process's privileges.

mod query;

pub use query::{check_no_new_privs, parse_status, read_last_cap, read_snapshot};

/// Capability number newtype for type safety.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub struct CapabilityNumber(u32);

impl CapabilityNumber {
    /// Highest capability this crate has a name for (CAP_CHECKPOINT_RESTORE).
    pub const MAX_CAP: u32 = 40;

    pub fn new(cap: u32) -> Option<Self> {
        if cap <= Self::MAX_CAP {
            Some(Self(cap))
        } else {
            None
        }
    }

    pub fn value(self) -> u32 {
        self.0
    }

    /// Kernel name, e.g. `CAP_SYS_ADMIN`.
    pub fn name(self) -> &'static str {
        CAPABILITY_NAMES[self.0 as usize]
    }

    pub fn from_name(name: &str) -> Option<Self> {
        CAPABILITY_NAMES
            .iter()
            .position(|n| *n == name)
            .map(|i| Self(i as u32))
    }

    /// Every capability from 0 through `last`, clamped to [`Self::MAX_CAP`].
    pub fn up_to(last: u32) -> impl Iterator<Item = CapabilityNumber> {
        (0..=last.min(Self::MAX_CAP)).map(CapabilityNumber)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CapabilitySet {
    Bounding,
    Effective,
    Inheritable,
    Permitted,
    Ambient,
}

impl CapabilitySet {
    pub const ALL: [CapabilitySet; 5] = [
        CapabilitySet::Bounding,
        CapabilitySet::Effective,
        CapabilitySet::Inheritable,
        CapabilitySet::Permitted,
        CapabilitySet::Ambient,
    ];

    pub fn name(self) -> &'static str {
        match self {
            Self::Bounding => "bounding",
            Self::Effective => "effective",
            Self::Inheritable => "inheritable",
            Self::Permitted => "permitted",
            Self::Ambient => "ambient",
        }
    }

    /// Field prefix in /proc/<pid>/status.
    fn status_key(self) -> &'static str {
        match self {
            Self::Bounding => "CapBnd:",
            Self::Effective => "CapEff:",
            Self::Inheritable => "CapInh:",
            Self::Permitted => "CapPrm:",
            Self::Ambient => "CapAmb:",
        }
    }

    fn index(self) -> usize {
        self as usize
    }
}

/// Bit masks of all five sets plus the highest capability the kernel knows.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CapabilitySnapshot {
    masks: [u64; 5],
    pub last_cap: u32,
}

impl CapabilitySnapshot {
    pub fn new(last_cap: u32) -> Self {
        Self {
            masks: [0; 5],
            last_cap,
        }
    }

    pub fn with_mask(mut self, set: CapabilitySet, mask: u64) -> Self {
        self.masks[set.index()] = mask;
        self
    }

    pub fn set(&mut self, set: CapabilitySet, cap: CapabilityNumber, present: bool) {
        let bit = 1u64 << cap.value();
        if present {
            self.masks[set.index()] |= bit;
        } else {
            self.masks[set.index()] &= !bit;
        }
    }

    pub fn has(&self, set: CapabilitySet, cap: CapabilityNumber) -> bool {
        self.masks[set.index()] & (1u64 << cap.value()) != 0
    }

    pub fn mask(&self, set: CapabilitySet) -> u64 {
        self.masks[set.index()]
    }
}

const CAPABILITY_NAMES: [&str; (CapabilityNumber::MAX_CAP + 1) as usize] = [
    "CAP_CHOWN",
    "CAP_DAC_OVERRIDE",
    "CAP_DAC_READ_SEARCH",
    "CAP_FOWNER",
    "CAP_FSETID",
    "CAP_KILL",
    "CAP_SETGID",
    "CAP_SETUID",
    "CAP_SETPCAP",
    "CAP_LINUX_IMMUTABLE",
    "CAP_NET_BIND_SERVICE",
    "CAP_NET_BROADCAST",
    "CAP_NET_ADMIN",
    "CAP_NET_RAW",
    "CAP_IPC_LOCK",
    "CAP_IPC_OWNER",
    "CAP_SYS_MODULE",
    "CAP_SYS_RAWIO",
    "CAP_SYS_CHROOT",
    "CAP_SYS_PTRACE",
    "CAP_SYS_PACCT",
    "CAP_SYS_ADMIN",
    "CAP_SYS_BOOT",
    "CAP_SYS_NICE",
    "CAP_SYS_RESOURCE",
    "CAP_SYS_TIME",
    "CAP_SYS_TTY_CONFIG",
    "CAP_MKNOD",
    "CAP_LEASE",
    "CAP_AUDIT_WRITE",
    "CAP_AUDIT_CONTROL",
    "CAP_SETFCAP",
    "CAP_MAC_OVERRIDE",
    "CAP_MAC_ADMIN",
    "CAP_SYSLOG",
    "CAP_WAKE_ALARM",
    "CAP_BLOCK_SUSPEND",
    "CAP_AUDIT_READ",
    "CAP_PERFMON",
    "CAP_BPF",
    "CAP_CHECKPOINT_RESTORE",
];

pub(crate) const PR_GET_NO_NEW_PRIVS: libc::c_int = 39;
