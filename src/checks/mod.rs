//! Conformance checks
//!
//! Each check compares one aspect of the live system with the configuration
//! document. Checks are independent pure functions of
//! `(&Spec, &dyn SystemState)`; the registry fixes their order, requirement
//! level and the platforms they apply to.
//!
//! ## Registry order
//! - platform agnostic: root filesystem, process identity and environment,
//!   capabilities, hostname, rlimits, mounts, mount order
//! - linux: default filesystems, devices and symlinks, declared devices,
//!   sysctl, masked and read-only paths, oom_score_adj, id mappings

pub mod capabilities;
pub mod filesystem;
pub mod idmap;
pub mod mounts;
pub mod process;
pub mod sysctl;

use crate::config::spec::Spec;
use crate::config::types::{ComplianceLevel, Platform};
use crate::kernel::SystemState;
use std::fmt;
use std::io;
use thiserror::Error;

/// A single way the live system can disagree with the document.
#[derive(Error, Debug)]
pub enum CheckError {
    #[error("{what} expected: {expected}, actual: {actual}")]
    Mismatch {
        what: String,
        expected: String,
        actual: String,
    },

    #[error("{0}")]
    Violation(String),

    #[error("unknown rlimit type {0}")]
    UnknownRlimit(String),

    #[error("failed to read {what}: {source}")]
    OsQuery {
        what: String,
        #[source]
        source: io::Error,
    },

    #[error("not supported on {0}")]
    Unsupported(String),
}

impl CheckError {
    pub fn mismatch(
        what: impl Into<String>,
        expected: impl fmt::Display,
        actual: impl fmt::Display,
    ) -> Self {
        CheckError::Mismatch {
            what: what.into(),
            expected: expected.to_string(),
            actual: actual.to_string(),
        }
    }

    pub fn violation(message: impl Into<String>) -> Self {
        CheckError::Violation(message.into())
    }
}

/// Attach the name of the queried state to an I/O error.
pub trait OsQuery<T> {
    fn query(self, what: impl Into<String>) -> Result<T, CheckError>;
}

impl<T> OsQuery<T> for io::Result<T> {
    fn query(self, what: impl Into<String>) -> Result<T, CheckError> {
        self.map_err(|source| CheckError::OsQuery {
            what: what.into(),
            source,
        })
    }
}

/// Every error one check found. Never empty when returned as `Err`.
#[derive(Debug, Default)]
pub struct CheckFailure {
    pub errors: Vec<CheckError>,
}

impl CheckFailure {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, error: CheckError) {
        self.errors.push(error);
    }

    /// True when the check reported that it does not apply.
    pub fn is_unsupported(&self) -> bool {
        !self.errors.is_empty()
            && self
                .errors
                .iter()
                .all(|e| matches!(e, CheckError::Unsupported(_)))
    }

    pub fn into_result(self) -> Result<(), CheckFailure> {
        if self.errors.is_empty() {
            Ok(())
        } else {
            Err(self)
        }
    }
}

impl From<CheckError> for CheckFailure {
    fn from(error: CheckError) -> Self {
        Self {
            errors: vec![error],
        }
    }
}

impl fmt::Display for CheckFailure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, error) in self.errors.iter().enumerate() {
            if i > 0 {
                f.write_str("; ")?;
            }
            write!(f, "{}", error)?;
        }
        Ok(())
    }
}

impl std::error::Error for CheckFailure {}

pub type CheckFn = fn(&Spec, &dyn SystemState) -> Result<(), CheckFailure>;

/// One registry entry.
#[derive(Clone, Copy)]
pub struct Check {
    pub description: &'static str,
    pub level: ComplianceLevel,
    pub applies: fn(&Platform) -> bool,
    pub run: CheckFn,
}

impl fmt::Debug for Check {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Check")
            .field("description", &self.description)
            .field("level", &self.level)
            .finish()
    }
}

fn any_platform(_: &Platform) -> bool {
    true
}

fn linux_only(platform: &Platform) -> bool {
    platform.is_linux()
}

fn stacked_mounts(platform: &Platform) -> bool {
    platform.has_stacked_mounts()
}

fn check(
    description: &'static str,
    level: ComplianceLevel,
    applies: fn(&Platform) -> bool,
    run: CheckFn,
) -> Check {
    Check {
        description,
        level,
        applies,
        run,
    }
}

use ComplianceLevel::{Must, Should};

/// The full registry in execution order.
pub fn registry() -> Vec<Check> {
    vec![
        check("root filesystem", Must, any_platform, filesystem::validate_rootfs),
        check("process uid", Must, any_platform, process::validate_uid),
        check("process gid", Must, any_platform, process::validate_gid),
        check("supplementary groups", Must, any_platform, process::validate_additional_gids),
        check("working directory", Must, any_platform, process::validate_cwd),
        check("process arguments", Must, any_platform, process::validate_args),
        check("environment", Must, any_platform, process::validate_env),
        check("no new privileges", Must, any_platform, process::validate_no_new_privileges),
        check("capabilities", Must, any_platform, capabilities::validate_capabilities),
        check("hostname", Must, any_platform, process::validate_hostname),
        check("rlimits", Must, any_platform, process::validate_rlimits),
        check("mounts exist", Must, any_platform, mounts::validate_mounts_exist),
        check("mount order", Must, stacked_mounts, mounts::validate_mount_order),
        check("default filesystems", Should, linux_only, filesystem::validate_default_filesystems),
        check("default devices", Must, linux_only, filesystem::validate_default_devices),
        check("default symlinks", Must, linux_only, filesystem::validate_default_symlinks),
        check("linux devices", Must, linux_only, filesystem::validate_devices),
        check("sysctl", Must, linux_only, sysctl::validate_sysctl),
        check("masked paths", Must, linux_only, filesystem::validate_masked_paths),
        check("readonly paths", Must, linux_only, filesystem::validate_readonly_paths),
        check("oom score adj", Must, linux_only, process::validate_oom_score_adj),
        check("uid mappings", Must, linux_only, idmap::validate_uid_mappings),
        check("gid mappings", Must, linux_only, idmap::validate_gid_mappings),
    ]
}
