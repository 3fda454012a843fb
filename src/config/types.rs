/// Core types shared by the loader, the check registry and the reporter
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::PathBuf;
use std::str::FromStr;
use thiserror::Error;

/// RFC 2119 requirement level attached to every check.
///
/// Ordered from weakest to strongest so that grading is a plain comparison.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum ComplianceLevel {
    May,
    Should,
    Must,
}

impl ComplianceLevel {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::May => "MAY",
            Self::Should => "SHOULD",
            Self::Must => "MUST",
        }
    }
}

impl Default for ComplianceLevel {
    fn default() -> Self {
        ComplianceLevel::Must
    }
}

impl fmt::Display for ComplianceLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ComplianceLevel {
    type Err = RuntimeTestError;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_ascii_lowercase().as_str() {
            "may" => Ok(Self::May),
            "should" => Ok(Self::Should),
            "must" => Ok(Self::Must),
            other => Err(RuntimeTestError::Config(format!(
                "unknown compliance level '{}' (expected may, should or must)",
                other
            ))),
        }
    }
}

/// Target operating system of the configuration document.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Platform {
    Linux,
    Windows,
    Other(String),
}

impl Platform {
    pub fn from_os(os: &str) -> Self {
        match os {
            "linux" => Platform::Linux,
            "windows" => Platform::Windows,
            other => Platform::Other(other.to_string()),
        }
    }

    /// Platform this binary was built for.
    pub fn host() -> Self {
        Self::from_os(std::env::consts::OS)
    }

    pub fn is_linux(&self) -> bool {
        *self == Platform::Linux
    }

    /// Whether mounts stack on top of each other (nested mountpoints can shadow).
    pub fn has_stacked_mounts(&self) -> bool {
        *self != Platform::Windows
    }
}

impl fmt::Display for Platform {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Platform::Linux => f.write_str("linux"),
            Platform::Windows => f.write_str("windows"),
            Platform::Other(os) => f.write_str(os),
        }
    }
}

/// Errors that abort a run before any check executes.
#[derive(Error, Debug)]
pub enum RuntimeTestError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("{} not found", .0.display())]
    ConfigNotFound(PathBuf),

    #[error("Failed to parse configuration: {0}")]
    ConfigParse(#[from] serde_json::Error),

    #[error("Mandatory information missing: {}", .0.join(", "))]
    MissingFields(Vec<String>),

    #[error("Configuration error: {0}")]
    Config(String),
}

pub type Result<T> = std::result::Result<T, RuntimeTestError>;
