/// Container configuration document (OCI `config.json` subset)
///
/// Everything the checks compare against lives here. The document is parsed
/// once per run and never mutated afterwards.
use crate::config::schema;
use crate::config::types::{Platform, Result, RuntimeTestError};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fs::File;
use std::io::BufReader;
use std::path::Path;

/// File name of the document inside the bundle directory.
pub const CONFIG_FILE: &str = "config.json";

#[derive(Clone, Debug, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Spec {
    #[serde(default)]
    pub oci_version: String,
    #[serde(default)]
    pub hostname: Option<String>,
    #[serde(default)]
    pub platform: Option<PlatformSpec>,
    #[serde(default)]
    pub root: Option<Root>,
    #[serde(default)]
    pub process: Option<Process>,
    #[serde(default)]
    pub mounts: Vec<Mount>,
    #[serde(default)]
    pub linux: Option<Linux>,
}

#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct PlatformSpec {
    #[serde(default)]
    pub os: String,
    #[serde(default)]
    pub arch: String,
}

#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct Root {
    #[serde(default)]
    pub path: String,
    #[serde(default)]
    pub readonly: bool,
}

#[derive(Clone, Debug, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Process {
    #[serde(default)]
    pub terminal: bool,
    #[serde(default)]
    pub user: User,
    #[serde(default)]
    pub args: Vec<String>,
    /// `KEY=VALUE` entries
    #[serde(default)]
    pub env: Vec<String>,
    #[serde(default)]
    pub cwd: String,
    #[serde(default)]
    pub capabilities: Option<Capabilities>,
    #[serde(default)]
    pub rlimits: Vec<Rlimit>,
    #[serde(default)]
    pub no_new_privileges: bool,
    #[serde(default)]
    pub oom_score_adj: Option<i32>,
}

#[derive(Clone, Debug, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct User {
    #[serde(default)]
    pub uid: u32,
    #[serde(default)]
    pub gid: u32,
    #[serde(default)]
    pub additional_gids: Vec<u32>,
}

/// Capability names (`CAP_*`) per set.
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct Capabilities {
    #[serde(default)]
    pub bounding: Vec<String>,
    #[serde(default)]
    pub effective: Vec<String>,
    #[serde(default)]
    pub inheritable: Vec<String>,
    #[serde(default)]
    pub permitted: Vec<String>,
    #[serde(default)]
    pub ambient: Vec<String>,
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Rlimit {
    #[serde(rename = "type")]
    pub kind: String,
    pub hard: u64,
    pub soft: u64,
}

#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct Mount {
    #[serde(default)]
    pub destination: String,
    #[serde(rename = "type", default)]
    pub kind: String,
    #[serde(default)]
    pub source: String,
    #[serde(default)]
    pub options: Vec<String>,
}

impl Mount {
    /// Bind mounts report a source that rarely matches the declared one.
    pub fn is_bind(&self) -> bool {
        self.kind == "bind" || self.options.iter().any(|o| o == "bind" || o == "rbind")
    }
}

#[derive(Clone, Debug, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Linux {
    #[serde(default)]
    pub namespaces: Vec<Namespace>,
    #[serde(default)]
    pub devices: Vec<Device>,
    #[serde(default)]
    pub sysctl: BTreeMap<String, String>,
    #[serde(default)]
    pub masked_paths: Vec<String>,
    #[serde(default)]
    pub readonly_paths: Vec<String>,
    #[serde(default)]
    pub uid_mappings: Vec<IdMapping>,
    #[serde(default)]
    pub gid_mappings: Vec<IdMapping>,
    #[serde(default)]
    pub cgroups_path: Option<String>,
    #[serde(default)]
    pub resources: Option<Resources>,
}

#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct Namespace {
    #[serde(rename = "type", default)]
    pub kind: String,
    #[serde(default)]
    pub path: Option<String>,
}

#[derive(Clone, Debug, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Device {
    #[serde(default)]
    pub path: String,
    /// One of `c`, `b`, `u` or `p`
    #[serde(rename = "type", default)]
    pub kind: String,
    #[serde(default)]
    pub major: i64,
    #[serde(default)]
    pub minor: i64,
    #[serde(default)]
    pub file_mode: Option<u32>,
    #[serde(default)]
    pub uid: Option<u32>,
    #[serde(default)]
    pub gid: Option<u32>,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct IdMapping {
    #[serde(rename = "hostID")]
    pub host_id: u32,
    #[serde(rename = "containerID")]
    pub container_id: u32,
    pub size: u32,
}

#[derive(Clone, Debug, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Resources {
    #[serde(default)]
    pub oom_score_adj: Option<i32>,
}

impl Spec {
    /// Load `config.json` from `dir` and check its mandatory fields.
    pub fn load(dir: &Path) -> Result<Self> {
        let path = dir.join(CONFIG_FILE);
        let file = match File::open(&path) {
            Ok(file) => file,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                return Err(RuntimeTestError::ConfigNotFound(path));
            }
            Err(e) => return Err(e.into()),
        };

        let spec: Spec = serde_json::from_reader(BufReader::new(file))?;
        let missing = schema::check_mandatory(&spec);
        if !missing.is_empty() {
            return Err(RuntimeTestError::MissingFields(missing));
        }

        log::debug!("Loaded configuration from {}", path.display());
        Ok(spec)
    }

    pub fn from_json(json: &str) -> Result<Self> {
        let spec: Spec = serde_json::from_str(json)?;
        let missing = schema::check_mandatory(&spec);
        if !missing.is_empty() {
            return Err(RuntimeTestError::MissingFields(missing));
        }
        Ok(spec)
    }

    /// Declared platform, or the host one when the document is silent.
    pub fn target_platform(&self) -> Platform {
        match self.platform.as_ref() {
            Some(p) if !p.os.is_empty() => Platform::from_os(&p.os),
            _ => Platform::host(),
        }
    }

    /// `process.oomScoreAdj` wins over `linux.resources.oomScoreAdj`.
    pub fn oom_score_adj(&self) -> Option<i32> {
        self.process
            .as_ref()
            .and_then(|p| p.oom_score_adj)
            .or_else(|| {
                self.linux
                    .as_ref()
                    .and_then(|l| l.resources.as_ref())
                    .and_then(|r| r.oom_score_adj)
            })
    }

    pub fn terminal(&self) -> bool {
        self.process.as_ref().map(|p| p.terminal).unwrap_or(false)
    }
}
