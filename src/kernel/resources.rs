//! Resource limits and OOM score of the calling process.

use nix::sys::resource::{getrlimit, Resource};
use std::fs;
use std::io;

const OOM_SCORE_ADJ_PATH: &str = "/proc/self/oom_score_adj";

/// Symbolic limit names accepted in the configuration document.
const RLIMITS: &[(&str, Resource)] = &[
    ("RLIMIT_CPU", Resource::RLIMIT_CPU),
    ("RLIMIT_FSIZE", Resource::RLIMIT_FSIZE),
    ("RLIMIT_DATA", Resource::RLIMIT_DATA),
    ("RLIMIT_STACK", Resource::RLIMIT_STACK),
    ("RLIMIT_CORE", Resource::RLIMIT_CORE),
    ("RLIMIT_RSS", Resource::RLIMIT_RSS),
    ("RLIMIT_NPROC", Resource::RLIMIT_NPROC),
    ("RLIMIT_NOFILE", Resource::RLIMIT_NOFILE),
    ("RLIMIT_MEMLOCK", Resource::RLIMIT_MEMLOCK),
    ("RLIMIT_AS", Resource::RLIMIT_AS),
    ("RLIMIT_LOCKS", Resource::RLIMIT_LOCKS),
    ("RLIMIT_SIGPENDING", Resource::RLIMIT_SIGPENDING),
    ("RLIMIT_MSGQUEUE", Resource::RLIMIT_MSGQUEUE),
    ("RLIMIT_NICE", Resource::RLIMIT_NICE),
    ("RLIMIT_RTPRIO", Resource::RLIMIT_RTPRIO),
    ("RLIMIT_RTTIME", Resource::RLIMIT_RTTIME),
];

fn resource(name: &str) -> Option<Resource> {
    RLIMITS.iter().find(|(n, _)| *n == name).map(|(_, r)| *r)
}

/// Whether `name` is a limit the platform knows.
pub fn is_known_rlimit(name: &str) -> bool {
    resource(name).is_some()
}

/// (soft, hard) values of a named limit.
pub fn read_rlimit(name: &str) -> io::Result<(u64, u64)> {
    let resource = resource(name).ok_or_else(|| {
        io::Error::new(io::ErrorKind::InvalidInput, format!("unknown rlimit {}", name))
    })?;
    let (soft, hard) = getrlimit(resource).map_err(io::Error::from)?;
    Ok((soft as u64, hard as u64))
}

/// Current oom_score_adj of the process.
pub fn read_oom_score_adj() -> io::Result<i32> {
    let content = fs::read_to_string(OOM_SCORE_ADJ_PATH)?;
    parse_oom_score_adj(&content)
}

fn parse_oom_score_adj(content: &str) -> io::Result<i32> {
    content.trim().parse::<i32>().map_err(|e| {
        io::Error::new(
            io::ErrorKind::InvalidData,
            format!("invalid oom_score_adj '{}': {}", content.trim(), e),
        )
    })
}
