//! Identity of the calling process.

use nix::unistd::{getgid, getgroups, getuid};
use std::io;

/// Real UID of the process.
pub fn current_uid() -> u32 {
    getuid().as_raw()
}

/// Real GID of the process.
pub fn current_gid() -> u32 {
    getgid().as_raw()
}

/// Supplementary group list.
pub fn current_groups() -> io::Result<Vec<u32>> {
    let groups = getgroups().map_err(io::Error::from)?;
    Ok(groups.into_iter().map(|g| g.as_raw()).collect())
}
