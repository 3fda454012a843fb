//! Capability and no_new_privs queries.
use super::{CapabilityNumber, CapabilitySet, CapabilitySnapshot, PR_GET_NO_NEW_PRIVS};
use std::fs;
use std::io;

const STATUS_PATH: &str = "/proc/self/status";
const CAP_LAST_CAP_PATH: &str = "/proc/sys/kernel/cap_last_cap";

/// Highest capability number the running kernel supports.
///
/// Kernels without cap_last_cap are treated as knowing every named capability.
/// RHEL6 reports 63 there; CAP_BLOCK_SUSPEND is the real ceiling on those.
pub fn read_last_cap() -> u32 {
    let last = match fs::read_to_string(CAP_LAST_CAP_PATH) {
        Ok(content) => match content.trim().parse::<u32>() {
            Ok(last) => last,
            Err(e) => {
                log::warn!("Unparseable {}: {}", CAP_LAST_CAP_PATH, e);
                CapabilityNumber::MAX_CAP
            }
        },
        Err(e) => {
            log::warn!("Cannot read {}: {}", CAP_LAST_CAP_PATH, e);
            CapabilityNumber::MAX_CAP
        }
    };

    if last == 63 {
        return 36;
    }
    last.min(CapabilityNumber::MAX_CAP)
}

/// Read all five capability sets of the calling process.
pub fn read_snapshot() -> io::Result<CapabilitySnapshot> {
    let status = fs::read_to_string(STATUS_PATH)?;
    parse_status(&status, read_last_cap())
}

/// Build a snapshot from /proc/<pid>/status content.
///
/// CapAmb is missing before Linux 4.3 and reads as an empty set.
pub fn parse_status(status: &str, last_cap: u32) -> io::Result<CapabilitySnapshot> {
    let mut snapshot = CapabilitySnapshot::new(last_cap);

    for set in CapabilitySet::ALL {
        let line = status.lines().find(|l| l.starts_with(set.status_key()));
        let mask = match line {
            Some(line) => {
                let value = line[set.status_key().len()..].trim();
                u64::from_str_radix(value, 16).map_err(|e| {
                    io::Error::new(
                        io::ErrorKind::InvalidData,
                        format!("invalid {} value '{}': {}", set.status_key(), value, e),
                    )
                })?
            }
            None if set == CapabilitySet::Ambient => 0,
            None => {
                return Err(io::Error::new(
                    io::ErrorKind::InvalidData,
                    format!("{} missing from process status", set.status_key()),
                ))
            }
        };
        snapshot = snapshot.with_mask(set, mask);
    }

    Ok(snapshot)
}

/// Check if no_new_privs is set
pub fn check_no_new_privs() -> io::Result<bool> {
    // SAFETY: prctl(PR_GET_NO_NEW_PRIVS) takes no pointers and only reads process state.
    let result = unsafe { libc::prctl(PR_GET_NO_NEW_PRIVS, 0, 0, 0, 0) };

    if result < 0 {
        return Err(io::Error::last_os_error());
    }

    Ok(result == 1)
}
