/// Live mount table
/// Reads /proc/self/mountinfo in kernel order (oldest mount first)
use std::fs;
use std::io;

pub const MOUNTINFO_PATH: &str = "/proc/self/mountinfo";

/// One line of the mount table.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct MountRecord {
    pub mountpoint: String,
    pub fstype: String,
    pub source: String,
}

impl MountRecord {
    pub fn new(mountpoint: &str, fstype: &str, source: &str) -> Self {
        Self {
            mountpoint: mountpoint.to_string(),
            fstype: fstype.to_string(),
            source: source.to_string(),
        }
    }
}

/// Read and parse the calling process's mount table.
pub fn read_mounts() -> io::Result<Vec<MountRecord>> {
    let content = fs::read_to_string(MOUNTINFO_PATH)?;
    Ok(parse_mountinfo(&content))
}

/// Parse mountinfo content, skipping lines that do not have the expected shape.
pub fn parse_mountinfo(content: &str) -> Vec<MountRecord> {
    content.lines().filter_map(parse_mountinfo_line).collect()
}

/// Parse a single line from /proc/self/mountinfo
/// Format: mount_id parent_id major:minor root mount_point options
/// [optional...] - fs_type source super_options
fn parse_mountinfo_line(line: &str) -> Option<MountRecord> {
    let parts: Vec<&str> = line.split_whitespace().collect();

    if parts.len() < 9 {
        return None;
    }

    // Optional fields sit between the mount options and the separator.
    let sep_pos = parts.iter().skip(6).position(|&p| p == "-")? + 6;
    let fstype = parts.get(sep_pos + 1)?;
    let source = parts.get(sep_pos + 2)?;

    Some(MountRecord {
        mountpoint: unescape(parts[4]),
        fstype: unescape(fstype),
        source: unescape(source),
    })
}

/// Decode the kernel's octal escapes (`\040` for space, `\011` for tab, ...).
fn unescape(field: &str) -> String {
    if !field.contains('\\') {
        return field.to_string();
    }

    let bytes = field.as_bytes();
    let mut out = Vec::with_capacity(bytes.len());
    let mut i = 0;
    while i < bytes.len() {
        if bytes[i] == b'\\' && i + 3 < bytes.len() && is_octal(&bytes[i + 1..i + 4]) {
            let value =
                (bytes[i + 1] - b'0') * 64 + (bytes[i + 2] - b'0') * 8 + (bytes[i + 3] - b'0');
            out.push(value);
            i += 4;
        } else {
            out.push(bytes[i]);
            i += 1;
        }
    }
    String::from_utf8_lossy(&out).into_owned()
}

fn is_octal(digits: &[u8]) -> bool {
    digits.len() == 3 && digits[0] <= b'3' && digits.iter().all(|d| (b'0'..=b'7').contains(d))
}
