//! User namespace id-mapping tables.

use crate::config::spec::IdMapping;
use std::fs;
use std::io;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum IdMapKind {
    Uid,
    Gid,
}

impl IdMapKind {
    pub fn name(self) -> &'static str {
        match self {
            IdMapKind::Uid => "uid",
            IdMapKind::Gid => "gid",
        }
    }

    pub fn proc_path(self) -> &'static str {
        match self {
            IdMapKind::Uid => "/proc/self/uid_map",
            IdMapKind::Gid => "/proc/self/gid_map",
        }
    }
}

/// Read the live mapping table of the calling process.
pub fn read_id_map(kind: IdMapKind) -> io::Result<Vec<IdMapping>> {
    let content = fs::read_to_string(kind.proc_path())?;
    parse_id_map(&content)
}

/// Parse `inside outside length` lines into mappings.
pub fn parse_id_map(content: &str) -> io::Result<Vec<IdMapping>> {
    let mut mappings = Vec::new();

    for line in content.lines().filter(|l| !l.trim().is_empty()) {
        let fields: Vec<&str> = line.split_whitespace().collect();
        if fields.len() != 3 {
            return Err(invalid_line(line));
        }
        let parse = |s: &str| s.parse::<u32>().map_err(|_| invalid_line(line));

        mappings.push(IdMapping {
            container_id: parse(fields[0])?,
            host_id: parse(fields[1])?,
            size: parse(fields[2])?,
        });
    }

    Ok(mappings)
}

fn invalid_line(line: &str) -> io::Error {
    io::Error::new(
        io::ErrorKind::InvalidData,
        format!("invalid id map line '{}'", line.trim()),
    )
}
