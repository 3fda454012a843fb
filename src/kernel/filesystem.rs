//! File metadata, device decoding and access probes

use std::fs::{self, File, OpenOptions};
use std::io::{self, Read};
use std::os::unix::fs::MetadataExt;
use std::path::{Path, PathBuf};

/// Subset of stat(2) the checks need.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FileStat {
    pub mode: u32,
    pub rdev: u64,
    pub uid: u32,
    pub gid: u32,
}

impl FileStat {
    pub fn kind(&self) -> DeviceKind {
        DeviceKind::from_mode(self.mode)
    }

    pub fn permissions(&self) -> u32 {
        self.mode & 0o777
    }

    pub fn major(&self) -> u64 {
        device_major(self.rdev)
    }

    pub fn minor(&self) -> u64 {
        device_minor(self.rdev)
    }
}

/// File type as written in the `type` field of a device entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DeviceKind {
    Char,
    Block,
    Fifo,
    Unmatched,
}

impl DeviceKind {
    pub fn from_mode(mode: u32) -> Self {
        match mode & libc::S_IFMT as u32 {
            m if m == libc::S_IFCHR as u32 => DeviceKind::Char,
            m if m == libc::S_IFBLK as u32 => DeviceKind::Block,
            m if m == libc::S_IFIFO as u32 => DeviceKind::Fifo,
            _ => DeviceKind::Unmatched,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            DeviceKind::Char => "c",
            DeviceKind::Block => "b",
            DeviceKind::Fifo => "p",
            DeviceKind::Unmatched => "unmatched",
        }
    }

    /// `u` (unbuffered character) is satisfied by a character device only.
    pub fn satisfies(self, declared: &str) -> bool {
        match self {
            DeviceKind::Unmatched => false,
            DeviceKind::Char => declared == "c" || declared == "u",
            other => declared == other.as_str(),
        }
    }

    pub fn is_device(self) -> bool {
        matches!(self, DeviceKind::Char | DeviceKind::Block)
    }
}

/// Major number: bits 8..19 of the device id.
pub fn device_major(rdev: u64) -> u64 {
    (rdev >> 8) & 0xfff
}

/// Minor number: low byte plus bits 20..31 of the device id.
pub fn device_minor(rdev: u64) -> u64 {
    (rdev & 0xff) | ((rdev >> 12) & 0xfff00)
}

/// Inverse of [`device_major`] and [`device_minor`].
pub fn device_id(major: u64, minor: u64) -> u64 {
    (minor & 0xff) | ((major & 0xfff) << 8) | ((minor & !0xff) << 12)
}

/// stat(2), following symlinks.
pub fn stat(path: &Path) -> io::Result<FileStat> {
    let meta = fs::metadata(path)?;
    Ok(FileStat {
        mode: meta.mode(),
        rdev: meta.rdev(),
        uid: meta.uid(),
        gid: meta.gid(),
    })
}

/// Whether any data can be read from `path`.
///
/// A file is readable when its first one-byte read returns data; a directory
/// when it lists at least one entry. Missing or access-denied paths are not.
pub fn is_readable(path: &Path) -> io::Result<bool> {
    let meta = match fs::metadata(path) {
        Ok(meta) => meta,
        Err(e) if e.kind() == io::ErrorKind::NotFound => return Ok(false),
        Err(e) => return Err(e),
    };

    if meta.is_dir() {
        return match fs::read_dir(path) {
            Ok(mut entries) => Ok(entries.next().is_some()),
            Err(e) if e.kind() == io::ErrorKind::PermissionDenied => Ok(false),
            Err(e) => Err(e),
        };
    }

    let mut file = match File::open(path) {
        Ok(file) => file,
        Err(e) if e.kind() == io::ErrorKind::PermissionDenied => return Ok(false),
        Err(e) => return Err(e),
    };
    let mut buf = [0u8; 1];
    Ok(file.read(&mut buf)? > 0)
}

/// Temporary file that is removed when the guard goes out of scope.
struct ProbeFile {
    path: PathBuf,
}

impl ProbeFile {
    fn create(dir: &Path) -> io::Result<Self> {
        let path = dir.join(format!(".runtimetest-probe-{}", uuid::Uuid::new_v4()));
        OpenOptions::new().write(true).create_new(true).open(&path)?;
        Ok(Self { path })
    }
}

impl Drop for ProbeFile {
    fn drop(&mut self) {
        if let Err(e) = fs::remove_file(&self.path) {
            log::warn!("Failed to remove probe file {}: {}", self.path.display(), e);
        }
    }
}

/// Try to write into `target` without leaving anything behind.
///
/// Directories get a temporary file created and removed inside them; other
/// files are opened for writing without truncation. `Ok` means writable.
pub fn probe_write(target: &Path) -> io::Result<()> {
    let meta = fs::metadata(target)?;

    if meta.is_dir() {
        let probe = ProbeFile::create(target)?;
        log::debug!("Created probe file {}", probe.path.display());
        return Ok(());
    }

    OpenOptions::new().write(true).open(target).map(|_| ())
}
