//! Extraction of gzip-compressed tar streams.
//!
//! Two modes: [`extract_file`] pulls a single regular file out by base name
//! and stops reading at the match; [`extract_all`] recreates the whole tree.
//! Both preserve entry permission bits on unix and create missing parent
//! directories with mode `0o755`.

mod select;
mod unpack;
#[cfg(test)]
pub(crate) mod test_support;

pub use select::{extract_file, extract_file_from_path};
pub use unpack::extract_all;

use std::fs;
use std::io::{self, Read, Write};
use std::path::{Path, PathBuf};

use crate::error::{Error, Result};

/// Mode for directories created on the way to an entry.
const DIR_MODE: u32 = 0o755;
const BUF_SIZE: usize = 64 * 1024;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EntryKind {
    File,
    Directory,
}

/// An entry as read from the tar stream. Content is streamed to disk, not kept.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ArchiveEntry {
    /// Path as recorded in the archive.
    pub path: PathBuf,
    pub kind: EntryKind,
    /// Permission bits from the tar header.
    pub mode: u32,
    pub size: u64,
}

fn corrupt(e: io::Error) -> Error {
    Error::CorruptArchive(e.to_string())
}

fn create_dir_all_with_mode(dir: &Path) -> Result<()> {
    #[cfg(unix)]
    let result = {
        use std::os::unix::fs::DirBuilderExt;
        fs::DirBuilder::new()
            .recursive(true)
            .mode(DIR_MODE)
            .create(dir)
    };
    #[cfg(not(unix))]
    let result = fs::create_dir_all(dir);

    result.map_err(|e| Error::io(format!("create directory {}", dir.display()), e))
}

fn create_parent_dirs(path: &Path) -> Result<()> {
    match path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => create_dir_all_with_mode(parent),
        _ => Ok(()),
    }
}

/// Copies an entry's bytes to `dest`. Read failures mean the stream is
/// broken; write failures are local I/O errors.
fn copy_entry<R: Read>(entry: &mut R, dest: &Path) -> Result<u64> {
    let mut out = fs::File::create(dest)
        .map_err(|e| Error::io(format!("create {}", dest.display()), e))?;
    let mut buf = vec![0u8; BUF_SIZE];
    let mut total = 0u64;
    loop {
        let n = match entry.read(&mut buf) {
            Ok(0) => break,
            Ok(n) => n,
            Err(e) if e.kind() == io::ErrorKind::Interrupted => continue,
            Err(e) => return Err(corrupt(e)),
        };
        out.write_all(&buf[..n])
            .map_err(|e| Error::io(format!("write {}", dest.display()), e))?;
        total += n as u64;
    }
    out.flush()
        .map_err(|e| Error::io(format!("write {}", dest.display()), e))?;
    Ok(total)
}

fn apply_mode(path: &Path, mode: u32) -> Result<()> {
    #[cfg(unix)]
    {
        use std::os::unix::fs::PermissionsExt;
        fs::set_permissions(path, fs::Permissions::from_mode(mode & 0o7777))
            .map_err(|e| Error::io(format!("set mode on {}", path.display()), e))?;
    }
    #[cfg(not(unix))]
    let _ = (path, mode);
    Ok(())
}
