//! Selective extraction: one regular file, matched by base name.

use std::ffi::OsStr;
use std::fs;
use std::io::Read;
use std::path::Path;

use flate2::read::GzDecoder;
use tar::Archive;

use super::{apply_mode, copy_entry, corrupt, create_parent_dirs, ArchiveEntry, EntryKind};
use crate::error::{Error, Result};

/// Scans the archive for the first regular file whose base name is `name` and
/// writes it to `dest` with the entry's permission bits.
///
/// Reading stops at the match, so anything after it in the stream is never
/// decoded. Fails with `NotFound` when the archive ends without a match and
/// with `CorruptArchive` when gzip or tar framing is broken before that.
pub fn extract_file<R: Read>(reader: R, name: &str, dest: &Path) -> Result<ArchiveEntry> {
    let mut archive = Archive::new(GzDecoder::new(reader));
    let entries = archive.entries().map_err(corrupt)?;

    for entry in entries {
        let mut entry = entry.map_err(corrupt)?;
        if !entry.header().entry_type().is_file() {
            continue;
        }
        let path = entry.path().map_err(corrupt)?.into_owned();
        if path.file_name() != Some(OsStr::new(name)) {
            continue;
        }

        let mode = entry.header().mode().map_err(corrupt)?;
        create_parent_dirs(dest)?;
        let size = copy_entry(&mut entry, dest)?;
        apply_mode(dest, mode)?;

        tracing::debug!(
            entry = %path.display(),
            dest = %dest.display(),
            mode = format_args!("{:o}", mode),
            size,
            "extracted archive entry"
        );
        return Ok(ArchiveEntry {
            path,
            kind: EntryKind::File,
            mode,
            size,
        });
    }

    Err(Error::NotFound(format!("{} not found in archive", name)))
}

/// [`extract_file`] over an archive on disk.
pub fn extract_file_from_path(archive: &Path, name: &str, dest: &Path) -> Result<ArchiveEntry> {
    let file = fs::File::open(archive)
        .map_err(|e| Error::io(format!("open {}", archive.display()), e))?;
    extract_file(file, name, dest)
}
