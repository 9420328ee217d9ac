//! Full extraction of a tree.

use std::io::Read;
use std::path::{Component, Path, PathBuf};

use flate2::read::GzDecoder;
use tar::Archive;

use super::{
    apply_mode, copy_entry, corrupt, create_dir_all_with_mode, create_parent_dirs, ArchiveEntry,
    EntryKind,
};
use crate::error::{Error, Result};

/// Recreates every directory and regular file of the archive under `root`.
///
/// Symlinks, hard links and device entries are skipped. Directory modes are
/// applied after all files are written so a read-only directory does not
/// block its own contents.
pub fn extract_all<R: Read>(reader: R, root: &Path) -> Result<Vec<ArchiveEntry>> {
    create_dir_all_with_mode(root)?;
    let mut archive = Archive::new(GzDecoder::new(reader));
    let mut extracted = Vec::new();
    let mut dir_modes: Vec<(PathBuf, u32)> = Vec::new();

    for entry in archive.entries().map_err(corrupt)? {
        let mut entry = entry.map_err(corrupt)?;
        let entry_type = entry.header().entry_type();
        let kind = if entry_type.is_dir() {
            EntryKind::Directory
        } else if entry_type.is_file() {
            EntryKind::File
        } else {
            tracing::debug!(?entry_type, "skipping archive entry");
            continue;
        };

        let path = entry.path().map_err(corrupt)?.into_owned();
        let relative = contained_path(&path)?;
        let mode = entry.header().mode().map_err(corrupt)?;
        let target = root.join(&relative);

        let size = match kind {
            EntryKind::Directory => {
                create_dir_all_with_mode(&target)?;
                if !relative.as_os_str().is_empty() {
                    dir_modes.push((target, mode));
                }
                0
            }
            EntryKind::File => {
                if relative.as_os_str().is_empty() {
                    return Err(Error::CorruptArchive(format!(
                        "file entry without a name: {}",
                        path.display()
                    )));
                }
                create_parent_dirs(&target)?;
                let size = copy_entry(&mut entry, &target)?;
                apply_mode(&target, mode)?;
                size
            }
        };

        extracted.push(ArchiveEntry {
            path,
            kind,
            mode,
            size,
        });
    }

    // Deepest first.
    for (dir, mode) in dir_modes.iter().rev() {
        apply_mode(dir, *mode)?;
    }

    tracing::debug!(root = %root.display(), entries = extracted.len(), "archive unpacked");
    Ok(extracted)
}

/// Normalizes an entry path, rejecting anything that would land outside the
/// destination root.
fn contained_path(path: &Path) -> Result<PathBuf> {
    let mut out = PathBuf::new();
    for component in path.components() {
        match component {
            Component::Normal(part) => out.push(part),
            Component::CurDir => {}
            Component::ParentDir | Component::RootDir | Component::Prefix(_) => {
                return Err(Error::CorruptArchive(format!(
                    "entry path escapes destination: {}",
                    path.display()
                )));
            }
        }
    }
    Ok(out)
}
