//! Accelerator bootstrap: make sure the external binary sits next to the
//! running program, downloading and unpacking it on first use.
//!
//! The release archive goes to a temporary file that is removed on every exit
//! path. The binary is extracted to a staging file in the install directory and
//! only renamed onto the final path once it is complete and executable, so a
//! failed run never leaves a half-written binary where the fast path would
//! pick it up.

use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use tempfile::{NamedTempFile, TempPath};

use crate::archive;
use crate::checksum;
use crate::config::CtdlConfig;
use crate::error::{Error, Result};
use crate::platform::{ArchiveNamer, PlatformKey, ReleaseArchiveNamer};
use crate::transport::{user_agent_headers, Transport};

/// Where the accelerator lives and whether it was already there.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProvisionedBinary {
    pub path: PathBuf,
    /// True when the binary was present before this run.
    pub exists: bool,
}

/// Directory containing the running executable.
pub fn program_dir() -> Result<PathBuf> {
    let exe = std::env::current_exe().map_err(|e| Error::io("locate running executable", e))?;
    exe.parent().map(Path::to_path_buf).ok_or_else(|| {
        Error::io(
            format!("locate directory of {}", exe.display()),
            io::Error::new(io::ErrorKind::NotFound, "executable path has no parent"),
        )
    })
}

pub struct Provisioner<'a, T: Transport + ?Sized> {
    transport: &'a T,
    logical_name: String,
    base_url: String,
    user_agent: String,
    sha256: Option<String>,
    temp_dir: Option<PathBuf>,
    namer: Box<dyn ArchiveNamer + 'a>,
}

impl<'a, T: Transport + ?Sized> Provisioner<'a, T> {
    pub fn new(
        transport: &'a T,
        logical_name: impl Into<String>,
        base_url: impl Into<String>,
        user_agent: impl Into<String>,
    ) -> Self {
        Self {
            transport,
            logical_name: logical_name.into(),
            base_url: base_url.into(),
            user_agent: user_agent.into(),
            sha256: None,
            temp_dir: None,
            namer: Box::new(ReleaseArchiveNamer),
        }
    }

    pub fn from_config(transport: &'a T, cfg: &CtdlConfig) -> Self {
        let accel = &cfg.accelerator;
        Self::new(
            transport,
            accel.name.clone(),
            accel.archive_base_url.clone(),
            cfg.user_agent.clone(),
        )
        .with_sha256(accel.archive_sha256.clone())
        .with_temp_dir(accel.temp_dir.clone())
    }

    pub fn with_namer(mut self, namer: impl ArchiveNamer + 'a) -> Self {
        self.namer = Box::new(namer);
        self
    }

    pub fn with_sha256(mut self, sha256: Option<String>) -> Self {
        self.sha256 = sha256;
        self
    }

    pub fn with_temp_dir(mut self, temp_dir: Option<PathBuf>) -> Self {
        self.temp_dir = temp_dir;
        self
    }

    /// `<install_dir>/<name>[.exe]`
    pub fn binary_path(&self, platform: &PlatformKey, install_dir: &Path) -> PathBuf {
        install_dir.join(platform.executable_name(&self.logical_name))
    }

    pub fn archive_url(&self, platform: &PlatformKey) -> String {
        let name = self.namer.archive_name(&self.logical_name, platform);
        format!("{}{}", self.base_url, name)
    }

    /// Returns the binary path, fetching and installing the binary first if
    /// nothing exists there yet. An existing entry is trusted as is.
    pub fn ensure(&self, platform: &PlatformKey, install_dir: &Path) -> Result<ProvisionedBinary> {
        let target = self.binary_path(platform, install_dir);
        if target.exists() {
            tracing::debug!(path = %target.display(), "accelerator already present");
            return Ok(ProvisionedBinary {
                path: target,
                exists: true,
            });
        }

        let archive_name = self.namer.archive_name(&self.logical_name, platform);
        let url = format!("{}{}", self.base_url, archive_name);
        tracing::info!(%url, %platform, "accelerator missing, downloading");

        let archive = self.fetch_archive(&url, &archive_name)?;
        self.verify(&url, archive.path())?;

        let binary_name = platform.executable_name(&self.logical_name);
        let staged = stage_binary(archive.path(), &binary_name, &target);
        if let Err(e) = archive.close() {
            tracing::warn!("could not remove temporary archive: {}", e);
        }
        let staged = staged?;

        if !platform.is_windows() {
            make_executable(&staged)?;
        }
        staged.persist(&target).map_err(|e| {
            Error::io(format!("move binary into {}", target.display()), e.error)
        })?;

        tracing::info!(path = %target.display(), "accelerator installed");
        Ok(ProvisionedBinary {
            path: target,
            exists: false,
        })
    }

    fn fetch_archive(&self, url: &str, archive_name: &str) -> Result<NamedTempFile> {
        let dir = self.temp_dir.clone().unwrap_or_else(std::env::temp_dir);
        let mut file = tempfile::Builder::new()
            .prefix(&format!("{}.", archive_name))
            .tempfile_in(&dir)
            .map_err(|e| Error::io(format!("create temporary file in {}", dir.display()), e))?;

        let headers = user_agent_headers(&self.user_agent);
        let status = self
            .transport
            .download(url, &headers, file.as_file_mut())
            .map_err(|e| Error::DownloadFailed {
                url: url.to_string(),
                reason: e.to_string(),
            })?;
        if status != 200 {
            return Err(Error::DownloadFailed {
                url: url.to_string(),
                reason: format!("HTTP {}", status),
            });
        }
        Ok(file)
    }

    fn verify(&self, url: &str, archive: &Path) -> Result<()> {
        let actual = checksum::sha256_path(archive)?;
        tracing::debug!(%url, sha256 = %actual, "archive digest");
        match &self.sha256 {
            Some(expected) if !checksum::digest_matches(&actual, expected) => {
                Err(Error::ChecksumMismatch {
                    url: url.to_string(),
                    expected: expected.trim().to_string(),
                    actual,
                })
            }
            _ => Ok(()),
        }
    }
}

/// Extracts `binary_name` into a hidden staging file next to `target`.
/// The staging file is deleted when the returned path is dropped unpersisted.
fn stage_binary(archive: &Path, binary_name: &str, target: &Path) -> Result<TempPath> {
    let dir = target.parent().unwrap_or_else(|| Path::new("."));
    fs::create_dir_all(dir)
        .map_err(|e| Error::io(format!("create directory {}", dir.display()), e))?;
    let staging = tempfile::Builder::new()
        .prefix(&format!(".{}.", binary_name))
        .tempfile_in(dir)
        .map_err(|e| Error::io(format!("create staging file in {}", dir.display()), e))?
        .into_temp_path();
    archive::extract_file_from_path(archive, binary_name, &staging)?;
    Ok(staging)
}

#[cfg(unix)]
fn make_executable(path: &Path) -> Result<()> {
    use std::os::unix::fs::PermissionsExt;
    fs::set_permissions(path, fs::Permissions::from_mode(0o755)).map_err(|source| {
        Error::PermissionDenied {
            path: path.to_path_buf(),
            source,
        }
    })
}

#[cfg(not(unix))]
fn make_executable(_path: &Path) -> Result<()> {
    Ok(())
}
