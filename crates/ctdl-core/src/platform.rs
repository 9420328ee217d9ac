//! Platform identification and release archive naming.
//!
//! The accelerator release archives follow the `<name>_<os>_<arch>.tar.gz`
//! scheme with Go-style os/arch identifiers (`darwin`, `amd64`, ...), so the
//! Rust target constants are translated into that vocabulary.

use std::fmt;

/// (os, arch) pair in release naming vocabulary.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct PlatformKey {
    pub os: String,
    pub arch: String,
}

impl PlatformKey {
    pub fn new(os: impl Into<String>, arch: impl Into<String>) -> Self {
        Self {
            os: os.into(),
            arch: arch.into(),
        }
    }

    /// Platform of the running program.
    pub fn current() -> Self {
        Self::from_rust_target(
            std::env::consts::OS,
            std::env::consts::ARCH,
            cfg!(target_endian = "little"),
        )
    }

    /// Translates `std::env::consts` values into release naming.
    ///
    /// `std::env::consts::ARCH` does not distinguish byte order for
    /// `powerpc64`, so the caller supplies it.
    pub fn from_rust_target(os: &str, arch: &str, little_endian: bool) -> Self {
        let os = match os {
            "macos" => "darwin",
            other => other,
        };
        let arch = match arch {
            "x86_64" => "amd64",
            "aarch64" => "arm64",
            "x86" => "386",
            "powerpc64" if little_endian => "ppc64le",
            "powerpc64" => "ppc64",
            "loongarch64" => "loong64",
            other => other,
        };
        Self::new(os, arch)
    }

    pub fn is_windows(&self) -> bool {
        self.os == "windows"
    }

    /// File name of an executable called `name` on this platform.
    pub fn executable_name(&self, name: &str) -> String {
        if self.is_windows() {
            format!("{}.exe", name)
        } else {
            name.to_string()
        }
    }
}

impl fmt::Display for PlatformKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.os, self.arch)
    }
}

/// Strategy that maps a binary and platform to the archive file name to fetch.
pub trait ArchiveNamer {
    fn archive_name(&self, logical_name: &str, platform: &PlatformKey) -> String;
}

/// `<name>_<os>_<arch>.tar.gz`
#[derive(Debug, Clone, Copy, Default)]
pub struct ReleaseArchiveNamer;

impl ArchiveNamer for ReleaseArchiveNamer {
    fn archive_name(&self, logical_name: &str, platform: &PlatformKey) -> String {
        format!("{}_{}_{}.tar.gz", logical_name, platform.os, platform.arch)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rust_targets_map_to_release_names() {
        assert_eq!(
            PlatformKey::from_rust_target("linux", "x86_64", true),
            PlatformKey::new("linux", "amd64")
        );
        assert_eq!(
            PlatformKey::from_rust_target("macos", "aarch64", true),
            PlatformKey::new("darwin", "arm64")
        );
        assert_eq!(
            PlatformKey::from_rust_target("windows", "x86", true),
            PlatformKey::new("windows", "386")
        );
        assert_eq!(
            PlatformKey::from_rust_target("freebsd", "riscv64", true),
            PlatformKey::new("freebsd", "riscv64")
        );
    }

    #[test]
    fn powerpc64_name_depends_on_byte_order() {
        assert_eq!(
            PlatformKey::from_rust_target("linux", "powerpc64", true).arch,
            "ppc64le"
        );
        assert_eq!(
            PlatformKey::from_rust_target("linux", "powerpc64", false).arch,
            "ppc64"
        );
        // Byte order only matters where the arch name is ambiguous.
        assert_eq!(
            PlatformKey::from_rust_target("linux", "x86_64", false).arch,
            "amd64"
        );
    }

    #[test]
    fn executable_suffix_only_on_windows() {
        assert_eq!(
            PlatformKey::new("windows", "amd64").executable_name("aria2c"),
            "aria2c.exe"
        );
        assert_eq!(
            PlatformKey::new("linux", "arm64").executable_name("aria2c"),
            "aria2c"
        );
    }

    #[test]
    fn release_archive_name() {
        let name = ReleaseArchiveNamer.archive_name("aria2c", &PlatformKey::new("linux", "amd64"));
        assert_eq!(name, "aria2c_linux_amd64.tar.gz");
    }
}
