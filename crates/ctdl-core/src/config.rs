use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

pub const DEFAULT_API_BASE: &str = "https://api.umpsa.top";
pub const DEFAULT_USER_AGENT: &str = "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/139.0.0.0 Safari/537.36";
pub const DEFAULT_ARCHIVE_BASE_URL: &str =
    "https://github.com/ericwang2006/aria2-static-build-binaries/releases/download/v25.8.30/";

/// Accelerator settings (`[accelerator]` section in config.toml).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AcceleratorConfig {
    /// Logical binary name; also the prefix of the release archive name.
    pub name: String,
    /// Base URL the platform archive name is appended to.
    pub archive_base_url: String,
    /// Expected SHA-256 (hex) of the platform archive. Skipped when unset.
    pub archive_sha256: Option<String>,
    /// Connections per server (`-x`).
    pub connections: u32,
    /// Pieces per download (`-s`).
    pub splits: u32,
    /// Passed to the accelerator before the URL.
    pub extra_args: Vec<String>,
    /// Directory for the temporary archive; system temp dir when unset.
    pub temp_dir: Option<PathBuf>,
}

impl Default for AcceleratorConfig {
    fn default() -> Self {
        Self {
            name: "aria2c".to_string(),
            archive_base_url: DEFAULT_ARCHIVE_BASE_URL.to_string(),
            archive_sha256: None,
            connections: 64,
            splits: 64,
            extra_args: Vec::new(),
            temp_dir: None,
        }
    }
}

/// Global configuration loaded from `~/.config/ctdl/config.toml`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CtdlConfig {
    /// Base URL of the link resolution API.
    pub api_base: String,
    /// User-Agent sent with every request and passed to the accelerator.
    pub user_agent: String,
    /// Redirect hops followed by the filename probe.
    pub max_redirects: u32,
    pub accelerator: AcceleratorConfig,
}

impl Default for CtdlConfig {
    fn default() -> Self {
        Self {
            api_base: DEFAULT_API_BASE.to_string(),
            user_agent: DEFAULT_USER_AGENT.to_string(),
            max_redirects: 5,
            accelerator: AcceleratorConfig::default(),
        }
    }
}

impl CtdlConfig {
    /// Rejects values the pipeline cannot work with.
    pub fn validate(&self) -> crate::Result<()> {
        if url::Url::parse(&self.api_base).is_err() {
            return Err(crate::Error::Config(format!(
                "api_base is not a URL: {}",
                self.api_base
            )));
        }
        if self.accelerator.name.is_empty() {
            return Err(crate::Error::Config(
                "accelerator.name must not be empty".to_string(),
            ));
        }
        if self.accelerator.connections == 0 || self.accelerator.splits == 0 {
            return Err(crate::Error::Config(
                "accelerator.connections and accelerator.splits must be at least 1".to_string(),
            ));
        }
        Ok(())
    }
}

/// `$XDG_CONFIG_HOME/ctdl/config.toml`. Nothing is created on disk.
pub fn config_path() -> Result<PathBuf> {
    let xdg_dirs = xdg::BaseDirectories::with_prefix("ctdl")?;
    Ok(xdg_dirs.get_config_home().join("config.toml"))
}

/// Load configuration from the default location, creating a default file if
/// none exists. The defaults are enough to run, so an unknown or unwritable
/// config location only logs a warning; a file that exists but cannot be
/// read or parsed is still an error.
pub fn load_or_init() -> Result<CtdlConfig> {
    match config_path() {
        Ok(path) => load_or_init_at(&path),
        Err(e) => {
            tracing::warn!("no config location ({:#}), using defaults", e);
            Ok(CtdlConfig::default())
        }
    }
}

/// [`load_or_init`] for an explicit location.
pub fn load_or_init_at(path: &Path) -> Result<CtdlConfig> {
    if path.exists() {
        return load_from_path(path);
    }
    let default_cfg = CtdlConfig::default();
    match write_default(path, &default_cfg) {
        Ok(()) => tracing::info!("created default config at {}", path.display()),
        Err(e) => tracing::warn!("could not create default config ({:#}), using defaults", e),
    }
    Ok(default_cfg)
}

fn write_default(path: &Path, cfg: &CtdlConfig) -> Result<()> {
    let toml = toml::to_string_pretty(cfg)?;
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)
            .with_context(|| format!("create config directory {}", parent.display()))?;
    }
    fs::write(path, toml).with_context(|| format!("write config {}", path.display()))?;
    Ok(())
}

/// Load configuration from an explicit file; missing keys take defaults.
pub fn load_from_path(path: &Path) -> Result<CtdlConfig> {
    let data =
        fs::read_to_string(path).with_context(|| format!("read config {}", path.display()))?;
    let cfg: CtdlConfig =
        toml::from_str(&data).with_context(|| format!("parse config {}", path.display()))?;
    Ok(cfg)
}
