//! CLI for the ctdl downloader.

use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Parser;
use ctdl_core::accelerator::SystemRunner;
use ctdl_core::config::{self, CtdlConfig};
use ctdl_core::pipeline::{Pipeline, Stage};
use ctdl_core::platform::PlatformKey;
use ctdl_core::provision;
use ctdl_core::resolver;
use ctdl_core::transport::CurlTransport;
use ctdl_core::ErrorKind;

pub const EXIT_OK: i32 = 0;
pub const EXIT_USAGE: i32 = 1;
pub const EXIT_FAILURE: i32 = 2;

/// Download a ctfile:// link with aria2c.
#[derive(Debug, Parser)]
#[command(name = "ctdl", version)]
#[command(
    about = "ctdl: resolve ctfile:// links and download them with aria2c",
    long_about = None
)]
pub struct Cli {
    /// Link to download, e.g. ctfile://abc123.
    pub link: String,

    /// Override the resolver API base URL.
    #[arg(long, value_name = "URL")]
    pub api: Option<String>,

    /// Read configuration from this file instead of the default location.
    #[arg(long, value_name = "PATH")]
    pub config: Option<PathBuf>,
}

impl Cli {
    /// Loads the configuration this invocation asks for and applies flag overrides.
    fn load_config(&self) -> Result<CtdlConfig> {
        let mut cfg = match &self.config {
            Some(path) => config::load_from_path(path)?,
            None => config::load_or_init().context("load default config")?,
        };
        apply_overrides(&mut cfg, self);
        cfg.validate()?;
        Ok(cfg)
    }
}

fn apply_overrides(cfg: &mut CtdlConfig, cli: &Cli) {
    if let Some(api) = &cli.api {
        cfg.api_base = api.clone();
    }
}

/// Parses arguments, runs the download and returns the process exit code.
pub fn run() -> i32 {
    let cli = match Cli::try_parse() {
        Ok(cli) => cli,
        Err(err) => {
            // --help and --version come through here as well.
            let code = if err.use_stderr() { EXIT_USAGE } else { EXIT_OK };
            let _ = err.print();
            return code;
        }
    };

    match execute(&cli) {
        Ok(()) => EXIT_OK,
        Err(err) => {
            tracing::error!("run failed: {:#}", err);
            eprintln!("ctdl error: {:#}", err);
            exit_code(&err)
        }
    }
}

fn execute(cli: &Cli) -> Result<()> {
    // Reject malformed links before touching config or the network.
    resolver::parse_link(&cli.link)?;

    let cfg = cli.load_config()?;
    let install_dir = provision::program_dir()?;
    let transport = CurlTransport::new();
    let runner = SystemRunner;

    let pipeline = Pipeline::new(
        &cfg,
        &transport,
        &runner,
        PlatformKey::current(),
        install_dir,
    );
    println!("Resolving {}", cli.link.trim());
    pipeline.run_with(&cli.link, report)?;
    println!("Download finished.");
    Ok(())
}

fn report(stage: Stage<'_>) {
    match stage {
        Stage::Provisioned(binary) if binary.exists => {
            println!("Using aria2c at {}", binary.path.display())
        }
        Stage::Provisioned(binary) => {
            println!("Installed aria2c to {}", binary.path.display())
        }
        Stage::Resolved(link) => {
            println!("Filename: {}", link.filename);
            println!("Download URL: {}", link.download_url);
        }
        Stage::Launching(cmd) => println!("Starting {}", cmd.program.display()),
    }
}

/// Malformed links are usage errors; everything else is an operational failure.
fn exit_code(err: &anyhow::Error) -> i32 {
    match err.downcast_ref::<ctdl_core::Error>() {
        Some(e) if e.kind() == ErrorKind::BadInput => EXIT_USAGE,
        _ => EXIT_FAILURE,
    }
}
