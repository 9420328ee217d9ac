//! End-to-end run: validate, provision, resolve, hand off to the accelerator.
//!
//! Stages run strictly in order and the first failure ends the run.

use std::path::PathBuf;

use crate::accelerator::{AcceleratorArgs, AcceleratorCommand, ProcessRunner};
use crate::config::CtdlConfig;
use crate::error::Result;
use crate::platform::PlatformKey;
use crate::provision::{ProvisionedBinary, Provisioner};
use crate::resolver::{local_filename, parse_link, LinkResolver, ResolvedLink};
use crate::transport::Transport;

/// Progress notifications, emitted after each stage completes.
#[derive(Debug)]
pub enum Stage<'a> {
    Provisioned(&'a ProvisionedBinary),
    Resolved(&'a ResolvedLink),
    Launching(&'a AcceleratorCommand),
}

/// What a successful run did.
#[derive(Debug, Clone)]
pub struct Outcome {
    pub binary: ProvisionedBinary,
    pub link: ResolvedLink,
    pub command: AcceleratorCommand,
}

pub struct Pipeline<'a, T: Transport + ?Sized, R: ProcessRunner + ?Sized> {
    config: &'a CtdlConfig,
    transport: &'a T,
    runner: &'a R,
    platform: PlatformKey,
    install_dir: PathBuf,
}

impl<'a, T: Transport + ?Sized, R: ProcessRunner + ?Sized> Pipeline<'a, T, R> {
    pub fn new(
        config: &'a CtdlConfig,
        transport: &'a T,
        runner: &'a R,
        platform: PlatformKey,
        install_dir: impl Into<PathBuf>,
    ) -> Self {
        Self {
            config,
            transport,
            runner,
            platform,
            install_dir: install_dir.into(),
        }
    }

    pub fn run(&self, link: &str) -> Result<Outcome> {
        self.run_with(link, |_| {})
    }

    /// Like [`Pipeline::run`], reporting each completed stage to `on_stage`.
    pub fn run_with<F>(&self, link: &str, mut on_stage: F) -> Result<Outcome>
    where
        F: FnMut(Stage<'_>),
    {
        let id = parse_link(link)?;

        let binary = Provisioner::from_config(self.transport, self.config)
            .ensure(&self.platform, &self.install_dir)?;
        on_stage(Stage::Provisioned(&binary));

        let resolved = LinkResolver::from_config(self.transport, self.config).resolve_id(id)?;
        on_stage(Stage::Resolved(&resolved));

        let command = self.command(&binary, &resolved);
        on_stage(Stage::Launching(&command));
        tracing::info!(
            program = %command.program.display(),
            args = ?command.args,
            "starting accelerator"
        );
        self.runner.run(&command)?;

        Ok(Outcome {
            binary,
            link: resolved,
            command,
        })
    }

    fn command(&self, binary: &ProvisionedBinary, link: &ResolvedLink) -> AcceleratorCommand {
        let accel = &self.config.accelerator;
        let output = local_filename(&link.filename);
        AcceleratorCommand::aria2(
            binary.path.clone(),
            &AcceleratorArgs {
                output: &output,
                url: &link.download_url,
                user_agent: &self.config.user_agent,
                connections: accel.connections,
                splits: accel.splits,
                extra_args: &accel.extra_args,
            },
        )
    }
}
