//! Invocation of the external download accelerator.

use std::path::PathBuf;
use std::process::{Command, Stdio};

use crate::error::{Error, Result};

/// Program and argument list for one accelerator run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AcceleratorCommand {
    pub program: PathBuf,
    pub args: Vec<String>,
}

/// Options that shape an aria2c invocation.
#[derive(Debug, Clone)]
pub struct AcceleratorArgs<'a> {
    pub output: &'a str,
    pub url: &'a str,
    pub user_agent: &'a str,
    pub connections: u32,
    pub splits: u32,
    pub extra_args: &'a [String],
}

impl AcceleratorCommand {
    /// `-o <output> -V -x<n> -s<n> --header=User-Agent: <ua> [extra...] <url>`
    pub fn aria2(program: impl Into<PathBuf>, opts: &AcceleratorArgs<'_>) -> Self {
        let mut args = vec![
            "-o".to_string(),
            opts.output.to_string(),
            "-V".to_string(),
            format!("-x{}", opts.connections),
            format!("-s{}", opts.splits),
            format!("--header=User-Agent: {}", opts.user_agent),
        ];
        args.extend(opts.extra_args.iter().cloned());
        args.push(opts.url.to_string());
        Self {
            program: program.into(),
            args,
        }
    }

    /// Value passed with `-o`.
    pub fn output(&self) -> Option<&str> {
        self.args
            .iter()
            .position(|a| a == "-o")
            .and_then(|i| self.args.get(i + 1))
            .map(String::as_str)
    }

    pub fn url(&self) -> Option<&str> {
        self.args.last().map(String::as_str)
    }
}

/// Runs an accelerator command to completion.
pub trait ProcessRunner {
    fn run(&self, cmd: &AcceleratorCommand) -> Result<()>;
}

/// Spawns the real process with the terminal's stdio and waits for it.
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemRunner;

impl ProcessRunner for SystemRunner {
    fn run(&self, cmd: &AcceleratorCommand) -> Result<()> {
        let program = cmd.program.display().to_string();
        let status = Command::new(&cmd.program)
            .args(&cmd.args)
            .stdin(Stdio::inherit())
            .stdout(Stdio::inherit())
            .stderr(Stdio::inherit())
            .status()
            .map_err(|e| Error::SubprocessFailed {
                program: program.clone(),
                reason: format!("could not start: {}", e),
            })?;

        tracing::debug!(%program, %status, "accelerator exited");
        if status.success() {
            Ok(())
        } else {
            Err(Error::SubprocessFailed {
                program,
                reason: format!("exited with {}", status),
            })
        }
    }
}
