//! Command execution on the supervisor host.
//!
//! [`CommandRunner`] is the only way the crate reaches a host; the supervisor adapter
//! builds command lines and hands them to a runner. Tests swap in a recording runner.

use std::{process::Stdio, sync::Arc, time::Duration};

use async_trait::async_trait;
use tokio::process::Command;
use tracing::trace;

use crate::{
    config::{ExecConfig, Transport},
    error::ExecError,
};

mod local;
pub use local::LocalRunner;

mod ssh;
pub use ssh::SshRunner;

/// Outcome of a command that ran to completion.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommandOutput {
    /// The command exited with status zero.
    pub succeeded: bool,
    /// Exit code, `-1` when terminated by a signal.
    pub exit_code: i32,
    /// Standard output followed by standard error.
    pub output: String,
}

impl CommandOutput {
    pub fn success(output: impl Into<String>) -> Self {
        Self {
            succeeded: true,
            exit_code: 0,
            output: output.into(),
        }
    }

    pub fn failure(exit_code: i32, output: impl Into<String>) -> Self {
        Self {
            succeeded: false,
            exit_code,
            output: output.into(),
        }
    }
}

/// Runs a shell command line on a host and waits for it.
#[async_trait]
pub trait CommandRunner: Send + Sync + 'static {
    fn name(&self) -> &'static str;

    async fn execute(&self, host: &str, command: &str) -> Result<CommandOutput, ExecError>;
}

/// Runner matching the configured transport.
pub fn runner_for(cfg: &ExecConfig) -> Arc<dyn CommandRunner> {
    match cfg.transport.resolve(&cfg.host) {
        Transport::Local => Arc::new(LocalRunner::new(cfg.timeout)),
        _ => Arc::new(SshRunner::new(cfg.timeout).with_options(cfg.ssh_options.clone())),
    }
}

/// Spawn `cmd`, collect its output and enforce `timeout`.
///
/// The child is killed if the deadline passes.
pub(crate) async fn run_to_completion(
    mut cmd: Command,
    timeout: Duration,
) -> Result<CommandOutput, ExecError> {
    cmd.stdin(Stdio::null())
        .stdout(Stdio::piped())
        .stderr(Stdio::piped())
        .kill_on_drop(true);

    let child = cmd.spawn().map_err(|e| ExecError::Spawn(e.to_string()))?;

    let out = match tokio::time::timeout(timeout, child.wait_with_output()).await {
        Ok(out) => out?,
        Err(_) => return Err(ExecError::Timeout(timeout)),
    };

    let mut output = String::from_utf8_lossy(&out.stdout).into_owned();
    if !out.stderr.is_empty() {
        if !output.is_empty() && !output.ends_with('\n') {
            output.push('\n');
        }
        output.push_str(&String::from_utf8_lossy(&out.stderr));
    }

    let exit_code = out.status.code().unwrap_or(-1);
    trace!(target: "jobmon.exec", exit_code, bytes = output.len(), "command finished");

    Ok(CommandOutput {
        succeeded: out.status.success(),
        exit_code,
        output,
    })
}
