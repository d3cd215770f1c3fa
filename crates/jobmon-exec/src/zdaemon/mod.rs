use std::{path::Path, sync::Arc};

use async_trait::async_trait;
use jobmon_core::{ControlError, ProcessControl};
use jobmon_model::{ProcessProbe, StartOutcome, StopOutcome};
use tracing::{info, instrument, warn};

use crate::{
    config::ExecConfig,
    error::ExecError,
    runner::{CommandOutput, CommandRunner, runner_for},
};

pub mod parse;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Action {
    Status,
    Start,
    Stop,
}

impl Action {
    fn as_str(self) -> &'static str {
        match self {
            Action::Status => "status",
            Action::Start => "start",
            Action::Stop => "stop",
        }
    }
}

/// [`ProcessControl`] backed by a zdaemon-compatible supervisor CLI.
///
/// Runs `<program> -C<config> status|start|stop` on the configured host.
pub struct ZdaemonControl {
    runner: Arc<dyn CommandRunner>,
    host: String,
    program: String,
}

impl ZdaemonControl {
    pub fn new(cfg: &ExecConfig) -> Self {
        Self::with_runner(runner_for(cfg), &cfg.host, &cfg.program)
    }

    pub fn with_runner(
        runner: Arc<dyn CommandRunner>,
        host: impl Into<String>,
        program: impl Into<String>,
    ) -> Self {
        Self {
            runner,
            host: host.into(),
            program: program.into(),
        }
    }

    fn command_line(&self, config: &Path, action: Action) -> String {
        let conf = format!("-C{}", config.display());
        format!("{} {} {}", self.program, shell_quote(&conf), action.as_str())
    }

    async fn run(&self, config: &Path, action: Action) -> Result<CommandOutput, ExecError> {
        let command = self.command_line(config, action);
        let out = self.runner.execute(&self.host, &command).await?;
        info!(
            target: "jobmon.exec",
            host = %self.host,
            runner = self.runner.name(),
            action = action.as_str(),
            exit_code = out.exit_code,
            "supervisor command finished"
        );
        Ok(out)
    }
}

#[async_trait]
impl ProcessControl for ZdaemonControl {
    #[instrument(level = "debug", skip(self), fields(config = %config.display()))]
    async fn status(&self, config: &Path) -> Result<ProcessProbe, ControlError> {
        let out = self.run(config, Action::Status).await?;
        let probe = parse::probe(&out);
        if out.exit_code != 0 {
            warn!(
                target: "jobmon.exec",
                exit_code = out.exit_code,
                running_marker = out.output.contains(parse::RUNNING_MARKER),
                output = %out.output.trim(),
                "problem while checking job status"
            );
        }
        Ok(probe)
    }

    #[instrument(level = "debug", skip(self), fields(config = %config.display()))]
    async fn start(&self, config: &Path) -> StartOutcome {
        match self.run(config, Action::Start).await {
            Ok(out) => parse::start_outcome(&out),
            Err(e) => StartOutcome::Failed {
                message: e.to_string(),
                exit_code: None,
            },
        }
    }

    #[instrument(level = "debug", skip(self), fields(config = %config.display()))]
    async fn stop(&self, config: &Path) -> StopOutcome {
        match self.run(config, Action::Stop).await {
            Ok(out) => parse::stop_outcome(&out),
            Err(e) => StopOutcome::Failed {
                message: e.to_string(),
                exit_code: None,
            },
        }
    }
}

/// Quote `arg` for a POSIX shell unless it only holds safe characters.
fn shell_quote(arg: &str) -> String {
    let safe = |c: char| c.is_ascii_alphanumeric() || "-_./=:,+@%".contains(c);
    if !arg.is_empty() && arg.chars().all(safe) {
        arg.to_string()
    } else {
        format!("'{}'", arg.replace('\'', r"'\''"))
    }
}
