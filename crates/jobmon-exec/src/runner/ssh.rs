use std::time::Duration;

use async_trait::async_trait;
use tokio::process::Command;
use tracing::{debug, warn};

use crate::{
    error::ExecError,
    runner::{CommandOutput, CommandRunner, run_to_completion},
};

/// Exit status `ssh` uses for its own failures (connection, authentication).
const SSH_FAILURE: i32 = 255;

/// Runs command lines on a remote host through the `ssh` client.
pub struct SshRunner {
    program: String,
    options: Vec<String>,
    timeout: Duration,
}

impl SshRunner {
    pub fn new(timeout: Duration) -> Self {
        Self {
            program: "ssh".to_string(),
            options: Vec::new(),
            timeout,
        }
    }

    pub fn with_options(mut self, options: Vec<String>) -> Self {
        self.options = options;
        self
    }

    pub fn with_program(mut self, program: impl Into<String>) -> Self {
        self.program = program.into();
        self
    }

    fn command(&self, host: &str, command: &str) -> Command {
        let mut cmd = Command::new(&self.program);
        cmd.args(&self.options).arg(host).arg(command);
        cmd
    }
}

#[async_trait]
impl CommandRunner for SshRunner {
    fn name(&self) -> &'static str {
        "ssh"
    }

    async fn execute(&self, host: &str, command: &str) -> Result<CommandOutput, ExecError> {
        debug!(target: "jobmon.exec.ssh", %host, %command, "run");
        let out = run_to_completion(self.command(host, command), self.timeout).await?;

        if out.exit_code == SSH_FAILURE {
            warn!(target: "jobmon.exec.ssh", %host, output = %out.output.trim(), "ssh failed");
            return Err(ExecError::Unreachable(format!(
                "{host}: {}",
                out.output.trim()
            )));
        }
        Ok(out)
    }
}

#[cfg(all(test, unix))]
mod tests {
    use super::*;

    #[test]
    fn builds_ssh_command_line() {
        let runner = SshRunner::new(Duration::from_secs(1))
            .with_options(vec!["-o".into(), "BatchMode=yes".into()]);
        let cmd = runner.command("batch01", "zdaemon -C/x.conf status");
        let std = cmd.as_std();

        assert_eq!(std.get_program(), "ssh");
        let args: Vec<_> = std.get_args().collect();
        assert_eq!(args, ["-o", "BatchMode=yes", "batch01", "zdaemon -C/x.conf status"]);
    }

    // `sh -c 'exit 255' <host> <command>` mimics an ssh connection failure.
    #[tokio::test]
    async fn ssh_failure_is_unreachable() {
        let runner = SshRunner::new(Duration::from_secs(5))
            .with_program("sh")
            .with_options(vec!["-c".into(), "echo 'Connection refused' >&2; exit 255".into()]);

        let err = runner.execute("batch01", "true").await.unwrap_err();
        assert!(matches!(err, ExecError::Unreachable(msg) if msg.contains("Connection refused")));
    }

    #[tokio::test]
    async fn remote_exit_codes_pass_through() {
        let runner = SshRunner::new(Duration::from_secs(5))
            .with_program("sh")
            .with_options(vec!["-c".into(), "echo remote; exit 3".into()]);

        let out = runner.execute("batch01", "ignored").await.unwrap();
        assert_eq!(out.exit_code, 3);
        assert_eq!(out.output, "remote\n");
    }
}
