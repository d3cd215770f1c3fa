use std::time::Duration;

use async_trait::async_trait;
use tokio::process::Command;
use tracing::debug;

use crate::{
    error::ExecError,
    runner::{CommandOutput, CommandRunner, run_to_completion},
};

/// Runs command lines through the local shell (`sh -c` / `cmd /C`); the host is ignored.
pub struct LocalRunner {
    timeout: Duration,
}

impl LocalRunner {
    pub fn new(timeout: Duration) -> Self {
        Self { timeout }
    }
}

#[async_trait]
impl CommandRunner for LocalRunner {
    fn name(&self) -> &'static str {
        "local"
    }

    async fn execute(&self, host: &str, command: &str) -> Result<CommandOutput, ExecError> {
        cfg_if::cfg_if! {
            if #[cfg(target_family = "windows")] {
                let mut cmd = Command::new("cmd");
                cmd.arg("/C").arg(command);
            } else {
                let mut cmd = Command::new("sh");
                cmd.arg("-c").arg(command);
            }
        }

        debug!(target: "jobmon.exec.local", %host, %command, "run");
        run_to_completion(cmd, self.timeout).await
    }
}
