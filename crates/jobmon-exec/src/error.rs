use std::time::Duration;

use jobmon_core::ControlError;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum ExecError {
    #[error("spawn failed: {0}")]
    Spawn(String),
    #[error("host unreachable: {0}")]
    Unreachable(String),
    #[error("timed out after {0:?}")]
    Timeout(Duration),
    #[error("io error: {0}")]
    Io(String),
}

impl From<std::io::Error> for ExecError {
    fn from(e: std::io::Error) -> Self {
        ExecError::Io(e.to_string())
    }
}

impl From<ExecError> for ControlError {
    fn from(e: ExecError) -> Self {
        match e {
            ExecError::Timeout(after) => ControlError::Timeout(after),
            other => ControlError::Transport(other.to_string()),
        }
    }
}
