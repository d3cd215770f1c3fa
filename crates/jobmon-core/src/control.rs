use std::{path::Path, time::Duration};

use async_trait::async_trait;
use jobmon_model::{ProcessProbe, StartOutcome, StopOutcome};
use thiserror::Error;

/// The supervisor could not be asked at all.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ControlError {
    #[error("remote command failed: {0}")]
    Transport(String),

    #[error("remote command timed out after {0:?}")]
    Timeout(Duration),
}

/// Typed access to the external process supervisor.
///
/// Every call addresses one rendered instance configuration.
/// Implementations block on a remote command and never retry.
#[async_trait]
pub trait ProcessControl: Send + Sync + 'static {
    /// Ask whether the program behind `config` is running.
    async fn status(&self, config: &Path) -> Result<ProcessProbe, ControlError>;

    /// Launch the program behind `config`.
    async fn start(&self, config: &Path) -> StartOutcome;

    /// Stop the program behind `config`.
    async fn stop(&self, config: &Path) -> StopOutcome;
}
