use std::{str::FromStr, time::Duration};

use serde::Deserialize;

/// Default limit for one supervisor command.
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(30);

/// How supervisor commands reach the target host.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Transport {
    /// `local` for loopback hosts, `ssh` otherwise.
    #[default]
    Auto,
    Ssh,
    Local,
}

impl Transport {
    /// Concrete transport for `host`; never returns [`Transport::Auto`].
    pub fn resolve(self, host: &str) -> Transport {
        match self {
            Transport::Auto if is_loopback(host) => Transport::Local,
            Transport::Auto => Transport::Ssh,
            other => other,
        }
    }
}

impl FromStr for Transport {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "auto" => Ok(Transport::Auto),
            "ssh" => Ok(Transport::Ssh),
            "local" => Ok(Transport::Local),
            other => Err(format!("unknown transport: {other} (expected: auto|ssh|local)")),
        }
    }
}

fn is_loopback(host: &str) -> bool {
    matches!(host, "localhost" | "127.0.0.1" | "::1")
}

/// Where and how the supervisor is invoked.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExecConfig {
    /// Host running the supervisor and the jobs.
    pub host: String,
    /// Supervisor executable, e.g. `zdaemon`.
    pub program: String,
    pub transport: Transport,
    /// Extra arguments passed to `ssh` before the host.
    pub ssh_options: Vec<String>,
    /// Limit for a single command; the child is killed on expiry.
    pub timeout: Duration,
}

impl Default for ExecConfig {
    fn default() -> Self {
        Self {
            host: "localhost".to_string(),
            program: "zdaemon".to_string(),
            transport: Transport::Auto,
            ssh_options: vec!["-o".to_string(), "BatchMode=yes".to_string()],
            timeout: DEFAULT_TIMEOUT,
        }
    }
}
