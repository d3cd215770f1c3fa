use std::{net::SocketAddr, path::PathBuf};

use clap::Parser;
use jobmon_exec::Transport;
use jobmon_observe::LoggerFormat;

/// HTTP control service for jobs run under an external process supervisor.
#[derive(Debug, Parser)]
#[command(name = "jobmon-agentd", version)]
pub struct Cli {
    /// TOML settings file
    #[arg(short = 'c', long, env = "JOBMON_SETTINGS", value_name = "FILE")]
    pub config: Option<PathBuf>,

    /// Address to serve the HTTP API on
    #[arg(long, env = "JOBMON_LISTEN", value_name = "ADDR")]
    pub listen: Option<SocketAddr>,

    /// Host running the supervisor
    #[arg(long, env = "JOBMON_HOST")]
    pub host: Option<String>,

    /// How supervisor commands reach the host (auto|ssh|local)
    #[arg(long, env = "JOBMON_TRANSPORT")]
    pub transport: Option<Transport>,

    /// Log verbosely to the terminal instead of the log file
    #[arg(long, env = "JOBMON_DEBUG", value_name = "BOOL")]
    pub debug: Option<bool>,

    /// Log output format (text|json|journald)
    #[arg(long, env = "JOBMON_LOG_FORMAT")]
    pub log_format: Option<LoggerFormat>,

    /// Log filter used when not in debug mode
    #[arg(long, env = "JOBMON_LOG_LEVEL")]
    pub log_level: Option<String>,
}
