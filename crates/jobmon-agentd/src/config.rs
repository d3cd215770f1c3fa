use std::{
    net::SocketAddr,
    path::{Path, PathBuf},
    time::Duration,
};

use jobmon_core::CoreConfig;
use jobmon_exec::{ExecConfig, Transport};
use jobmon_observe::{LoggerConfig, LoggerFormat};
use serde::Deserialize;
use thiserror::Error;

use crate::cli::Cli;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("cannot read config file {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("cannot parse config file {path}: {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: toml::de::Error,
    },
    #[error("cannot resolve path {path}: {source}")]
    Path {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("invalid configuration: {0}")]
    Invalid(String),
}

/// Agent configuration: defaults, then an optional TOML file, then CLI overrides.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct AppConfig {
    pub listen: SocketAddr,
    /// Verbose logging to the terminal instead of the log file.
    pub debug: bool,
    pub log_file: Option<PathBuf>,
    pub log_format: LoggerFormat,
    pub log_level: String,
    pub paths: PathsSection,
    pub supervisor: SupervisorSection,
    pub engine: EngineSection,
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct PathsSection {
    pub templates_dir: PathBuf,
    pub instances_dir: PathBuf,
    pub transcripts_dir: PathBuf,
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct SupervisorSection {
    pub host: String,
    pub program: String,
    pub transport: Transport,
    pub timeout_ms: u64,
    pub ssh_options: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct EngineSection {
    pub log_tail_lines: usize,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            listen: SocketAddr::from(([127, 0, 0, 1], 5000)),
            debug: true,
            log_file: Some(PathBuf::from("jobmon.log")),
            log_format: LoggerFormat::Text,
            log_level: "info".to_string(),
            paths: PathsSection::default(),
            supervisor: SupervisorSection::default(),
            engine: EngineSection::default(),
        }
    }
}

impl Default for PathsSection {
    fn default() -> Self {
        let core = CoreConfig::default();
        Self {
            templates_dir: core.templates_dir,
            instances_dir: core.instances_dir,
            transcripts_dir: core.transcripts_dir,
        }
    }
}

impl Default for SupervisorSection {
    fn default() -> Self {
        let exec = ExecConfig::default();
        Self {
            host: exec.host,
            program: exec.program,
            transport: exec.transport,
            timeout_ms: exec.timeout.as_millis() as u64,
            ssh_options: exec.ssh_options,
        }
    }
}

impl Default for EngineSection {
    fn default() -> Self {
        Self {
            log_tail_lines: CoreConfig::default().log_tail_lines,
        }
    }
}

impl AppConfig {
    /// Parse a TOML document; missing keys keep their defaults.
    pub fn from_toml(source: &str, origin: &Path) -> Result<Self, ConfigError> {
        toml::from_str(source).map_err(|source| ConfigError::Parse {
            path: origin.to_path_buf(),
            source,
        })
    }

    /// Read the TOML file at `path`, or fall back to defaults when no file is given.
    pub fn load(path: Option<&Path>) -> Result<Self, ConfigError> {
        let Some(path) = path else {
            return Ok(Self::default());
        };
        let contents = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_toml(&contents, path)
    }

    /// Load the file named on the command line and apply the flag overrides.
    pub fn resolve(cli: &Cli) -> Result<Self, ConfigError> {
        let mut cfg = Self::load(cli.config.as_deref())?;
        cfg.apply_cli(cli);
        cfg.validate()?;
        Ok(cfg)
    }

    pub fn apply_cli(&mut self, cli: &Cli) {
        if let Some(listen) = cli.listen {
            self.listen = listen;
        }
        if let Some(host) = &cli.host {
            self.supervisor.host = host.clone();
        }
        if let Some(transport) = cli.transport {
            self.supervisor.transport = transport;
        }
        if let Some(debug) = cli.debug {
            self.debug = debug;
        }
        if let Some(format) = cli.log_format {
            self.log_format = format;
        }
        if let Some(level) = &cli.log_level {
            self.log_level = level.clone();
        }
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.supervisor.host.trim().is_empty() {
            return Err(ConfigError::Invalid("supervisor.host must not be empty".into()));
        }
        if self.supervisor.program.trim().is_empty() {
            return Err(ConfigError::Invalid(
                "supervisor.program must not be empty".into(),
            ));
        }
        if self.supervisor.timeout_ms == 0 {
            return Err(ConfigError::Invalid(
                "supervisor.timeout_ms must be positive".into(),
            ));
        }
        Ok(())
    }

    /// Storage settings with directories made absolute, since rendered paths leave the process.
    pub fn core_config(&self) -> Result<CoreConfig, ConfigError> {
        Ok(CoreConfig {
            templates_dir: absolute(&self.paths.templates_dir)?,
            instances_dir: absolute(&self.paths.instances_dir)?,
            transcripts_dir: absolute(&self.paths.transcripts_dir)?,
            log_tail_lines: self.engine.log_tail_lines,
        })
    }

    pub fn exec_config(&self) -> ExecConfig {
        ExecConfig {
            host: self.supervisor.host.clone(),
            program: self.supervisor.program.clone(),
            transport: self.supervisor.transport,
            ssh_options: self.supervisor.ssh_options.clone(),
            timeout: Duration::from_millis(self.supervisor.timeout_ms),
        }
    }

    /// Debug logs to the terminal at `debug`; otherwise the configured level goes to `log_file`.
    pub fn logger_config(&self) -> LoggerConfig {
        let base = LoggerConfig {
            format: self.log_format,
            ..LoggerConfig::default()
        };
        if self.debug {
            return LoggerConfig {
                level: "debug".to_string(),
                ..base
            };
        }
        let base = LoggerConfig {
            level: self.log_level.clone(),
            ..base
        };
        match &self.log_file {
            Some(path) => base.with_file(path),
            None => base,
        }
    }
}

fn absolute(path: &Path) -> Result<PathBuf, ConfigError> {
    std::path::absolute(path).map_err(|source| ConfigError::Path {
        path: path.to_path_buf(),
        source,
    })
}

#[cfg(test)]
mod tests {
    use clap::Parser;

    use super::*;

    #[test]
    fn defaults() {
        let cfg = AppConfig::default();
        assert_eq!(cfg.listen.port(), 5000);
        assert!(cfg.debug);
        assert_eq!(cfg.paths.templates_dir, PathBuf::from("templates"));
        assert_eq!(cfg.paths.transcripts_dir, PathBuf::from("/tmp"));
        assert_eq!(cfg.supervisor.host, "localhost");
        assert_eq!(cfg.supervisor.timeout_ms, 30_000);
        assert_eq!(cfg.engine.log_tail_lines, 100);
        assert!(cfg.validate().is_ok());
    }

    #[test]
    fn partial_toml_keeps_defaults() {
        let cfg = AppConfig::from_toml(
            r#"
            debug = false
            log_format = "json"

            [paths]
            templates_dir = "/srv/jobmon/templates"

            [supervisor]
            host = "batch01"
            transport = "ssh"
            timeout_ms = 5000
            "#,
            Path::new("jobmon.toml"),
        )
        .unwrap();

        assert!(!cfg.debug);
        assert_eq!(cfg.log_format, LoggerFormat::Json);
        assert_eq!(cfg.paths.templates_dir, PathBuf::from("/srv/jobmon/templates"));
        assert_eq!(cfg.paths.instances_dir, PathBuf::from("instances"));
        assert_eq!(cfg.supervisor.host, "batch01");
        assert_eq!(cfg.supervisor.transport, Transport::Ssh);
        assert_eq!(cfg.supervisor.program, "zdaemon");
        assert_eq!(cfg.exec_config().timeout, Duration::from_secs(5));
    }

    #[test]
    fn unknown_keys_are_rejected() {
        let err = AppConfig::from_toml("[paths]\ntemplate_dir = \"x\"", Path::new("bad.toml"))
            .unwrap_err();
        assert!(matches!(err, ConfigError::Parse { .. }));
    }

    #[test]
    fn missing_file_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        let err = AppConfig::load(Some(&dir.path().join("nope.toml"))).unwrap_err();
        assert!(matches!(err, ConfigError::Read { .. }));
    }

    #[test]
    fn file_then_cli_overrides() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("jobmon.toml");
        std::fs::write(&path, "listen = \"0.0.0.0:7000\"\n[supervisor]\nhost = \"batch01\"\n")
            .unwrap();

        let cli = Cli::parse_from([
            "jobmon-agentd",
            "--config",
            path.to_str().unwrap(),
            "--host",
            "batch02",
            "--debug",
            "false",
            "--log-level",
            "warn",
        ]);
        let cfg = AppConfig::resolve(&cli).unwrap();

        assert_eq!(cfg.listen.port(), 7000);
        assert_eq!(cfg.supervisor.host, "batch02");
        assert!(!cfg.debug);
        assert_eq!(cfg.log_level, "warn");
    }

    #[test]
    fn zero_timeout_is_invalid() {
        let mut cfg = AppConfig::default();
        cfg.supervisor.timeout_ms = 0;
        assert!(matches!(cfg.validate(), Err(ConfigError::Invalid(_))));
    }

    #[test]
    fn core_paths_are_absolute() {
        let core = AppConfig::default().core_config().unwrap();
        assert!(core.templates_dir.is_absolute());
        assert!(core.instances_dir.is_absolute());
        assert_eq!(core.transcripts_dir, PathBuf::from("/tmp"));
    }

    #[test]
    fn logger_follows_debug_flag() {
        let mut cfg = AppConfig::default();
        let log = cfg.logger_config();
        assert_eq!(log.level, "debug");
        assert!(log.file.is_none());

        cfg.debug = false;
        cfg.log_level = "warn".into();
        let log = cfg.logger_config();
        assert_eq!(log.level, "warn");
        assert_eq!(log.file, Some(PathBuf::from("jobmon.log")));
    }
}
