mod error;
pub use error::ExecError;

mod config;
pub use config::{DEFAULT_TIMEOUT, ExecConfig, Transport};

pub mod runner;
pub use runner::{CommandOutput, CommandRunner, LocalRunner, SshRunner, runner_for};

pub mod zdaemon;
pub use zdaemon::ZdaemonControl;

pub mod prelude {
    pub use crate::error::ExecError;
    pub use crate::runner::{CommandOutput, CommandRunner};
    pub use crate::zdaemon::ZdaemonControl;
}
