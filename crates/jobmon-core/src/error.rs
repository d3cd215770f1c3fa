use std::path::{Path, PathBuf};

use jobmon_model::{InstanceId, JobName, ModelError};
use thiserror::Error;

use crate::control::ControlError;

#[derive(Debug, Error)]
pub enum CoreError {
    #[error("no job template exists for '{0}'")]
    TemplateNotFound(JobName),

    #[error("job '{0}' does already exist")]
    TemplateExists(JobName),

    #[error("no job instance '{id}' found for '{job}'")]
    InstanceNotFound { job: JobName, id: String },

    #[error("job instance '{id}' of '{job}' has already finished")]
    AlreadyFinished { job: JobName, id: InstanceId },

    #[error("{path} is not an instance of '{job}'")]
    UnrecognizedInstance { job: JobName, path: PathBuf },

    #[error(transparent)]
    Model(#[from] ModelError),

    #[error("supervisor error: {0}")]
    Control(#[from] ControlError),

    #[error("io error at {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

impl CoreError {
    /// Map an [`std::io::Error`] into [`CoreError::Io`] tagged with `path`.
    pub(crate) fn io(path: &Path) -> impl FnOnce(std::io::Error) -> CoreError + '_ {
        move |source| CoreError::Io {
            path: path.to_path_buf(),
            source,
        }
    }
}
