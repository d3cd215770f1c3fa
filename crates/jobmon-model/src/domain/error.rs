use thiserror::Error;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ModelError {
    #[error("invalid job name: {0:?}")]
    InvalidJobName(String),
    #[error("invalid instance id: {0:?}")]
    InvalidInstanceId(String),
}
