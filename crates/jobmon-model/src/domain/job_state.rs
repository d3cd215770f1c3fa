use crate::{InstanceId, JobName};

/// Derived state of a job, recomputed on every query.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum JobState {
    /// Neither a template nor any instance exists.
    NoTemplate,
    /// A template exists but was never launched.
    NoInstance,
    /// The instance is alive according to the supervisor.
    Running { id: InstanceId, pid: Option<u32> },
    /// The instance was launched by this request.
    Started { id: InstanceId, pid: Option<u32> },
    /// The instance is not running (anymore). `pid` is set when this request stopped it.
    Finished { id: InstanceId, pid: Option<u32> },
    /// The supervisor refused or could not be reached.
    Error {
        id: InstanceId,
        message: String,
        exit_code: Option<i32>,
    },
}

impl JobState {
    /// Wire label of the state.
    ///
    /// `NoTemplate` and `NoInstance` have no status label and return `None`.
    pub fn label(&self) -> Option<&'static str> {
        match self {
            JobState::NoTemplate | JobState::NoInstance => None,
            JobState::Running { .. } => Some("RUNNING"),
            JobState::Started { .. } => Some("STARTED"),
            JobState::Finished { .. } => Some("FINISHED"),
            JobState::Error { .. } => Some("ERROR"),
        }
    }

    /// Instance the state refers to, if any.
    pub fn instance_id(&self) -> Option<&InstanceId> {
        match self {
            JobState::NoTemplate | JobState::NoInstance => None,
            JobState::Running { id, .. }
            | JobState::Started { id, .. }
            | JobState::Finished { id, .. }
            | JobState::Error { id, .. } => Some(id),
        }
    }

    /// Returns `true` when a process is (believed to be) alive.
    pub fn is_active(&self) -> bool {
        matches!(self, JobState::Running { .. } | JobState::Started { .. })
    }
}

/// State of a job together with the tail of its transcript.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct JobView {
    pub job: JobName,
    pub state: JobState,
    /// Last transcript lines of the referenced instance; empty when no instance is known.
    pub log_lines: Vec<String>,
}

impl JobView {
    pub fn new(job: JobName, state: JobState) -> Self {
        Self {
            job,
            state,
            log_lines: Vec::new(),
        }
    }

    pub fn with_log_lines(mut self, lines: Vec<String>) -> Self {
        self.log_lines = lines;
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn id() -> InstanceId {
        InstanceId::parse("00aa11bb22cc").unwrap()
    }

    #[test]
    fn labels() {
        assert_eq!(JobState::NoTemplate.label(), None);
        assert_eq!(JobState::NoInstance.label(), None);
        assert_eq!(
            JobState::Running { id: id(), pid: Some(1) }.label(),
            Some("RUNNING")
        );
        assert_eq!(
            JobState::Started { id: id(), pid: Some(1) }.label(),
            Some("STARTED")
        );
        assert_eq!(
            JobState::Finished { id: id(), pid: None }.label(),
            Some("FINISHED")
        );
        let err = JobState::Error {
            id: id(),
            message: "boom".into(),
            exit_code: Some(1),
        };
        assert_eq!(err.label(), Some("ERROR"));
    }

    #[test]
    fn active_states() {
        assert!(JobState::Running { id: id(), pid: None }.is_active());
        assert!(JobState::Started { id: id(), pid: None }.is_active());
        assert!(!JobState::Finished { id: id(), pid: None }.is_active());
        assert!(!JobState::NoInstance.is_active());
    }

    #[test]
    fn instance_id_only_for_instance_states() {
        assert!(JobState::NoTemplate.instance_id().is_none());
        assert_eq!(
            JobState::Finished { id: id(), pid: None }.instance_id(),
            Some(&id())
        );
    }
}
