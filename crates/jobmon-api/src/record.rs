use jobmon_model::{JobState, JobView, display_pid};
use serde::{Deserialize, Serialize};

/// Which operation produced a view; wording and labels differ per operation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Phase {
    Query,
    Start,
    Stop,
}

/// Outcome of a finished or failed operation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResultRecord {
    pub ok: bool,
    pub message: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub exit_code: Option<i32>,
}

/// Wire shape of a job status.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StatusRecord {
    pub status: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub job_id: Option<String>,
    #[serde(default)]
    pub log_lines: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub result: Option<ResultRecord>,
}

impl StatusRecord {
    /// Build the record for `view`.
    ///
    /// Returns `None` for views that name no instance (`NoTemplate`, `NoInstance`).
    /// A failed start reads `FINISHED`, since no process is left behind; a failed stop reads `ERROR`.
    pub fn new(view: &JobView, phase: Phase) -> Option<Self> {
        let job = &view.job;
        let record = |status: &str, message: Option<String>, result: Option<ResultRecord>| {
            Some(Self {
                status: status.to_string(),
                job_id: view.state.instance_id().map(|id| id.to_string()),
                log_lines: view.log_lines.clone(),
                message,
                result,
            })
        };

        match &view.state {
            JobState::NoTemplate | JobState::NoInstance => None,
            JobState::Running { pid, .. } => {
                let verb = match phase {
                    Phase::Start => "is still running",
                    _ => "is running",
                };
                let message = format!("job '{job}' {verb} with process id {}", display_pid(*pid));
                record("RUNNING", Some(message), None)
            }
            JobState::Started { pid, .. } => {
                let message = format!("job '{job}' started with process id={}", display_pid(*pid));
                record("STARTED", Some(message), None)
            }
            JobState::Finished { pid, .. } => {
                let message = match phase {
                    Phase::Stop => {
                        format!("job '{job}' stopped with process id={}", display_pid(*pid))
                    }
                    _ => format!("job '{job}' is not running any more"),
                };
                let result = ResultRecord {
                    ok: true,
                    message,
                    exit_code: None,
                };
                record("FINISHED", None, Some(result))
            }
            JobState::Error {
                message, exit_code, ..
            } => {
                let status = match phase {
                    Phase::Start => "FINISHED",
                    _ => "ERROR",
                };
                let result = ResultRecord {
                    ok: false,
                    message: message.clone(),
                    exit_code: *exit_code,
                };
                record(status, None, Some(result))
            }
        }
    }
}
