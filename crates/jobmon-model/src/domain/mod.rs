mod job_name;
pub use job_name::JobName;

mod instance_id;
pub use instance_id::InstanceId;

mod job_state;
pub use job_state::{JobState, JobView};

mod process;
pub use process::{ProcessProbe, StartOutcome, StopOutcome, display_pid};

mod error;
pub use error::ModelError;

/// Template parameters supplied by a caller when starting a job.
///
/// Keys are placeholder names without the leading `$`.
pub type Params = std::collections::BTreeMap<String, String>;

/// Parameter injected into every rendered instance; holds the transcript file path.
pub const TRANSCRIPT_PARAM: &str = "transcript_file";
