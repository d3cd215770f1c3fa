use async_trait::async_trait;
use jobmon_model::{InstanceId, JobName, JobView, Params};

use crate::error::ApiError;

/// Job control API handler.
///
/// Abstracts the backend behind the transport, allowing users to:
/// - Use the provided `EngineApiAdapter`
/// - Wrap it with additional logic (auth, auditing, etc.)
#[async_trait]
pub trait ApiHandler: Send + Sync + 'static {
    /// Names of all registered job templates.
    async fn list_jobs(&self) -> Result<Vec<JobName>, ApiError>;

    /// Register a new job template.
    async fn register_job(&self, job: &JobName, template: &[u8]) -> Result<(), ApiError>;

    /// Remove a job template.
    async fn unregister_job(&self, job: &JobName) -> Result<(), ApiError>;

    /// State of the latest instance of a job.
    async fn job_status(&self, job: &JobName) -> Result<JobView, ApiError>;

    /// State of a specific instance.
    async fn instance_status(&self, job: &JobName, id: &InstanceId) -> Result<JobView, ApiError>;

    /// Launch a new instance unless one is running.
    async fn start_job(&self, job: &JobName, params: Params) -> Result<JobView, ApiError>;

    /// Stop a running instance.
    async fn stop_instance(&self, job: &JobName, id: &InstanceId) -> Result<JobView, ApiError>;
}
