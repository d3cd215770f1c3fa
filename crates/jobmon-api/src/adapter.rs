use std::sync::Arc;

use async_trait::async_trait;
use jobmon_core::JobEngine;
use jobmon_model::{InstanceId, JobName, JobView, Params};

use crate::error::ApiError;
use crate::handler::ApiHandler;

/// Adapter that bridges `JobEngine` to `ApiHandler`.
///
/// This is a ready-to-use implementation that directly delegates to the engine.
pub struct EngineApiAdapter {
    engine: Arc<JobEngine>,
}

impl EngineApiAdapter {
    /// Create a new adapter wrapping the given engine.
    pub fn new(engine: Arc<JobEngine>) -> Self {
        Self { engine }
    }
}

#[async_trait]
impl ApiHandler for EngineApiAdapter {
    async fn list_jobs(&self) -> Result<Vec<JobName>, ApiError> {
        self.engine.list_jobs().await.map_err(ApiError::from)
    }

    async fn register_job(&self, job: &JobName, template: &[u8]) -> Result<(), ApiError> {
        self.engine
            .register(job, template)
            .await
            .map_err(ApiError::from)
    }

    async fn unregister_job(&self, job: &JobName) -> Result<(), ApiError> {
        self.engine.unregister(job).await.map_err(ApiError::from)
    }

    async fn job_status(&self, job: &JobName) -> Result<JobView, ApiError> {
        self.engine.status(job).await.map_err(ApiError::from)
    }

    async fn instance_status(&self, job: &JobName, id: &InstanceId) -> Result<JobView, ApiError> {
        self.engine
            .instance_status(job, id)
            .await
            .map_err(ApiError::from)
    }

    async fn start_job(&self, job: &JobName, params: Params) -> Result<JobView, ApiError> {
        self.engine.start(job, params).await.map_err(ApiError::from)
    }

    async fn stop_instance(&self, job: &JobName, id: &InstanceId) -> Result<JobView, ApiError> {
        self.engine.stop(job, id).await.map_err(ApiError::from)
    }
}
