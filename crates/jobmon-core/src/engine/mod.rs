use std::sync::Arc;

use jobmon_model::{
    InstanceId, JobName, JobState, JobView, Params, ProcessProbe, StartOutcome, StopOutcome,
    display_pid,
};
use tracing::{info, instrument, warn};

use crate::{
    config::CoreConfig, control::ProcessControl, error::CoreError, instances::InstanceRegistry,
    tail::tail, templates::TemplateStore,
};

mod locks;
pub use locks::JobLocks;

/// Job lifecycle engine.
///
/// Derives job state from storage and the supervisor on every call; nothing is cached.
/// Start and stop hold a per-job lock across probe and action, so two requests for the
/// same job cannot both observe "not running" and launch twice.
pub struct JobEngine {
    templates: TemplateStore,
    instances: InstanceRegistry,
    control: Arc<dyn ProcessControl>,
    locks: JobLocks,
    tail_lines: usize,
}

impl JobEngine {
    pub fn new(cfg: &CoreConfig, control: Arc<dyn ProcessControl>) -> Self {
        Self {
            templates: TemplateStore::new(&cfg.templates_dir),
            instances: InstanceRegistry::new(&cfg.instances_dir, &cfg.transcripts_dir),
            control,
            locks: JobLocks::new(),
            tail_lines: cfg.log_tail_lines,
        }
    }

    pub fn templates(&self) -> &TemplateStore {
        &self.templates
    }

    pub fn instances(&self) -> &InstanceRegistry {
        &self.instances
    }

    pub async fn list_jobs(&self) -> Result<Vec<JobName>, CoreError> {
        self.templates.list().await
    }

    pub async fn register(&self, job: &JobName, content: &[u8]) -> Result<(), CoreError> {
        self.templates.register(job, content).await
    }

    pub async fn unregister(&self, job: &JobName) -> Result<(), CoreError> {
        self.templates.unregister(job).await
    }

    /// State of the latest instance of `job`.
    ///
    /// Instances stay queryable after their template was removed.
    #[instrument(level = "debug", skip(self), fields(job = %job))]
    pub async fn status(&self, job: &JobName) -> Result<JobView, CoreError> {
        match self.instances.latest_instance(job).await? {
            Some(latest) => {
                let probe = self.probe(job, &latest.id).await?;
                Ok(self.view(job, observed(latest.id, probe)).await)
            }
            None if self.templates.exists(job).await? => {
                Ok(JobView::new(job.clone(), JobState::NoInstance))
            }
            None => Ok(JobView::new(job.clone(), JobState::NoTemplate)),
        }
    }

    /// State of one specific instance.
    #[instrument(level = "debug", skip(self), fields(job = %job, id = %id))]
    pub async fn instance_status(
        &self,
        job: &JobName,
        id: &InstanceId,
    ) -> Result<JobView, CoreError> {
        self.ensure_instance(job, id).await?;
        let probe = self.probe(job, id).await?;
        Ok(self.view(job, observed(id.clone(), probe)).await)
    }

    /// Launch a new instance of `job` unless its latest instance is still running.
    ///
    /// Returns `Running` for the active instance, `Started` on success and `Error` when the
    /// supervisor refused; the failed instance stays on disk and reads as finished afterwards.
    #[instrument(level = "debug", skip(self, params), fields(job = %job))]
    pub async fn start(&self, job: &JobName, params: Params) -> Result<JobView, CoreError> {
        let _guard = self.locks.lock(job).await;

        if let Some(latest) = self.instances.latest_instance(job).await? {
            let probe = self.probe(job, &latest.id).await?;
            if probe.active {
                info!(target: "jobmon.core", %job, id = %latest.id, pid = display_pid(probe.pid), "job still running, not starting");
                let state = JobState::Running {
                    id: latest.id,
                    pid: probe.pid,
                };
                return Ok(self.view(job, state).await);
            }
        }

        info!(target: "jobmon.core", %job, ?params, "preparing job");
        let id = self
            .instances
            .render_and_create(&self.templates, job, &params)
            .await?;
        let config = self.instances.instance_path(job, &id);

        info!(target: "jobmon.core", %job, %id, "trying to start job");
        let state = match self.control.start(&config).await {
            StartOutcome::Started { pid } => {
                info!(target: "jobmon.core", %job, %id, pid = display_pid(pid), "job started");
                JobState::Started { id, pid }
            }
            StartOutcome::Failed { message, exit_code } => {
                warn!(target: "jobmon.core", %job, %id, ?exit_code, %message, "job failed to start");
                JobState::Error {
                    id,
                    message,
                    exit_code,
                }
            }
        };
        Ok(self.view(job, state).await)
    }

    /// Stop a running instance.
    ///
    /// An instance that is not running is rejected with [`CoreError::AlreadyFinished`]
    /// without contacting the supervisor's stop path.
    #[instrument(level = "debug", skip(self), fields(job = %job, id = %id))]
    pub async fn stop(&self, job: &JobName, id: &InstanceId) -> Result<JobView, CoreError> {
        let _guard = self.locks.lock(job).await;

        self.ensure_instance(job, id).await?;
        let probe = self.probe(job, id).await?;
        if !probe.active {
            return Err(CoreError::AlreadyFinished {
                job: job.clone(),
                id: id.clone(),
            });
        }

        let config = self.instances.instance_path(job, id);
        let state = match self.control.stop(&config).await {
            StopOutcome::Stopped { pid } => {
                let pid = pid.or(probe.pid);
                info!(target: "jobmon.core", %job, %id, pid = display_pid(pid), "job stopped");
                JobState::Finished {
                    id: id.clone(),
                    pid,
                }
            }
            StopOutcome::Failed { message, exit_code } => {
                warn!(target: "jobmon.core", %job, %id, ?exit_code, %message, "job failed to stop");
                JobState::Error {
                    id: id.clone(),
                    message,
                    exit_code,
                }
            }
        };
        Ok(self.view(job, state).await)
    }

    async fn ensure_instance(&self, job: &JobName, id: &InstanceId) -> Result<(), CoreError> {
        if self.instances.exists_instance(job, id).await? {
            Ok(())
        } else {
            Err(CoreError::InstanceNotFound {
                job: job.clone(),
                id: id.to_string(),
            })
        }
    }

    async fn probe(&self, job: &JobName, id: &InstanceId) -> Result<ProcessProbe, CoreError> {
        let config = self.instances.instance_path(job, id);
        let probe = self.control.status(&config).await.inspect_err(|e| {
            warn!(target: "jobmon.core", %job, %id, error = %e, "status probe failed");
        })?;
        info!(target: "jobmon.core", %job, %id, running = probe.active, pid = display_pid(probe.pid), "status probed");
        Ok(probe)
    }

    /// Attach the transcript tail of the referenced instance.
    ///
    /// An unreadable transcript is logged and reported as empty.
    async fn view(&self, job: &JobName, state: JobState) -> JobView {
        let lines = match state.instance_id() {
            Some(id) => {
                let path = self.instances.transcript_path(job, id);
                tail(&path, self.tail_lines).await.unwrap_or_else(|e| {
                    warn!(target: "jobmon.core", %job, %id, error = %e, "cannot read transcript");
                    Vec::new()
                })
            }
            None => Vec::new(),
        };
        JobView::new(job.clone(), state).with_log_lines(lines)
    }
}

fn observed(id: InstanceId, probe: ProcessProbe) -> JobState {
    if probe.active {
        JobState::Running { id, pid: probe.pid }
    } else {
        JobState::Finished { id, pid: None }
    }
}
