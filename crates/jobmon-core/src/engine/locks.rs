use std::{
    collections::HashMap,
    sync::{Arc, Mutex, PoisonError},
};

use jobmon_model::JobName;
use tokio::sync::{Mutex as AsyncMutex, OwnedMutexGuard};

/// Per-job-name mutual exclusion for check-then-act sequences.
///
/// Different job names never contend. Idle entries are pruned on the next acquisition.
#[derive(Debug, Default)]
pub struct JobLocks {
    inner: Mutex<HashMap<JobName, Arc<AsyncMutex<()>>>>,
}

impl JobLocks {
    pub fn new() -> Self {
        Self::default()
    }

    /// Wait for exclusive access to `job`; held until the guard is dropped.
    pub async fn lock(&self, job: &JobName) -> OwnedMutexGuard<()> {
        let slot = {
            let mut map = self.inner.lock().unwrap_or_else(PoisonError::into_inner);
            map.retain(|_, m| Arc::strong_count(m) > 1);
            Arc::clone(map.entry(job.clone()).or_default())
        };
        slot.lock_owned().await
    }

    #[cfg(test)]
    fn tracked(&self) -> usize {
        self.inner
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .len()
    }
}
