use std::path::Path;

use jobmon_model::{InstanceId, JobName};
use serde::{Deserialize, Serialize};
use tracing::debug;

/// Sidecar written next to every rendered instance.
///
/// `created_at_ns` orders instances of a job; it is strictly increasing within one process.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct InstanceMeta {
    pub job: JobName,
    pub id: InstanceId,
    pub created_at_ns: u64,
}

impl InstanceMeta {
    /// Read a sidecar; absent or unreadable sidecars yield `None`.
    pub async fn load(path: &Path) -> Option<Self> {
        let bytes = tokio::fs::read(path).await.ok()?;
        match serde_json::from_slice(&bytes) {
            Ok(meta) => Some(meta),
            Err(e) => {
                debug!(target: "jobmon.core", path = %path.display(), error = %e, "ignoring corrupt instance metadata");
                None
            }
        }
    }
}
