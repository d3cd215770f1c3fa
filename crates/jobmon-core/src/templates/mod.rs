use std::{
    io::ErrorKind,
    path::{Path, PathBuf},
};

use jobmon_model::JobName;
use tokio::io::AsyncWriteExt;
use tracing::{debug, info};

use crate::{error::CoreError, fs};

/// File extension of template entries.
pub const TEMPLATE_EXT: &str = "conf";

/// Durable store of named job templates.
///
/// Templates are immutable: registering an existing name fails, to change one it has to be removed first.
#[derive(Debug, Clone)]
pub struct TemplateStore {
    dir: PathBuf,
}

impl TemplateStore {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Storage location of the template for `name`.
    pub fn path(&self, name: &JobName) -> PathBuf {
        self.dir.join(format!("{name}.{TEMPLATE_EXT}"))
    }

    /// Persist `content` verbatim under `name`.
    ///
    /// Creation is exclusive, concurrent registrations of one name cannot both succeed.
    pub async fn register(&self, name: &JobName, content: &[u8]) -> Result<(), CoreError> {
        fs::ensure_dir(&self.dir).await?;
        let path = self.path(name);

        let mut file = match tokio::fs::OpenOptions::new()
            .write(true)
            .create_new(true)
            .open(&path)
            .await
        {
            Ok(file) => file,
            Err(e) if e.kind() == ErrorKind::AlreadyExists => {
                return Err(CoreError::TemplateExists(name.clone()));
            }
            Err(e) => return Err(CoreError::io(&path)(e)),
        };

        let written = async {
            file.write_all(content).await?;
            file.sync_all().await
        }
        .await;
        if let Err(e) = written {
            drop(file);
            let _ = tokio::fs::remove_file(&path).await;
            return Err(CoreError::io(&path)(e));
        }

        info!(target: "jobmon.core", job = %name, bytes = content.len(), "template registered");
        Ok(())
    }

    pub async fn unregister(&self, name: &JobName) -> Result<(), CoreError> {
        let path = self.path(name);
        match tokio::fs::remove_file(&path).await {
            Ok(()) => {
                info!(target: "jobmon.core", job = %name, "template removed");
                Ok(())
            }
            Err(e) if e.kind() == ErrorKind::NotFound => {
                Err(CoreError::TemplateNotFound(name.clone()))
            }
            Err(e) => Err(CoreError::io(&path)(e)),
        }
    }

    pub async fn exists(&self, name: &JobName) -> Result<bool, CoreError> {
        fs::is_file(&self.path(name)).await
    }

    /// Names of all registered templates, sorted.
    pub async fn list(&self) -> Result<Vec<JobName>, CoreError> {
        let mut names = Vec::new();
        for path in fs::list_dir(&self.dir).await? {
            if path.extension().and_then(|e| e.to_str()) != Some(TEMPLATE_EXT) {
                continue;
            }
            let Some(name) = path
                .file_stem()
                .and_then(|s| s.to_str())
                .and_then(|s| JobName::new(s).ok())
            else {
                debug!(target: "jobmon.core", path = %path.display(), "skipping foreign template entry");
                continue;
            };
            if fs::is_file(&path).await? {
                names.push(name);
            }
        }
        names.sort();
        Ok(names)
    }

    /// Template content; invalid UTF-8 is replaced rather than rejected.
    pub async fn fetch(&self, name: &JobName) -> Result<String, CoreError> {
        let path = self.path(name);
        match tokio::fs::read(&path).await {
            Ok(bytes) => Ok(String::from_utf8_lossy(&bytes).into_owned()),
            Err(e) if e.kind() == ErrorKind::NotFound => {
                Err(CoreError::TemplateNotFound(name.clone()))
            }
            Err(e) => Err(CoreError::io(&path)(e)),
        }
    }
}
