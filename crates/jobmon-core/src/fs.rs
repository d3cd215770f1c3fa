use std::{
    io::ErrorKind,
    path::{Path, PathBuf},
    time::UNIX_EPOCH,
};

use tokio::io::AsyncWriteExt;

use crate::error::CoreError;

/// `true` if `path` exists and is a regular file.
pub(crate) async fn is_file(path: &Path) -> Result<bool, CoreError> {
    match tokio::fs::metadata(path).await {
        Ok(meta) => Ok(meta.is_file()),
        Err(e) if e.kind() == ErrorKind::NotFound => Ok(false),
        Err(e) => Err(CoreError::io(path)(e)),
    }
}

/// Modification time in nanoseconds since the epoch (0 when unavailable).
pub(crate) async fn mtime_ns(path: &Path) -> u64 {
    tokio::fs::metadata(path)
        .await
        .and_then(|m| m.modified())
        .ok()
        .and_then(|t| t.duration_since(UNIX_EPOCH).ok())
        .map(|d| u64::try_from(d.as_nanos()).unwrap_or(u64::MAX))
        .unwrap_or(0)
}

/// Entries of `dir`; a missing directory is treated as empty.
pub(crate) async fn list_dir(dir: &Path) -> Result<Vec<PathBuf>, CoreError> {
    let mut rd = match tokio::fs::read_dir(dir).await {
        Ok(rd) => rd,
        Err(e) if e.kind() == ErrorKind::NotFound => return Ok(Vec::new()),
        Err(e) => return Err(CoreError::io(dir)(e)),
    };

    let mut out = Vec::new();
    while let Some(entry) = rd.next_entry().await.map_err(CoreError::io(dir))? {
        out.push(entry.path());
    }
    Ok(out)
}

pub(crate) async fn ensure_dir(dir: &Path) -> Result<(), CoreError> {
    tokio::fs::create_dir_all(dir)
        .await
        .map_err(CoreError::io(dir))
}

/// Write `contents` to `path` through a temporary sibling and a rename,
/// so readers never observe a partially written file.
pub(crate) async fn write_atomic(path: &Path, contents: &[u8]) -> Result<(), CoreError> {
    let file_name = path
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_default();
    let tmp = path.with_file_name(format!(".{file_name}.tmp"));

    let mut file = tokio::fs::File::create(&tmp)
        .await
        .map_err(CoreError::io(&tmp))?;
    file.write_all(contents).await.map_err(CoreError::io(&tmp))?;
    file.sync_all().await.map_err(CoreError::io(&tmp))?;
    drop(file);

    if let Err(e) = tokio::fs::rename(&tmp, path).await {
        let _ = tokio::fs::remove_file(&tmp).await;
        return Err(CoreError::io(path)(e));
    }
    Ok(())
}
