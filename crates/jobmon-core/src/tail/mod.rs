use std::{io::ErrorKind, io::SeekFrom, path::Path};

use tokio::io::{AsyncReadExt, AsyncSeekExt};

use crate::error::CoreError;

/// Bytes read from the end of a transcript at most.
pub const TAIL_WINDOW: u64 = 4 * 1024;

/// Last `n` lines of the file at `path`, in file order, without line terminators.
///
/// Only the final [`TAIL_WINDOW`] bytes are read, so a tail whose lines do not fit in the window
/// comes back shorter than `n`, and its first line may be cut. A missing file has no lines.
pub async fn tail(path: &Path, n: usize) -> Result<Vec<String>, CoreError> {
    if n == 0 {
        return Ok(Vec::new());
    }

    let mut file = match tokio::fs::File::open(path).await {
        Ok(file) => file,
        Err(e) if e.kind() == ErrorKind::NotFound => return Ok(Vec::new()),
        Err(e) => return Err(CoreError::io(path)(e)),
    };

    let len = file.metadata().await.map_err(CoreError::io(path))?.len();
    file.seek(SeekFrom::Start(len.saturating_sub(TAIL_WINDOW)))
        .await
        .map_err(CoreError::io(path))?;

    let mut buf = Vec::with_capacity(len.min(TAIL_WINDOW) as usize);
    file.read_to_end(&mut buf).await.map_err(CoreError::io(path))?;

    let text = String::from_utf8_lossy(&buf);
    let lines: Vec<&str> = text.lines().collect();
    let skip = lines.len().saturating_sub(n);
    Ok(lines[skip..].iter().map(|l| l.to_string()).collect())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn missing_file_has_no_lines() {
        let dir = tempfile::tempdir().unwrap();
        let lines = tail(&dir.path().join("absent.log"), 100).await.unwrap();
        assert!(lines.is_empty());
    }

    #[tokio::test]
    async fn short_file_returns_all_lines_in_order() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("t.log");
        std::fs::write(&path, "one\ntwo\r\nthree\n").unwrap();

        let lines = tail(&path, 100).await.unwrap();
        assert_eq!(lines, vec!["one", "two", "three"]);
    }

    #[tokio::test]
    async fn returns_only_the_last_n() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("t.log");
        let body: String = (1..=10).map(|i| format!("line {i}\n")).collect();
        std::fs::write(&path, body).unwrap();

        let lines = tail(&path, 3).await.unwrap();
        assert_eq!(lines, vec!["line 8", "line 9", "line 10"]);
    }

    #[tokio::test]
    async fn zero_lines_requested() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("t.log");
        std::fs::write(&path, "a\nb\n").unwrap();
        assert!(tail(&path, 0).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn unterminated_last_line_is_kept() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("t.log");
        std::fs::write(&path, "done\nworking").unwrap();
        assert_eq!(tail(&path, 5).await.unwrap(), vec!["done", "working"]);
    }

    // Bounded read cost over exactness: 100 lines of 100 bytes do not fit in the window.
    #[tokio::test]
    async fn window_limits_long_tails() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("big.log");
        let line = "x".repeat(99);
        let body: String = (0..100).map(|_| format!("{line}\n")).collect();
        std::fs::write(&path, body).unwrap();

        let lines = tail(&path, 100).await.unwrap();
        let window_lines = (TAIL_WINDOW / 100) as usize;
        assert!(lines.len() < 100);
        // the window starts mid-line, the partial first line is returned as well
        assert_eq!(lines.len(), window_lines + 1);
        assert!(lines[1..].iter().all(|l| l.len() == 99));
        assert!(lines[0].len() < 99);
    }

    #[tokio::test]
    async fn invalid_utf8_is_replaced() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("t.log");
        std::fs::write(&path, b"ok\n\xff\xfe\n").unwrap();

        let lines = tail(&path, 10).await.unwrap();
        assert_eq!(lines.len(), 2);
        assert_eq!(lines[0], "ok");
    }
}
