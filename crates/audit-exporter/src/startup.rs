//! Startup barrier: hold off tailing until every audit log has content.

use std::path::{Path, PathBuf};
use std::time::Duration;

use tracing::info;

/// Returns true once `path` exists and holds at least one byte.
async fn is_ready(path: &Path) -> bool {
    tokio::fs::metadata(path)
        .await
        .is_ok_and(|meta| meta.len() > 0)
}

/// Waits, checking every `retry`, until all `paths` exist and are non-empty.
///
/// Waits indefinitely; the paths still missing are logged on each retry.
pub async fn wait_for_sources(paths: &[PathBuf], retry: Duration) {
    loop {
        let mut missing = Vec::new();
        for path in paths {
            if !is_ready(path).await {
                missing.push(path.display().to_string());
            }
        }

        if missing.is_empty() {
            info!(sources = paths.len(), "all audit logs present");
            return;
        }

        info!(missing = ?missing, "waiting for audit logs");
        tokio::time::sleep(retry).await;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[tokio::test]
    async fn returns_immediately_when_ready() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("audit.log");
        std::fs::write(&path, "{}\n").unwrap();

        tokio::time::timeout(
            Duration::from_secs(1),
            wait_for_sources(&[path], Duration::from_millis(10)),
        )
        .await
        .unwrap();
    }

    #[tokio::test]
    async fn empty_file_is_not_ready() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("audit.log");
        std::fs::write(&path, "").unwrap();

        let waited = tokio::time::timeout(
            Duration::from_millis(100),
            wait_for_sources(&[path], Duration::from_millis(10)),
        )
        .await;
        assert!(waited.is_err());
    }

    #[tokio::test]
    async fn waits_for_every_source() {
        let dir = TempDir::new().unwrap();
        let first = dir.path().join("a.log");
        let second = dir.path().join("b.log");
        std::fs::write(&first, "{}\n").unwrap();

        let paths = vec![first, second.clone()];
        let waiter = tokio::spawn(async move {
            wait_for_sources(&paths, Duration::from_millis(10)).await;
        });

        tokio::time::sleep(Duration::from_millis(50)).await;
        assert!(!waiter.is_finished());

        std::fs::write(&second, "{}\n").unwrap();
        tokio::time::timeout(Duration::from_secs(1), waiter)
            .await
            .unwrap()
            .unwrap();
    }
}
