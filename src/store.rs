//! File-backed persistence for the health snapshot

use crate::errors::{MonitorError, Result};
use crate::snapshot::HealthSnapshot;
use std::path::{Path, PathBuf};
use tracing::debug;

/// Default snapshot location, relative to the working directory
pub const DEFAULT_STATUS_FILE: &str = "airflow_status.json";

#[derive(Debug, Clone)]
pub struct StatusStore {
    path: PathBuf,
}

impl StatusStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Read the snapshot. A missing or unparseable file is an error; nothing is synthesized.
    pub async fn load(&self) -> Result<HealthSnapshot> {
        let raw = tokio::fs::read(&self.path).await.map_err(|e| {
            MonitorError::Snapshot(format!("cannot read {}: {}", self.path.display(), e))
        })?;

        serde_json::from_slice(&raw).map_err(|e| {
            MonitorError::Snapshot(format!("cannot parse {}: {}", self.path.display(), e))
        })
    }

    /// Replace the stored snapshot with `snapshot`
    pub async fn save(&self, snapshot: &HealthSnapshot) -> Result<()> {
        let body = serde_json::to_vec_pretty(snapshot)?;

        // Write beside the target and rename so readers never see a partial file.
        let staging = self.staging_path();
        tokio::fs::write(&staging, &body).await?;
        tokio::fs::rename(&staging, &self.path).await?;

        debug!("Saved status snapshot to {}", self.path.display());
        Ok(())
    }

    fn staging_path(&self) -> PathBuf {
        let mut name = self
            .path
            .file_name()
            .map(|n| n.to_os_string())
            .unwrap_or_else(|| DEFAULT_STATUS_FILE.into());
        name.push(".tmp");
        self.path.with_file_name(name)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::snapshot::ComponentRecord;
    use tempfile::tempdir;

    #[tokio::test]
    async fn test_save_then_load_round_trip() {
        let dir = tempdir().unwrap();
        let store = StatusStore::new(dir.path().join(DEFAULT_STATUS_FILE));

        let mut snapshot = HealthSnapshot::all_healthy();
        snapshot.webserver = ComponentRecord {
            status: "unhealthy".to_string(),
            down_since: "2024-01-01 10:00:00".to_string(),
            recovered: false,
        };
        snapshot.metadatabase.status = "degraded".to_string();

        store.save(&snapshot).await.unwrap();
        let loaded = store.load().await.unwrap();

        assert_eq!(loaded, snapshot);
        assert!(!dir.path().join("airflow_status.json.tmp").exists());
    }

    #[tokio::test]
    async fn test_save_overwrites_previous_contents() {
        let dir = tempdir().unwrap();
        let store = StatusStore::new(dir.path().join(DEFAULT_STATUS_FILE));

        let mut snapshot = HealthSnapshot::all_healthy();
        snapshot.scheduler.recovered = false;
        store.save(&snapshot).await.unwrap();

        let healthy = HealthSnapshot::all_healthy();
        store.save(&healthy).await.unwrap();

        assert_eq!(store.load().await.unwrap(), healthy);
    }

    #[tokio::test]
    async fn test_saved_file_is_indented_json() {
        let dir = tempdir().unwrap();
        let store = StatusStore::new(dir.path().join(DEFAULT_STATUS_FILE));
        store.save(&HealthSnapshot::all_healthy()).await.unwrap();

        let text = std::fs::read_to_string(store.path()).unwrap();
        assert!(text.contains("\n  \"webserver_status\": \"healthy\""));
    }

    #[tokio::test]
    async fn test_missing_file_fails_to_load() {
        let dir = tempdir().unwrap();
        let store = StatusStore::new(dir.path().join("absent.json"));

        let err = store.load().await.unwrap_err();
        assert!(matches!(err, MonitorError::Snapshot(_)));
    }

    #[tokio::test]
    async fn test_malformed_file_fails_to_load() {
        let dir = tempdir().unwrap();
        let path = dir.path().join(DEFAULT_STATUS_FILE);
        std::fs::write(&path, "not json").unwrap();

        let err = StatusStore::new(path).load().await.unwrap_err();
        assert!(err.to_string().contains("cannot parse"));
    }

    #[tokio::test]
    async fn test_save_into_missing_directory_fails() {
        let dir = tempdir().unwrap();
        let store = StatusStore::new(dir.path().join("nope").join(DEFAULT_STATUS_FILE));

        tokio_test::assert_err!(store.save(&HealthSnapshot::all_healthy()).await);
    }
}
