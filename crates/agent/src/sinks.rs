//! Iteration sinks and their maintenance.
//!
//! There is no background cleanup task. Callers that keep records around
//! call [`MemorySink::cleanup`] on whatever schedule suits them.

use async_trait::async_trait;
use chrono::{DateTime, Duration, Utc};
use std::path::{Path, PathBuf};
use tokio::io::AsyncWriteExt;
use tokio::sync::{Mutex, RwLock};
use tracing::debug;

use steward_core::error::{Error, Result};
use steward_core::session::SessionId;
use steward_core::sink::{IterationRecord, IterationSink};

/// Keeps every record in memory.
#[derive(Default)]
pub struct MemorySink {
    records: RwLock<Vec<IterationRecord>>,
}

impl MemorySink {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn records(&self) -> Vec<IterationRecord> {
        self.records.read().await.clone()
    }

    pub async fn records_for(&self, session_id: &SessionId) -> Vec<IterationRecord> {
        self.records
            .read()
            .await
            .iter()
            .filter(|r| &r.session_id == session_id)
            .cloned()
            .collect()
    }

    pub async fn len(&self) -> usize {
        self.records.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.records.read().await.is_empty()
    }

    /// Drop records older than `max_age`. Returns how many were removed.
    pub async fn cleanup(&self, max_age: Duration) -> usize {
        self.cleanup_at(max_age, Utc::now()).await
    }

    pub async fn cleanup_at(&self, max_age: Duration, now: DateTime<Utc>) -> usize {
        let cutoff = now - max_age;
        let mut records = self.records.write().await;
        let before = records.len();
        records.retain(|r| r.recorded_at >= cutoff);
        let removed = before - records.len();
        if removed > 0 {
            debug!(removed, "Cleaned up iteration records");
        }
        removed
    }
}

#[async_trait]
impl IterationSink for MemorySink {
    async fn record(&self, record: &IterationRecord) -> Result<()> {
        self.records.write().await.push(record.clone());
        Ok(())
    }
}

/// Appends one JSON object per line to a file.
pub struct JsonlSink {
    path: PathBuf,
    file: Mutex<tokio::fs::File>,
}

impl JsonlSink {
    /// Open `path` for appending, creating it and its parent directory.
    pub async fn open(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref().to_path_buf();
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            tokio::fs::create_dir_all(parent)
                .await
                .map_err(|e| Error::Sink(format!("{}: {e}", parent.display())))?;
        }
        let file = tokio::fs::OpenOptions::new()
            .create(true)
            .append(true)
            .open(&path)
            .await
            .map_err(|e| Error::Sink(format!("{}: {e}", path.display())))?;
        Ok(Self {
            path,
            file: Mutex::new(file),
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

#[async_trait]
impl IterationSink for JsonlSink {
    async fn record(&self, record: &IterationRecord) -> Result<()> {
        let mut line = serde_json::to_string(record)?;
        line.push('\n');
        let mut file = self.file.lock().await;
        file.write_all(line.as_bytes())
            .await
            .map_err(|e| Error::Sink(format!("{}: {e}", self.path.display())))?;
        file.flush()
            .await
            .map_err(|e| Error::Sink(format!("{}: {e}", self.path.display())))?;
        Ok(())
    }
}
