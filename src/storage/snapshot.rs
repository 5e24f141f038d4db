//! Point-in-time snapshots of the in-memory backend.

use super::memory::{InMemoryBackend, Partition};
use crate::core::{DataStoreError, Result};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fs::{self, File};
use std::io::{BufWriter, Read, Write};
use std::path::{Path, PathBuf};
use std::time::{SystemTime, UNIX_EPOCH};

const SNAPSHOT_VERSION: u32 = 1;

#[derive(Debug, Serialize, Deserialize)]
pub struct BackendSnapshot {
    pub version: u32,
    pub partitions: HashMap<String, Partition>,
    pub metadata: SnapshotMetadata,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct SnapshotMetadata {
    pub created_at: u64,
    pub record_count: usize,
    pub kind_count: usize,
}

impl BackendSnapshot {
    pub fn new(partitions: HashMap<String, Partition>) -> Self {
        let record_count = partitions.values().map(|p| p.len()).sum();
        let kind_count = partitions.len();
        let created_at = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .map(|d| d.as_millis() as u64)
            .unwrap_or_default();
        Self {
            version: SNAPSHOT_VERSION,
            partitions,
            metadata: SnapshotMetadata {
                created_at,
                record_count,
                kind_count,
            },
        }
    }
}

pub struct SnapshotManager {
    snapshot_path: PathBuf,
}

impl SnapshotManager {
    pub fn new<P: AsRef<Path>>(snapshot_path: P) -> Self {
        Self {
            snapshot_path: snapshot_path.as_ref().to_path_buf(),
        }
    }

    pub fn path(&self) -> &Path {
        &self.snapshot_path
    }

    /// Write through a temp file and rename, so a crash never leaves a torn snapshot.
    pub fn save(&self, snapshot: &BackendSnapshot) -> Result<()> {
        if let Some(parent) = self.snapshot_path.parent() {
            fs::create_dir_all(parent).map_err(|e| storage_err("create snapshot directory", e))?;
        }
        let temp_path = self.snapshot_path.with_extension("tmp");
        let temp_file = File::create(&temp_path).map_err(|e| storage_err("create temp file", e))?;
        let mut writer = BufWriter::new(temp_file);
        let serialized = rmp_serde::to_vec_named(snapshot)?;
        writer.write_all(&serialized).map_err(|e| storage_err("write snapshot", e))?;
        writer.flush().map_err(|e| storage_err("flush snapshot", e))?;
        writer.get_mut().sync_all().map_err(|e| storage_err("sync snapshot", e))?;
        fs::rename(&temp_path, &self.snapshot_path).map_err(|e| storage_err("rename snapshot", e))?;
        Ok(())
    }

    pub fn load(&self) -> Result<Option<BackendSnapshot>> {
        if !self.snapshot_path.exists() {
            return Ok(None);
        }
        let mut file = File::open(&self.snapshot_path).map_err(|e| storage_err("open snapshot", e))?;
        let mut data = Vec::new();
        file.read_to_end(&mut data).map_err(|e| storage_err("read snapshot", e))?;
        let snapshot: BackendSnapshot = rmp_serde::from_slice(&data)?;
        if snapshot.version != SNAPSHOT_VERSION {
            return Err(DataStoreError::Storage(format!(
                "unsupported snapshot version {}",
                snapshot.version
            )));
        }
        Ok(Some(snapshot))
    }

    pub fn exists(&self) -> bool {
        self.snapshot_path.exists()
    }

    pub fn delete(&self) -> Result<()> {
        if self.snapshot_path.exists() {
            fs::remove_file(&self.snapshot_path).map_err(|e| storage_err("delete snapshot", e))?;
        }
        Ok(())
    }

    /// Save the full contents of `backend`. Returns the number of records written.
    pub async fn checkpoint(&self, backend: &InMemoryBackend) -> Result<usize> {
        let snapshot = BackendSnapshot::new(backend.export().await);
        let count = snapshot.metadata.record_count;
        self.save(&snapshot)?;
        Ok(count)
    }

    /// Load the snapshot into `backend`, if one exists. Returns whether it did.
    pub async fn recover(&self, backend: &InMemoryBackend) -> Result<bool> {
        match self.load()? {
            Some(snapshot) => {
                backend.restore(snapshot.partitions).await;
                Ok(true)
            }
            None => Ok(false),
        }
    }
}

fn storage_err(action: &str, err: std::io::Error) -> DataStoreError {
    DataStoreError::Storage(format!("Failed to {}: {}", action, err))
}
