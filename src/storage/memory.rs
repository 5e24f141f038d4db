use super::engine::{ScanResult, StorageBackend, WriteCondition};
use crate::core::{DataStoreError, Result};
use async_trait::async_trait;
use std::collections::{BTreeMap, HashMap};
use std::sync::Arc;
use tokio::sync::RwLock;

/// Records of one kind, ordered by name.
pub type Partition = BTreeMap<String, Vec<u8>>;

pub struct InMemoryBackend {
    /// Each kind has its own lock so writers of different kinds never contend.
    /// The outer lock only guards the set of kinds.
    partitions: RwLock<HashMap<String, Arc<RwLock<Partition>>>>,
}

impl InMemoryBackend {
    pub fn new() -> Self {
        Self {
            partitions: RwLock::new(HashMap::new()),
        }
    }

    async fn partition(&self, kind: &str) -> Option<Arc<RwLock<Partition>>> {
        self.partitions.read().await.get(kind).cloned()
    }

    async fn partition_or_create(&self, kind: &str) -> Arc<RwLock<Partition>> {
        if let Some(partition) = self.partition(kind).await {
            return partition;
        }
        let mut partitions = self.partitions.write().await;
        partitions
            .entry(kind.to_string())
            .or_insert_with(|| Arc::new(RwLock::new(Partition::new())))
            .clone()
    }

    /// Kinds that currently hold at least one record.
    pub async fn kinds(&self) -> Vec<String> {
        let partitions = self.partitions.read().await;
        let mut kinds = Vec::with_capacity(partitions.len());
        for (kind, partition) in partitions.iter() {
            if !partition.read().await.is_empty() {
                kinds.push(kind.clone());
            }
        }
        kinds.sort();
        kinds
    }

    /// Copy of every partition (for snapshots).
    pub async fn export(&self) -> HashMap<String, Partition> {
        let partitions = self.partitions.read().await;
        let mut exported = HashMap::with_capacity(partitions.len());
        for (kind, partition) in partitions.iter() {
            let partition = partition.read().await;
            if !partition.is_empty() {
                exported.insert(kind.clone(), partition.clone());
            }
        }
        exported
    }

    /// Replace all contents with the given partitions (crash recovery).
    pub async fn restore(&self, data: HashMap<String, Partition>) {
        let mut partitions = self.partitions.write().await;
        partitions.clear();
        for (kind, partition) in data {
            partitions.insert(kind, Arc::new(RwLock::new(partition)));
        }
    }
}

impl Default for InMemoryBackend {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl StorageBackend for InMemoryBackend {
    async fn put(
        &self,
        kind: &str,
        name: &str,
        record: Vec<u8>,
        condition: WriteCondition,
    ) -> Result<()> {
        let partition = self.partition_or_create(kind).await;
        let mut partition = partition.write().await;
        let exists = partition.contains_key(name);

        match condition {
            WriteCondition::MustNotExist if exists => {
                return Err(DataStoreError::DuplicateRecord {
                    kind: kind.to_string(),
                    name: name.to_string(),
                });
            }
            WriteCondition::MustExist if !exists => {
                return Err(DataStoreError::RecordNotFound {
                    kind: kind.to_string(),
                    name: name.to_string(),
                });
            }
            _ => {}
        }

        partition.insert(name.to_string(), record);
        Ok(())
    }

    async fn get(&self, kind: &str, name: &str) -> Result<Option<Vec<u8>>> {
        let Some(partition) = self.partition(kind).await else {
            return Ok(None);
        };
        let partition = partition.read().await;
        Ok(partition.get(name).cloned())
    }

    async fn delete(&self, kind: &str, name: &str) -> Result<bool> {
        let Some(partition) = self.partition(kind).await else {
            return Ok(false);
        };
        let mut partition = partition.write().await;
        Ok(partition.remove(name).is_some())
    }

    async fn scan(&self, kind: &str, offset: usize, limit: usize) -> Result<ScanResult> {
        let Some(partition) = self.partition(kind).await else {
            return Ok(ScanResult::default());
        };
        let partition = partition.read().await;
        let records = partition
            .iter()
            .skip(offset)
            .take(limit)
            .map(|(name, bytes)| (name.clone(), bytes.clone()))
            .collect();
        Ok(ScanResult {
            records,
            total_count: partition.len(),
        })
    }

    async fn count(&self, kind: &str) -> Result<usize> {
        match self.partition(kind).await {
            Some(partition) => Ok(partition.read().await.len()),
            None => Ok(0),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn bytes(s: &str) -> Vec<u8> {
        s.as_bytes().to_vec()
    }

    #[tokio::test]
    async fn test_put_conditions() {
        let backend = InMemoryBackend::new();
        backend.put("Book", "b1", bytes("v1"), WriteCondition::MustNotExist).await.unwrap();

        let err = backend
            .put("Book", "b1", bytes("v2"), WriteCondition::MustNotExist)
            .await
            .unwrap_err();
        assert!(matches!(err, DataStoreError::DuplicateRecord { .. }));

        let err = backend
            .put("Book", "b2", bytes("v2"), WriteCondition::MustExist)
            .await
            .unwrap_err();
        assert!(matches!(err, DataStoreError::RecordNotFound { .. }));

        backend.put("Book", "b1", bytes("v3"), WriteCondition::MustExist).await.unwrap();
        assert_eq!(backend.get("Book", "b1").await.unwrap(), Some(bytes("v3")));
    }

    #[tokio::test]
    async fn test_kinds_are_partitioned() {
        let backend = InMemoryBackend::new();
        backend.put("Book", "x", bytes("book"), WriteCondition::Any).await.unwrap();
        backend.put("Author", "x", bytes("author"), WriteCondition::Any).await.unwrap();

        assert_eq!(backend.get("Book", "x").await.unwrap(), Some(bytes("book")));
        assert_eq!(backend.get("Author", "x").await.unwrap(), Some(bytes("author")));
        assert_eq!(backend.get("Missing", "x").await.unwrap(), None);
        assert_eq!(backend.kinds().await, vec!["Author".to_string(), "Book".to_string()]);
    }

    #[tokio::test]
    async fn test_scan_is_ordered_and_counted() {
        let backend = InMemoryBackend::new();
        for name in ["c", "a", "d", "b"] {
            backend.put("K", name, bytes(name), WriteCondition::Any).await.unwrap();
        }

        let page = backend.scan("K", 1, 2).await.unwrap();
        let names: Vec<_> = page.records.iter().map(|(n, _)| n.as_str()).collect();
        assert_eq!(names, vec!["b", "c"]);
        assert_eq!(page.total_count, 4);

        let past_end = backend.scan("K", 10, 2).await.unwrap();
        assert!(past_end.records.is_empty());
        assert_eq!(past_end.total_count, 4);

        assert_eq!(backend.count("K").await.unwrap(), 4);
        assert_eq!(backend.count("Other").await.unwrap(), 0);
    }

    #[tokio::test]
    async fn test_delete_reports_existence() {
        let backend = InMemoryBackend::new();
        backend.put("K", "a", bytes("a"), WriteCondition::Any).await.unwrap();
        assert!(backend.delete("K", "a").await.unwrap());
        assert!(!backend.delete("K", "a").await.unwrap());
        assert!(!backend.delete("Nope", "a").await.unwrap());
    }

    #[tokio::test]
    async fn test_export_restore() {
        let backend = InMemoryBackend::new();
        backend.put("K", "a", bytes("a"), WriteCondition::Any).await.unwrap();
        let exported = backend.export().await;

        let restored = InMemoryBackend::new();
        restored.put("Other", "z", bytes("z"), WriteCondition::Any).await.unwrap();
        restored.restore(exported).await;

        assert_eq!(restored.get("K", "a").await.unwrap(), Some(bytes("a")));
        assert_eq!(restored.get("Other", "z").await.unwrap(), None);
    }
}
