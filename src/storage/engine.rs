use crate::core::Result;
use async_trait::async_trait;

/// Precondition a backend enforces atomically while writing a record.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WriteCondition {
    /// Fail with `DuplicateRecord` if the name is taken.
    MustNotExist,
    /// Fail with `RecordNotFound` if the name is free.
    MustExist,
    Any,
}

/// Result of a paged scan over one kind.
#[derive(Debug, Clone, Default)]
pub struct ScanResult {
    /// `(name, encoded record)` pairs in ascending name order.
    pub records: Vec<(String, Vec<u8>)>,
    pub total_count: usize,
}

/// Storage backend trait - allows pluggable persistence backends.
///
/// Records are opaque byte strings partitioned by kind and keyed by name.
/// Backends are responsible for making `put` with a write condition
/// atomic with respect to concurrent writers of the same key.
#[async_trait]
pub trait StorageBackend: Send + Sync {
    /// Write a record under `(kind, name)` subject to `condition`.
    async fn put(
        &self,
        kind: &str,
        name: &str,
        record: Vec<u8>,
        condition: WriteCondition,
    ) -> Result<()>;

    /// Fetch a record, `None` if absent.
    async fn get(&self, kind: &str, name: &str) -> Result<Option<Vec<u8>>>;

    /// Remove a record. Returns whether it existed.
    async fn delete(&self, kind: &str, name: &str) -> Result<bool>;

    /// Read up to `limit` records of `kind` starting at `offset`.
    async fn scan(&self, kind: &str, offset: usize, limit: usize) -> Result<ScanResult>;

    /// Number of records stored for `kind`.
    async fn count(&self, kind: &str) -> Result<usize> {
        Ok(self.scan(kind, 0, 0).await?.total_count)
    }
}
