use super::codec;
use super::engine::{StorageBackend, WriteCondition};
use crate::core::{DataStoreError, Entity, Page, PageRequest, Result};
use std::sync::Arc;

/// Storage partition holding the schema definitions themselves.
///
/// Data kinds are named after their schema, and schema names can never
/// start with `$`, so this token cannot collide with one of them.
pub const ENTITY_KIND: &str = "$entity";

/// Describes how records of one kind are identified and (de)serialized.
///
/// Implemented by the built-in schema kind and by every synthesized
/// record type, so the same store code serves both.
pub trait RecordKind: Send + Sync {
    type Record: Send + Sync;

    /// Partition token passed to the backend.
    fn kind(&self) -> &str;

    fn record_name<'r>(&self, record: &'r Self::Record) -> &'r str;

    fn encode(&self, record: &Self::Record) -> Result<Vec<u8>>;

    fn decode(&self, bytes: &[u8]) -> Result<Self::Record>;
}

impl<K: RecordKind + ?Sized> RecordKind for Arc<K> {
    type Record = K::Record;

    fn kind(&self) -> &str {
        (**self).kind()
    }

    fn record_name<'r>(&self, record: &'r Self::Record) -> &'r str {
        (**self).record_name(record)
    }

    fn encode(&self, record: &Self::Record) -> Result<Vec<u8>> {
        (**self).encode(record)
    }

    fn decode(&self, bytes: &[u8]) -> Result<Self::Record> {
        (**self).decode(bytes)
    }
}

/// The fixed, built-in kind of [`Entity`] schema definitions.
#[derive(Debug, Clone, Copy, Default)]
pub struct EntitySchemaKind;

impl RecordKind for EntitySchemaKind {
    type Record = Entity;

    fn kind(&self) -> &str {
        ENTITY_KIND
    }

    fn record_name<'r>(&self, record: &'r Entity) -> &'r str {
        &record.name
    }

    fn encode(&self, record: &Entity) -> Result<Vec<u8>> {
        codec::encode(record)
    }

    fn decode(&self, bytes: &[u8]) -> Result<Entity> {
        codec::decode(bytes)
    }
}

/// CRUD and pagination over any [`RecordKind`], backend-agnostic.
#[derive(Clone)]
pub struct GenericStore {
    backend: Arc<dyn StorageBackend>,
}

impl GenericStore {
    pub fn new(backend: Arc<dyn StorageBackend>) -> Self {
        Self { backend }
    }

    pub fn backend(&self) -> &Arc<dyn StorageBackend> {
        &self.backend
    }

    /// Persist a new record and hand it back unchanged.
    pub async fn create<K: RecordKind + ?Sized>(
        &self,
        record: K::Record,
        kind: &K,
    ) -> Result<K::Record> {
        let name = checked_name(kind, &record)?;
        let bytes = kind.encode(&record)?;
        self.backend
            .put(kind.kind(), name, bytes, WriteCondition::MustNotExist)
            .await?;
        Ok(record)
    }

    pub async fn read<K: RecordKind + ?Sized>(&self, name: &str, kind: &K) -> Result<K::Record> {
        match self.backend.get(kind.kind(), name).await? {
            Some(bytes) => kind.decode(&bytes),
            None => Err(not_found(kind, name)),
        }
    }

    /// Fully replace an existing record.
    pub async fn update<K: RecordKind + ?Sized>(&self, record: &K::Record, kind: &K) -> Result<()> {
        let name = checked_name(kind, record)?;
        let bytes = kind.encode(record)?;
        self.backend
            .put(kind.kind(), name, bytes, WriteCondition::MustExist)
            .await
    }

    pub async fn delete<K: RecordKind + ?Sized>(&self, name: &str, kind: &K) -> Result<()> {
        if self.backend.delete(kind.kind(), name).await? {
            Ok(())
        } else {
            Err(not_found(kind, name))
        }
    }

    /// Records of `kind` in ascending name order, sliced to `request`.
    pub async fn list<K: RecordKind + ?Sized>(
        &self,
        kind: &K,
        request: PageRequest,
    ) -> Result<Page<K::Record>> {
        request.validate()?;
        let scan = self
            .backend
            .scan(kind.kind(), request.offset(), request.page_size)
            .await?;

        let items = scan
            .records
            .iter()
            .map(|(_, bytes)| kind.decode(bytes))
            .collect::<Result<Vec<_>>>()?;

        Ok(Page::new(items, request, scan.total_count))
    }

    pub async fn count<K: RecordKind + ?Sized>(&self, kind: &K) -> Result<usize> {
        self.backend.count(kind.kind()).await
    }

    /// Record count of a kind addressed by its partition token alone.
    pub async fn count_kind(&self, kind: &str) -> Result<usize> {
        self.backend.count(kind).await
    }

    pub async fn exists<K: RecordKind + ?Sized>(&self, name: &str, kind: &K) -> Result<bool> {
        Ok(self.backend.get(kind.kind(), name).await?.is_some())
    }
}

fn checked_name<'r, K: RecordKind + ?Sized>(kind: &K, record: &'r K::Record) -> Result<&'r str> {
    let name = kind.record_name(record);
    if name.is_empty() {
        return Err(DataStoreError::MissingName(kind.kind().to_string()));
    }
    Ok(name)
}

fn not_found<K: RecordKind + ?Sized>(kind: &K, name: &str) -> DataStoreError {
    DataStoreError::RecordNotFound {
        kind: kind.kind().to_string(),
        name: name.to_string(),
    }
}
