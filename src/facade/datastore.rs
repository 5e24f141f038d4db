use super::config::DataStoreConfig;
use crate::core::{AttributeMap, DataStoreError, Entity, Page, PageRequest, Record, Result};
use crate::schema::{RecordBuilder, RecordTypeHandle, SchemaRegistry, TypeCache, TypeSynthesizer};
use crate::storage::{GenericStore, InMemoryBackend, SnapshotManager, StorageBackend};
use std::sync::Arc;
use tracing::{info, warn};

/// Entry point for request handlers: schema management and data CRUD.
///
/// Every component is created here and injected into the ones that need
/// it; nothing is reached through a global.
pub struct DataStore {
    config: DataStoreConfig,
    store: GenericStore,
    registry: Arc<SchemaRegistry>,
    synthesizer: TypeSynthesizer,
    builder: RecordBuilder,
    memory: Option<Arc<InMemoryBackend>>,
    snapshots: Option<SnapshotManager>,
}

impl DataStore {
    /// Build a datastore on top of any backend.
    pub fn new(config: DataStoreConfig, backend: Arc<dyn StorageBackend>) -> Result<Self> {
        Self::assemble(config, backend, None)
    }

    /// Datastore over a fresh in-memory backend. The snapshot path, if
    /// configured, is used by [`checkpoint`](Self::checkpoint) only.
    pub fn in_memory(config: DataStoreConfig) -> Result<Self> {
        let memory = Arc::new(InMemoryBackend::new());
        Self::assemble(config, memory.clone(), Some(memory))
    }

    /// In-memory datastore restored from the configured snapshot, if any.
    pub async fn open(config: DataStoreConfig) -> Result<Self> {
        let datastore = Self::in_memory(config)?;
        if let (Some(snapshots), Some(memory)) = (&datastore.snapshots, &datastore.memory)
            && snapshots.recover(memory).await?
        {
            info!(path = %snapshots.path().display(), "datastore recovered from snapshot");
        }
        Ok(datastore)
    }

    fn assemble(
        config: DataStoreConfig,
        backend: Arc<dyn StorageBackend>,
        memory: Option<Arc<InMemoryBackend>>,
    ) -> Result<Self> {
        config.validate()?;
        let store = GenericStore::new(backend);
        let registry = Arc::new(SchemaRegistry::new(store.clone(), Arc::new(TypeCache::new())));
        let synthesizer = TypeSynthesizer::new(registry.clone());
        let builder = RecordBuilder::new().with_unknown_attributes(config.unknown_attributes);
        let snapshots = config.snapshot_path.as_ref().map(SnapshotManager::new);

        Ok(Self {
            config,
            store,
            registry,
            synthesizer,
            builder,
            memory,
            snapshots,
        })
    }

    pub fn config(&self) -> &DataStoreConfig {
        &self.config
    }

    pub fn registry(&self) -> &Arc<SchemaRegistry> {
        &self.registry
    }

    pub fn synthesizer(&self) -> &TypeSynthesizer {
        &self.synthesizer
    }

    pub fn store(&self) -> &GenericStore {
        &self.store
    }

    /// Write the in-memory backend to the configured snapshot file.
    pub async fn checkpoint(&self) -> Result<usize> {
        let (Some(snapshots), Some(memory)) = (&self.snapshots, &self.memory) else {
            return Err(DataStoreError::InvalidConfig(
                "checkpoint needs an in-memory backend and a snapshot path".to_string(),
            ));
        };
        let records = log_failure("checkpoint", snapshots.checkpoint(memory).await)?;
        info!(path = %snapshots.path().display(), records, "datastore checkpoint written");
        Ok(records)
    }

    // ------------------------------------------------------------------
    // Schemas
    // ------------------------------------------------------------------

    pub async fn create_entity(&self, entity: Entity) -> Result<Entity> {
        info!(entity = %entity.name, "creating entity");
        log_failure("create_entity", self.registry.define(entity).await)
    }

    pub async fn read_entity(&self, name: &str) -> Result<Entity> {
        info!(entity = name, "reading entity");
        log_failure("read_entity", self.registry.resolve(name).await)
    }

    /// `name` is the identity the caller addressed; it must match the payload.
    pub async fn update_entity(&self, name: &str, entity: &Entity) -> Result<()> {
        info!(entity = name, attributes = entity.attributes.len(), "updating entity");
        let result = if entity.name != name {
            Err(identity_mismatch(name, &entity.name))
        } else {
            self.registry.update(entity).await
        };
        log_failure("update_entity", result)
    }

    pub async fn delete_entity(&self, name: &str) -> Result<()> {
        info!(entity = name, "deleting entity");
        log_failure("delete_entity", self.registry.remove(name).await)
    }

    pub async fn list_entities(&self, request: PageRequest) -> Result<Page<Entity>> {
        let request = self.config.normalize(request);
        info!(page = request.page_number, size = request.page_size, "listing entities");
        log_failure("list_entities", self.registry.list(request).await)
    }

    // ------------------------------------------------------------------
    // Data records
    // ------------------------------------------------------------------

    /// Current record type of schema `entity`.
    pub async fn record_type(&self, entity: &str) -> Result<RecordTypeHandle> {
        self.synthesizer.type_for(entity).await
    }

    /// Validate `input` against schema `entity` without storing it.
    pub async fn build_record(&self, entity: &str, input: &AttributeMap) -> Result<Record> {
        let record_type = self.synthesizer.type_for(entity).await?;
        self.builder.build(&record_type, input)
    }

    pub async fn create_data(&self, entity: &str, input: &AttributeMap) -> Result<Record> {
        info!(entity, "creating record");
        let result: Result<Record> = async {
            let record_type = self.synthesizer.type_for(entity).await?;
            let record = self.builder.build(&record_type, input)?;
            self.store.create(record, &record_type).await
        }
        .await;
        log_failure("create_data", result)
    }

    pub async fn read_data(&self, entity: &str, name: &str) -> Result<Record> {
        info!(entity, record = name, "reading record");
        let result: Result<Record> = async {
            let record_type = self.synthesizer.type_for(entity).await?;
            self.store.read(name, &record_type).await
        }
        .await;
        log_failure("read_data", result)
    }

    /// Fully replace record `name`. The payload's own name must equal `name`.
    pub async fn update_data(&self, entity: &str, name: &str, input: &AttributeMap) -> Result<()> {
        info!(entity, record = name, "updating record");
        let result: Result<()> = async {
            let record_type = self.synthesizer.type_for(entity).await?;
            let record = self.builder.build(&record_type, input)?;
            if record.name() != name {
                return Err(identity_mismatch(name, record.name()));
            }
            self.store.update(&record, &record_type).await
        }
        .await;
        log_failure("update_data", result)
    }

    pub async fn delete_data(&self, entity: &str, name: &str) -> Result<()> {
        info!(entity, record = name, "deleting record");
        let result: Result<()> = async {
            let record_type = self.synthesizer.type_for(entity).await?;
            self.store.delete(name, &record_type).await
        }
        .await;
        log_failure("delete_data", result)
    }

    pub async fn list_data(&self, entity: &str, request: PageRequest) -> Result<Page<Record>> {
        let request = self.config.normalize(request);
        info!(entity, page = request.page_number, size = request.page_size, "listing records");
        let result: Result<Page<Record>> = async {
            let record_type = self.synthesizer.type_for(entity).await?;
            self.store.list(&record_type, request).await
        }
        .await;
        log_failure("list_data", result)
    }
}

fn identity_mismatch(addressed: &str, payload: &str) -> DataStoreError {
    DataStoreError::ValidationError(format!(
        "Invalid record: addressed as '{}' but payload is named '{}'",
        addressed, payload
    ))
}

fn log_failure<T>(operation: &'static str, result: Result<T>) -> Result<T> {
    if let Err(err) = &result {
        warn!(operation, error = %err, client_error = err.is_client_error(), "datastore operation failed");
    }
    result
}
