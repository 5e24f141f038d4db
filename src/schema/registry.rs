use super::synthesizer::TypeCache;
use crate::core::{DataStoreError, Entity, Page, PageRequest, Result};
use crate::storage::{EntitySchemaKind, GenericStore};
use std::sync::Arc;
use tracing::debug;

/// Source of truth for schema definitions.
///
/// Schemas are ordinary records of the built-in [`EntitySchemaKind`]
/// stored through the same [`GenericStore`] as data records; this type
/// only adds validation, error translation and cache eviction.
pub struct SchemaRegistry {
    store: GenericStore,
    cache: Arc<TypeCache>,
}

impl SchemaRegistry {
    pub fn new(store: GenericStore, cache: Arc<TypeCache>) -> Self {
        Self { store, cache }
    }

    pub fn store(&self) -> &GenericStore {
        &self.store
    }

    pub(crate) fn type_cache(&self) -> &Arc<TypeCache> {
        &self.cache
    }

    pub async fn define(&self, entity: Entity) -> Result<Entity> {
        entity.validate()?;
        let name = entity.name.clone();
        let created = self
            .store
            .create(entity, &EntitySchemaKind)
            .await
            .map_err(|err| match err {
                DataStoreError::DuplicateRecord { .. } => DataStoreError::DuplicateSchema(name),
                other => other,
            })?;
        debug!(entity = %created.name, attributes = created.attributes.len(), "schema defined");
        Ok(created)
    }

    pub async fn resolve(&self, name: &str) -> Result<Entity> {
        self.store
            .read(name, &EntitySchemaKind)
            .await
            .map_err(|err| schema_not_found(err, name))
    }

    /// Replace the attribute list of an existing schema and evict its cached type.
    pub async fn update(&self, entity: &Entity) -> Result<()> {
        entity.validate()?;
        self.store
            .update(entity, &EntitySchemaKind)
            .await
            .map_err(|err| schema_not_found(err, &entity.name))?;
        self.cache.invalidate(&entity.name)?;
        debug!(entity = %entity.name, version = %entity.version(), "schema updated");
        Ok(())
    }

    /// Remove a schema that no longer has records.
    ///
    /// The in-use check and the delete are two backend calls; a record
    /// created in between is not detected.
    pub async fn remove(&self, name: &str) -> Result<()> {
        if !self.store.exists(name, &EntitySchemaKind).await? {
            return Err(DataStoreError::SchemaNotFound(name.to_string()));
        }

        let records = self.store.count_kind(name).await?;
        if records > 0 {
            return Err(DataStoreError::SchemaInUse {
                name: name.to_string(),
                records,
            });
        }

        self.store
            .delete(name, &EntitySchemaKind)
            .await
            .map_err(|err| schema_not_found(err, name))?;
        self.cache.invalidate(name)?;
        debug!(entity = name, "schema removed");
        Ok(())
    }

    pub async fn list(&self, request: PageRequest) -> Result<Page<Entity>> {
        self.store.list(&EntitySchemaKind, request).await
    }

    pub async fn contains(&self, name: &str) -> Result<bool> {
        self.store.exists(name, &EntitySchemaKind).await
    }
}

fn schema_not_found(err: DataStoreError, name: &str) -> DataStoreError {
    match err {
        DataStoreError::RecordNotFound { .. } => DataStoreError::SchemaNotFound(name.to_string()),
        other => other,
    }
}
