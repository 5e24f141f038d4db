use super::record_type::{RecordType, RecordTypeHandle};
use super::registry::SchemaRegistry;
use crate::core::Result;
use std::sync::{Arc, RwLock};
use tracing::debug;

/// Process-wide cache of synthesized record types, keyed by schema name.
///
/// Writers never mutate the map readers hold: they build a new version
/// (structurally shared, so cheap) and swap it in. A handle that was
/// evicted stays valid for whoever still holds it.
#[derive(Debug, Default)]
pub struct TypeCache {
    entries: RwLock<im::HashMap<String, RecordTypeHandle>>,
}

impl TypeCache {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, entity: &str) -> Result<Option<RecordTypeHandle>> {
        Ok(self.entries.read()?.get(entity).cloned())
    }

    /// Store `handle` unless an entry with the same version is already
    /// cached, and return the cached entry.
    pub(crate) fn insert(&self, handle: RecordTypeHandle) -> Result<RecordTypeHandle> {
        let mut entries = self.entries.write()?;
        if let Some(existing) = entries.get(handle.entity())
            && existing.version() == handle.version()
        {
            return Ok(existing.clone());
        }
        *entries = entries.update(handle.entity().to_string(), handle.clone());
        Ok(handle)
    }

    /// Evict the entry for `entity`. Returns whether one was cached.
    pub fn invalidate(&self, entity: &str) -> Result<bool> {
        let mut entries = self.entries.write()?;
        if !entries.contains_key(entity) {
            return Ok(false);
        }
        *entries = entries.without(entity);
        debug!(entity, "record type evicted");
        Ok(true)
    }

    /// Consistent view of the whole cache at this instant.
    pub fn snapshot(&self) -> Result<im::HashMap<String, RecordTypeHandle>> {
        Ok(self.entries.read()?.clone())
    }

    pub fn len(&self) -> Result<usize> {
        Ok(self.entries.read()?.len())
    }

    pub fn is_empty(&self) -> Result<bool> {
        Ok(self.len()? == 0)
    }
}

/// Maps schema names to reusable record types.
pub struct TypeSynthesizer {
    registry: Arc<SchemaRegistry>,
    cache: Arc<TypeCache>,
}

impl TypeSynthesizer {
    /// Shares the registry's cache so schema updates evict stale types.
    pub fn new(registry: Arc<SchemaRegistry>) -> Self {
        let cache = registry.type_cache().clone();
        Self { registry, cache }
    }

    pub fn cache(&self) -> &Arc<TypeCache> {
        &self.cache
    }

    /// Record type for the current version of schema `entity`.
    pub async fn type_for(&self, entity: &str) -> Result<RecordTypeHandle> {
        let schema = self.registry.resolve(entity).await?;
        let version = schema.version();

        if let Some(handle) = self.cache.get(entity)?
            && handle.version() == version
        {
            debug!(entity, %version, "record type cache hit");
            return Ok(handle);
        }

        debug!(entity, %version, "synthesizing record type");
        self.cache.insert(Arc::new(RecordType::synthesize(&schema)))
    }
}
