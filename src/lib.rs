// ============================================================================
// Datastore Library
// ============================================================================

pub mod core;
pub mod facade;
pub mod schema;
pub mod storage;

// Re-export main types for convenience
pub use crate::core::{
    AttributeDefinition, AttributeMap, AttributeType, DataStoreError, Entity, Page, PageRequest,
    Record, Result, SchemaVersion, Value,
};
pub use facade::{DataStore, DataStoreConfig};
pub use schema::{
    RecordBuilder, RecordType, RecordTypeHandle, SchemaRegistry, TypeCache, TypeSynthesizer,
    UnknownAttributes,
};
pub use storage::{
    EntitySchemaKind, GenericStore, InMemoryBackend, RecordKind, SnapshotManager, StorageBackend,
    WriteCondition,
};

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
