pub mod codec;
pub mod engine;
pub mod memory;
pub mod snapshot;
pub mod store;

pub use engine::{ScanResult, StorageBackend, WriteCondition};
pub use memory::InMemoryBackend;
pub use snapshot::{BackendSnapshot, SnapshotManager};
pub use store::{ENTITY_KIND, EntitySchemaKind, GenericStore, RecordKind};
