pub mod error;
pub mod page;
pub mod record;
pub mod types;
pub mod value;

pub use error::{DataStoreError, Result};
pub use page::{DEFAULT_PAGE_SIZE, Page, PageRequest};
pub use record::{AttributeMap, Record};
pub use types::{AttributeDefinition, AttributeType, Entity, NAME_ATTRIBUTE, SchemaVersion};
pub use value::Value;
