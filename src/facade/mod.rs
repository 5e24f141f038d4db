pub mod config;
pub mod datastore;

pub use config::{DEFAULT_MAX_PAGE_SIZE, DataStoreConfig};
pub use datastore::DataStore;
