use crate::core::{DEFAULT_PAGE_SIZE, DataStoreError, PageRequest, Result};
use crate::schema::UnknownAttributes;
use std::path::{Path, PathBuf};

pub const DEFAULT_MAX_PAGE_SIZE: usize = 2000;

/// Datastore configuration
#[derive(Debug, Clone)]
pub struct DataStoreConfig {
    /// Page size used when a request asks for zero items
    pub default_page_size: usize,

    /// Larger page requests are clamped to this size
    pub max_page_size: usize,

    /// Handling of input keys a schema does not declare
    pub unknown_attributes: UnknownAttributes,

    /// Snapshot file of the in-memory backend, if durability is wanted
    pub snapshot_path: Option<PathBuf>,
}

impl DataStoreConfig {
    pub fn new() -> Self {
        Self {
            default_page_size: DEFAULT_PAGE_SIZE,
            max_page_size: DEFAULT_MAX_PAGE_SIZE,
            unknown_attributes: UnknownAttributes::Ignore,
            snapshot_path: None,
        }
    }

    /// Set the default page size
    pub fn default_page_size(mut self, size: usize) -> Self {
        self.default_page_size = size;
        self
    }

    /// Set the maximum page size
    pub fn max_page_size(mut self, size: usize) -> Self {
        self.max_page_size = size;
        self
    }

    /// Reject attribute keys that are not part of the schema
    pub fn strict_attributes(mut self) -> Self {
        self.unknown_attributes = UnknownAttributes::Reject;
        self
    }

    /// Set the snapshot file
    pub fn snapshot_path<P: AsRef<Path>>(mut self, path: P) -> Self {
        self.snapshot_path = Some(path.as_ref().to_path_buf());
        self
    }

    /// Read overrides from `DATASTORE_*` environment variables.
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    fn from_lookup<F: Fn(&str) -> Option<String>>(lookup: F) -> Result<Self> {
        let mut config = Self::new();
        if let Some(raw) = lookup("DATASTORE_DEFAULT_PAGE_SIZE") {
            config.default_page_size = parse_size("DATASTORE_DEFAULT_PAGE_SIZE", &raw)?;
        }
        if let Some(raw) = lookup("DATASTORE_MAX_PAGE_SIZE") {
            config.max_page_size = parse_size("DATASTORE_MAX_PAGE_SIZE", &raw)?;
        }
        if let Some(raw) = lookup("DATASTORE_STRICT_ATTRIBUTES") {
            config.unknown_attributes = match raw.trim().to_ascii_lowercase().as_str() {
                "1" | "true" | "yes" => UnknownAttributes::Reject,
                "0" | "false" | "no" | "" => UnknownAttributes::Ignore,
                other => {
                    return Err(DataStoreError::InvalidConfig(format!(
                        "DATASTORE_STRICT_ATTRIBUTES: expected a boolean, got '{}'",
                        other
                    )));
                }
            };
        }
        if let Some(raw) = lookup("DATASTORE_SNAPSHOT_PATH")
            && !raw.trim().is_empty()
        {
            config.snapshot_path = Some(PathBuf::from(raw.trim()));
        }
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<()> {
        if self.max_page_size == 0 {
            return Err(DataStoreError::InvalidConfig(
                "max page size must be at least 1".to_string(),
            ));
        }
        if self.default_page_size == 0 || self.default_page_size > self.max_page_size {
            return Err(DataStoreError::InvalidConfig(format!(
                "default page size must be between 1 and {}",
                self.max_page_size
            )));
        }
        Ok(())
    }

    /// Apply the default and the ceiling to a caller's page request.
    pub fn normalize(&self, request: PageRequest) -> PageRequest {
        let page_size = match request.page_size {
            0 => self.default_page_size,
            size => size.min(self.max_page_size),
        };
        PageRequest::new(request.page_number, page_size)
    }
}

impl Default for DataStoreConfig {
    fn default() -> Self {
        Self::new()
    }
}

fn parse_size(key: &str, raw: &str) -> Result<usize> {
    raw.trim()
        .parse::<usize>()
        .map_err(|e| DataStoreError::InvalidConfig(format!("{}: {}", key, e)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup(vars: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let vars: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key: &str| vars.get(key).cloned()
    }

    #[test]
    fn test_defaults() {
        let config = DataStoreConfig::from_lookup(lookup(&[])).unwrap();
        assert_eq!(config.default_page_size, DEFAULT_PAGE_SIZE);
        assert_eq!(config.max_page_size, DEFAULT_MAX_PAGE_SIZE);
        assert_eq!(config.unknown_attributes, UnknownAttributes::Ignore);
        assert!(config.snapshot_path.is_none());
    }

    #[test]
    fn test_env_overrides() {
        let config = DataStoreConfig::from_lookup(lookup(&[
            ("DATASTORE_DEFAULT_PAGE_SIZE", "5"),
            ("DATASTORE_MAX_PAGE_SIZE", "50"),
            ("DATASTORE_STRICT_ATTRIBUTES", "true"),
            ("DATASTORE_SNAPSHOT_PATH", "/tmp/ds.snapshot"),
        ]))
        .unwrap();
        assert_eq!(config.default_page_size, 5);
        assert_eq!(config.max_page_size, 50);
        assert_eq!(config.unknown_attributes, UnknownAttributes::Reject);
        assert_eq!(config.snapshot_path, Some(PathBuf::from("/tmp/ds.snapshot")));
    }

    #[test]
    fn test_invalid_values() {
        assert!(DataStoreConfig::from_lookup(lookup(&[("DATASTORE_MAX_PAGE_SIZE", "lots")])).is_err());
        assert!(DataStoreConfig::from_lookup(lookup(&[("DATASTORE_STRICT_ATTRIBUTES", "maybe")])).is_err());
        assert!(DataStoreConfig::from_lookup(lookup(&[("DATASTORE_DEFAULT_PAGE_SIZE", "0")])).is_err());
    }

    #[test]
    fn test_normalize_page_request() {
        let config = DataStoreConfig::new().default_page_size(10).max_page_size(100);
        assert_eq!(config.normalize(PageRequest::new(2, 0)), PageRequest::new(2, 10));
        assert_eq!(config.normalize(PageRequest::new(0, 500)), PageRequest::new(0, 100));
        assert_eq!(config.normalize(PageRequest::new(1, 30)), PageRequest::new(1, 30));
    }
}
