use thiserror::Error;

#[derive(Error, Debug)]
pub enum DataStoreError {
    #[error("Schema '{0}' not found")]
    SchemaNotFound(String),

    #[error("Schema '{0}' already exists")]
    DuplicateSchema(String),

    #[error("Schema '{name}' is still used by {records} record(s)")]
    SchemaInUse { name: String, records: usize },

    #[error("Invalid schema: {0}")]
    InvalidSchema(String),

    #[error("Attribute '{attribute}' is required by schema '{entity}'")]
    MissingRequiredAttribute { entity: String, attribute: String },

    #[error("Record of schema '{0}' has no name")]
    MissingName(String),

    #[error("Attribute '{attribute}' expects type {expected}, got {found}")]
    TypeMismatch {
        attribute: String,
        expected: String,
        found: String,
    },

    #[error("Attribute '{attribute}' is not defined by schema '{entity}'")]
    UnknownAttribute { entity: String, attribute: String },

    #[error("Record '{name}' already exists in '{kind}'")]
    DuplicateRecord { kind: String, name: String },

    #[error("Record '{name}' not found in '{kind}'")]
    RecordNotFound { kind: String, name: String },

    #[error("Validation error: {0}")]
    ValidationError(String),

    #[error("Invalid page request: {0}")]
    InvalidPageRequest(String),

    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    #[error("Codec error: {0}")]
    Codec(String),

    #[error("Storage error: {0}")]
    Storage(String),

    #[error("Lock error: {0}")]
    LockError(String),
}

impl DataStoreError {
    /// True when the failure was caused by the caller's input rather than
    /// by the backend or the process state.
    pub fn is_client_error(&self) -> bool {
        !matches!(
            self,
            Self::Codec(_) | Self::Storage(_) | Self::LockError(_) | Self::InvalidConfig(_)
        )
    }
}

pub type Result<T> = std::result::Result<T, DataStoreError>;

impl<T> From<std::sync::PoisonError<T>> for DataStoreError {
    fn from(err: std::sync::PoisonError<T>) -> Self {
        Self::LockError(err.to_string())
    }
}

impl From<rmp_serde::encode::Error> for DataStoreError {
    fn from(err: rmp_serde::encode::Error) -> Self {
        Self::Codec(err.to_string())
    }
}

impl From<rmp_serde::decode::Error> for DataStoreError {
    fn from(err: rmp_serde::decode::Error) -> Self {
        Self::Codec(err.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_client_error_classification() {
        assert!(DataStoreError::SchemaNotFound("Book".into()).is_client_error());
        assert!(
            DataStoreError::DuplicateRecord {
                kind: "Book".into(),
                name: "b1".into(),
            }
            .is_client_error()
        );
        assert!(!DataStoreError::Storage("disk full".into()).is_client_error());
        assert!(!DataStoreError::LockError("poisoned".into()).is_client_error());
    }

    #[test]
    fn test_poison_error_maps_to_lock_error() {
        let lock = std::sync::Mutex::new(0);
        let _ = std::panic::catch_unwind(|| {
            let _guard = lock.lock().unwrap();
            panic!("poison");
        });
        let err: DataStoreError = lock.lock().unwrap_err().into();
        assert!(matches!(err, DataStoreError::LockError(_)));
    }
}
