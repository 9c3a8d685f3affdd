//! Cache error types.

use thiserror::Error;

/// Errors that can occur when using the key-value store.
#[derive(Error, Debug)]
pub enum CacheError {
    /// Filesystem access failed.
    #[error("I/O error on {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },

    /// Failed to serialize or deserialize a value.
    #[error("Serialization error: {0}")]
    Serialize(#[from] serde_json::Error),

    /// The backend rejected the operation.
    #[error("Store operation failed: {0}")]
    Store(String),

    /// Key cannot be used with this backend.
    #[error("Invalid key: {0:?}")]
    InvalidKey(String),
}

impl CacheError {
    pub(crate) fn io(path: impl Into<String>, source: std::io::Error) -> Self {
        CacheError::Io {
            path: path.into(),
            source,
        }
    }
}
