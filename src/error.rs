//! Error types for the Elasticsearch storage layer.

use thiserror::Error;

/// The primary error type for all storage operations.
#[derive(Error, Debug)]
pub enum StorageError {
    /// A list-options field referenced a construct this compiler cannot
    /// translate (e.g. a list-indexed field-selector path).
    #[error("invalid argument: {0}")]
    InvalidArgument(String),

    /// `Get` found zero matching documents.
    #[error("key not found: {key} (resourceVersion {resource_version})")]
    NotFound { key: String, resource_version: u64 },

    /// The operation is not implemented by this storage layer.
    #[error("method not supported: {0}")]
    MethodNotSupported(String),

    /// The backend returned a non-2xx response.
    #[error("backend error (status {status}): {body}")]
    Backend { status: u16, body: String },

    /// A document could not be (de)serialized.
    #[error("decode error: {0}")]
    Decode(#[from] serde_json::Error),

    /// A hit could not be decoded into the expected list element type, or
    /// another invariant the caller depends on was violated.
    #[error("internal error: {0}")]
    Internal(String),
}

impl From<elasticsearch::Error> for StorageError {
    fn from(err: elasticsearch::Error) -> Self {
        StorageError::Internal(err.to_string())
    }
}

/// Convenience alias used throughout this crate.
pub type StorageResult<T> = Result<T, StorageError>;
