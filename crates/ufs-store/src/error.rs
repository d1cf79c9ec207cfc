//! Error types for the ufs-store crate

use thiserror::Error;

/// Result type alias using `StoreError`
pub type Result<T> = std::result::Result<T, StoreError>;

/// Errors that can occur during store operations
#[derive(Error, Debug)]
pub enum StoreError {
    /// No catalog entry for the file id
    #[error("file not found: {0}")]
    FileNotFound(String),

    /// Catalog entry exists but the backend holds no bytes for it
    #[error("no stored content for file: {0}")]
    ContentNotFound(String),

    /// Catalog entry already exists
    #[error("file already exists: {0}")]
    AlreadyExists(String),

    /// Requested range does not fit the stored content
    #[error("range {start}-{end} outside of {size} stored bytes")]
    RangeOutOfBounds { start: u64, end: u64, size: u64 },

    /// A store hook is registered with the wrong shape
    #[error("invalid hook configuration: {0}")]
    InvalidHook(String),

    /// Catalog backend failure
    #[error("catalog error: {0}")]
    Catalog(String),

    /// Serialization error
    #[error("serialization error: {0}")]
    Serialization(String),

    /// IO error
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
}

impl From<serde_json::Error> for StoreError {
    fn from(err: serde_json::Error) -> Self {
        StoreError::Serialization(err.to_string())
    }
}
