//! Error types for the storage, editor, and export layers.

use thiserror::Error;

/// Result type for storage handle operations.
pub type StoreResult<T> = Result<T, StoreError>;

/// Failures reported by the storage layer.
#[derive(Debug, Error)]
pub enum StoreError {
    /// The handle is not open, is mid-switch, or failed to open.
    #[error("store is not ready")]
    NotReady,

    /// No row exists for the requested key.
    #[error("no record with id '{0}'")]
    NotFound(String),

    /// An insert collided with an existing key.
    #[error("a record with id '{0}' already exists")]
    DuplicateKey(String),

    /// The underlying DuckDB driver failed.
    #[error("store driver error: {0}")]
    Driver(#[from] duckdb::Error),

    /// The database on disk was created by a newer schema version.
    #[error("database '{name}' is at version {existing}, cannot open at version {requested}")]
    VersionDowngrade {
        name: String,
        requested: u32,
        existing: u32,
    },

    /// The store configuration is unusable.
    #[error("invalid store configuration: {0}")]
    InvalidConfig(String),

    /// A stored value could not be encoded or decoded.
    #[error("record serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl StoreError {
    /// Whether this failure came from the driver rather than the handle's own checks.
    pub fn is_driver_error(&self) -> bool {
        matches!(
            self,
            StoreError::Driver(_) | StoreError::VersionDowngrade { .. } | StoreError::Io(_)
        )
    }
}

/// Failures reported by the form editor.
#[derive(Debug, Error)]
pub enum EditorError {
    /// Required fields were left blank.
    #[error("missing required fields: {}", .0.join(", "))]
    MissingFields(Vec<&'static str>),

    /// The answer is not one of A, B, C, D.
    #[error("answer must be one of A, B, C, D (got '{0}')")]
    InvalidAnswer(String),

    #[error(transparent)]
    Store(#[from] StoreError),
}

/// Failures reported by the spreadsheet export.
#[derive(Debug, Error)]
pub enum ExportError {
    /// A row did not serialize to a key/value object.
    #[error("row {0} is not an object")]
    NotAnObject(usize),

    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("spreadsheet error: {0}")]
    Spreadsheet(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}
