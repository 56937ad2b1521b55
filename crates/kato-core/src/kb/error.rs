//! Storage-layer error type, covering all three collaborators.

/// Storage result alias.
pub type Result<T> = std::result::Result<T, StorageError>;

/// Failure modes from the columnar, KV, or ANN collaborators.
#[non_exhaustive]
#[derive(Debug, thiserror::Error)]
pub enum StorageError {
    /// The bundled SQLite-backed collaborator hit a database error.
    #[error("database error: {0}")]
    Database(#[from] rusqlite::Error),
    /// IO error opening or creating the backing store.
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
    /// A stored value failed to (de)serialize.
    #[error("serialization error: {0}")]
    Serde(#[from] serde_json::Error),
    /// The requested `kb_id`/`name` pair does not exist.
    #[error("pattern not found: {kb_id}/{name}")]
    NotFound { kb_id: String, name: String },
    /// Vector dimension did not match the collection's configured dimension.
    #[error("vector dimension mismatch: expected {expected}, got {actual}")]
    DimensionMismatch { expected: usize, actual: usize },
    /// The collaborator could not be reached at all.
    #[error("storage unavailable: {0}")]
    Unavailable(String),
    /// A stored value was present but malformed (e.g. an unparseable
    /// timestamp), distinct from a `Serde` round-trip failure.
    #[error("corrupt stored value: {0}")]
    Corrupt(String),
}
