//! Crate-wide error type
//!
//! Mirrors the error kinds enumerated in the design: observation and STM
//! validation errors surface immediately to the caller, while storage-layer
//! failures are the kinds a caller is expected to retry with bounded backoff
//! before treating them as infrastructure failures.

/// Top-level result alias used across `kato-core`.
pub type Result<T> = std::result::Result<T, KatoError>;

/// All fallible outcomes the core can produce.
///
/// `InvalidObservation`, `StmTooShort`, `PatternNotFound`, `SessionNotFound`,
/// and `SessionExpired` are client-visible and never retried. `StorageUnavailable`,
/// `Timeout`, and `Conflict` are the collaborator-facing kinds a caller retries
/// with bounded exponential backoff before surfacing as an infrastructure error.
#[non_exhaustive]
#[derive(Debug, thiserror::Error)]
pub enum KatoError {
    /// An observation was rejected: empty event, wrong vector dimension, or
    /// an out-of-range emotive value.
    #[error("invalid observation: {0}")]
    InvalidObservation(String),

    /// `learn()` or `get_predictions()` was requested against an STM holding
    /// fewer than two strings in total.
    #[error("STM has fewer than 2 strings total")]
    StmTooShort,

    /// `get_pattern` missed.
    #[error("pattern not found: {0}")]
    PatternNotFound(String),

    /// The session layer has no record of the given session id.
    #[error("session not found: {0}")]
    SessionNotFound(String),

    /// The session existed but its TTL has elapsed.
    #[error("session expired: {0}")]
    SessionExpired(String),

    /// A collaborator (columnar store, KV store, ANN service) could not be
    /// reached. Retried internally with bounded backoff before surfacing.
    #[error("storage unavailable: {0}")]
    StorageUnavailable(String),

    /// A collaborator call exceeded its deadline.
    #[error("timeout: {0}")]
    Timeout(String),

    /// A KV compare-and-swap exhausted its retries. Unreachable under the
    /// documented concurrency model but reserved for completeness.
    #[error("conflict: {0}")]
    Conflict(String),

    /// Lower-level storage failure, wrapped for propagation with `?`.
    #[error("storage error: {0}")]
    Storage(#[from] crate::kb::StorageError),

    /// Serialization failure of a stored value.
    #[error("serialization error: {0}")]
    Serde(#[from] serde_json::Error),
}
