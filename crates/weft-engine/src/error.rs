//! Error types for document engines.

use thiserror::Error;

/// Result type for engine operations.
pub type Result<T> = std::result::Result<T, EngineError>;

/// Errors raised by a document engine.
#[derive(Error, Debug)]
#[non_exhaustive]
pub enum EngineError {
    /// Snapshot bytes that do not decode or do not replay into a
    /// consistent history.
    #[error("Corrupt snapshot: {0}")]
    CorruptSnapshot(String),

    /// A local edit request (or a fork clock) that cannot be resolved
    /// against the current document state.
    #[error("Invalid request: {0}")]
    InvalidRequest(String),

    /// A malformed change: failed hash verification, or a reused
    /// actor/sequence slot.
    #[error("Invalid change: {0}")]
    InvalidChange(String),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}
