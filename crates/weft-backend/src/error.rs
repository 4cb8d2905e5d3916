//! Error types for backend handle operations.

use thiserror::Error;
use weft_engine::EngineError;

/// Result type for backend operations.
pub type Result<T> = std::result::Result<T, BackendError>;

/// Errors surfaced by the backend handle layer.
#[derive(Error, Debug)]
#[non_exhaustive]
pub enum BackendError {
    /// The handle was superseded by a mutating operation or freed. Using
    /// it again is a caller bug, not a recoverable condition.
    #[error(
        "Attempting to use an outdated document handle that has already been \
         updated or freed. Use the handle returned by the last mutating \
         operation, or call try_clone() if you really need to keep working \
         with this old document state."
    )]
    StaleHandle,

    /// Engine errors pass through unchanged.
    #[error(transparent)]
    Engine(#[from] EngineError),
}

impl BackendError {
    /// Check if this is a use of a superseded or freed handle.
    #[inline]
    #[must_use]
    pub fn is_stale(&self) -> bool {
        matches!(self, BackendError::StaleHandle)
    }

    /// Check if this came from undecodable snapshot bytes.
    #[inline]
    #[must_use]
    pub fn is_corrupt_snapshot(&self) -> bool {
        matches!(self, BackendError::Engine(EngineError::CorruptSnapshot(_)))
    }

    /// Check if this came from an unresolvable local edit request.
    #[inline]
    #[must_use]
    pub fn is_invalid_request(&self) -> bool {
        matches!(self, BackendError::Engine(EngineError::InvalidRequest(_)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_stale_message_names_the_remedies() {
        let msg = BackendError::StaleHandle.to_string();
        assert!(msg.contains("returned by the last mutating operation"));
        assert!(msg.contains("try_clone()"));
    }

    #[test]
    fn test_is_stale() {
        assert!(BackendError::StaleHandle.is_stale());
        let err: BackendError = EngineError::InvalidRequest("nope".into()).into();
        assert!(!err.is_stale());
    }

    #[test]
    fn test_engine_errors_pass_through_unchanged() {
        let err: BackendError = EngineError::CorruptSnapshot("truncated".into()).into();
        assert!(err.is_corrupt_snapshot());
        assert_eq!(err.to_string(), "Corrupt snapshot: truncated");
    }

    #[test]
    fn test_is_invalid_request() {
        let err: BackendError = EngineError::InvalidRequest("no such key".into()).into();
        assert!(err.is_invalid_request());
        assert!(!err.is_corrupt_snapshot());
    }
}
