//! Error types for checkpoint operations

use thiserror::Error;

/// Result type for checkpoint operations
pub type Result<T> = std::result::Result<T, CheckpointError>;

/// Errors that can occur during checkpoint operations
#[derive(Error, Debug)]
pub enum CheckpointError {
    /// No checkpoint exists for the thread
    #[error("Checkpoint not found for thread: {0}")]
    NotFound(String),

    /// Serialization error
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// Storage backend error
    #[error("Storage error: {0}")]
    Storage(String),

    /// Invalid checkpoint or request
    #[error("Invalid checkpoint: {0}")]
    Invalid(String),

    /// I/O error
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl CheckpointError {
    /// Whether this error means the thread has no saved checkpoint
    pub fn is_not_found(&self) -> bool {
        matches!(self, CheckpointError::NotFound(_))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_not_found_is_distinguished() {
        assert!(CheckpointError::NotFound("t1".into()).is_not_found());
        assert!(!CheckpointError::Storage("disk full".into()).is_not_found());

        let io = std::io::Error::new(std::io::ErrorKind::PermissionDenied, "read-only");
        let err: CheckpointError = io.into();
        assert!(err.to_string().contains("read-only"));
    }
}
