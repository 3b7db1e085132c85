//! # Service Error Types
//!
//! [`ServiceError`] aggregates the library errors and adds the outcomes
//! only the service can produce: missing or duplicate items and exceeded
//! deadlines. A failed verification is not an error.

use exhibit_core::CoreError;
use exhibit_evidence::EvidenceError;
use exhibit_integrity::IntegrityError;
use thiserror::Error;

/// Opaque failure of a storage collaborator. Passed through unchanged for
/// caller-driven retry.
#[derive(Error, Debug)]
pub enum StorageError {
    /// The backend failed.
    #[error("storage backend failed during {operation}: {reason}")]
    Backend {
        /// What the service was doing.
        operation: String,
        /// Backend message.
        reason: String,
    },

    /// A stored record could not be encoded or decoded.
    #[error("stored record is malformed: {0}")]
    Serialization(#[from] serde_json::Error),
}

#[derive(Error, Debug)]
pub enum ServiceError {
    /// No evidence or blob with this id.
    #[error("evidence {evidence_id} not found")]
    NotFound {
        /// Evidence identifier.
        evidence_id: String,
    },

    /// Ingestion of an id that already has a proof.
    #[error("evidence {evidence_id} already exists")]
    AlreadyExists {
        /// Evidence identifier.
        evidence_id: String,
    },

    /// The caller deadline passed. No partial result was saved.
    #[error("deadline exceeded during {operation}")]
    DeadlineExceeded {
        /// Step that was running.
        operation: String,
    },

    /// The hashing worker panicked or was cancelled.
    #[error("worker failed: {0}")]
    Worker(String),

    #[error(transparent)]
    Storage(#[from] StorageError),

    #[error(transparent)]
    Integrity(#[from] IntegrityError),

    #[error(transparent)]
    Evidence(#[from] EvidenceError),

    #[error(transparent)]
    Core(#[from] CoreError),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn deadline_names_the_step() {
        let err = ServiceError::DeadlineExceeded {
            operation: "timestamp".to_string(),
        };
        assert_eq!(err.to_string(), "deadline exceeded during timestamp");
    }

    #[test]
    fn storage_errors_pass_through() {
        let err: ServiceError = StorageError::Backend {
            operation: "save".to_string(),
            reason: "disk full".to_string(),
        }
        .into();
        assert!(err.to_string().contains("disk full"));
    }
}
