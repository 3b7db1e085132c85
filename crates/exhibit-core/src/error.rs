//! # Error Types
//!
//! Errors raised by the foundational layer. Everything here is a usage error:
//! the caller handed over malformed input, and retrying with the same input
//! cannot succeed.

use thiserror::Error;

/// Top-level error type for `exhibit-core`.
#[derive(Error, Debug)]
pub enum CoreError {
    /// Malformed or missing input (a caller bug, not retried).
    #[error("input error: {0}")]
    Input(String),

    /// Canonicalization failed.
    #[error("canonicalization error: {0}")]
    Canonicalization(#[from] CanonicalizationError),
}

/// Error during canonical serialization.
#[derive(Error, Debug)]
pub enum CanonicalizationError {
    /// Float values are not permitted in canonical representations.
    #[error("float values are not permitted in canonical representations: {0}")]
    FloatRejected(f64),

    /// JSON serialization failed.
    #[error("serialization failed: {0}")]
    SerializationFailed(#[from] serde_json::Error),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn input_error_display() {
        let err = CoreError::Input("content buffer is missing".to_string());
        assert_eq!(format!("{err}"), "input error: content buffer is missing");
    }

    #[test]
    fn canonicalization_error_converts() {
        let err: CoreError = CanonicalizationError::FloatRejected(2.5).into();
        assert!(format!("{err}").contains("2.5"));
    }
}
