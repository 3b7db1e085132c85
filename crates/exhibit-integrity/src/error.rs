//! # Integrity Error Types

use exhibit_core::CoreError;
use exhibit_crypto::CryptoError;
use thiserror::Error;

/// Failures of an external timestamp authority.
///
/// Never fatal to proof creation: the builder degrades to a pending token.
#[derive(Error, Debug)]
pub enum TimestampAuthorityError {
    /// The authority could not be reached or refused service.
    #[error("timestamp authority {authority_id} unavailable: {reason}")]
    Unavailable {
        /// Authority identifier.
        authority_id: String,
        /// Transport or service failure.
        reason: String,
    },

    /// The request did not complete within the client timeout.
    #[error("timestamp authority {authority_id} timed out after {timeout_ms}ms")]
    Timeout {
        /// Authority identifier.
        authority_id: String,
        /// Configured timeout.
        timeout_ms: u64,
    },

    /// The authority rejected the request, e.g. a malformed digest.
    #[error("timestamp request rejected: {0}")]
    Rejected(String),

    /// Signing the token statement failed.
    #[error("timestamp signing failed: {0}")]
    Crypto(#[from] CryptoError),
}

/// Errors from proof creation, verification and tamper checks.
///
/// A proof that fails verification is not an error. It is a
/// [`crate::VerificationRecord`] with result `FAILED`.
#[derive(Error, Debug)]
pub enum IntegrityError {
    /// Malformed or inconsistent input, such as verifying a proof against
    /// the wrong evidence id.
    #[error("invalid input: {0}")]
    Input(String),

    /// Fingerprinting or canonicalization failed.
    #[error(transparent)]
    Core(#[from] CoreError),

    /// Signing failed.
    #[error(transparent)]
    Crypto(#[from] CryptoError),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn timeout_message_names_authority_and_budget() {
        let err = TimestampAuthorityError::Timeout {
            authority_id: "tsa-1".to_string(),
            timeout_ms: 250,
        };
        let msg = err.to_string();
        assert!(msg.contains("tsa-1"));
        assert!(msg.contains("250ms"));
    }

    #[test]
    fn core_errors_convert() {
        let err: IntegrityError = CoreError::Input("missing".to_string()).into();
        assert!(matches!(err, IntegrityError::Core(CoreError::Input(_))));
    }
}
