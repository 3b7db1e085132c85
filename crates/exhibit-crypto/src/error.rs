//! # Cryptographic Error Types

use thiserror::Error;

/// Errors from cryptographic operations.
///
/// Signature *verification* never produces one of these at the service level:
/// [`crate::SignatureService::verify`] answers `false` instead.
#[derive(Error, Debug)]
pub enum CryptoError {
    /// The digest to sign is empty or not hex.
    #[error("invalid digest: {0}")]
    InvalidDigest(String),

    /// Invalid Ed25519 public key.
    #[error("invalid Ed25519 public key: {0}")]
    InvalidPublicKey(String),

    /// Invalid Ed25519 signing key material.
    #[error("invalid Ed25519 signing key: {0}")]
    InvalidSigningKey(String),

    /// Malformed Ed25519 signature encoding.
    #[error("invalid Ed25519 signature: {0}")]
    InvalidSignature(String),

    /// Ed25519 signature verification failed.
    #[error("Ed25519 verification failed: {0}")]
    VerificationFailed(String),

    /// The signing envelope could not be canonicalized.
    #[error("canonicalization error: {0}")]
    Canonicalization(#[from] exhibit_core::CanonicalizationError),

    /// Authenticated encryption failed.
    #[error("encryption failed: {0}")]
    Encryption(String),

    /// Authenticated decryption failed (wrong key, nonce, AAD or tampered ciphertext).
    #[error("decryption failed: {0}")]
    Decryption(String),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn display_carries_context() {
        let err = CryptoError::InvalidDigest("not hex".to_string());
        assert!(format!("{err}").contains("not hex"));
        let err = CryptoError::Decryption("tag mismatch".to_string());
        assert!(format!("{err}").contains("tag mismatch"));
    }
}
