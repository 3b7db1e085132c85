//! # Authenticated Encryption (AES-256-GCM)
//!
//! Seals small payloads such as exported proofs or key files. Every call to
//! [`seal`] draws a fresh random 96-bit nonce from the OS CSPRNG and carries
//! it inside the [`SealedBox`]; a key is never used twice with one nonce.
//! Optional associated data is authenticated but not encrypted.

use aes_gcm::aead::{Aead, KeyInit, Payload};
use aes_gcm::{Aes256Gcm, Key, Nonce};
use exhibit_core::{bytes_to_hex, hex_to_bytes};
use rand::RngCore;
use serde::{Deserialize, Serialize};

use crate::error::CryptoError;

pub const ALGORITHM_AES_256_GCM: &str = "AES-256-GCM";

const NONCE_LEN: usize = 12;

/// A 256-bit symmetric key.
#[derive(Clone)]
pub struct EncryptionKey([u8; 32]);

impl EncryptionKey {
    pub fn generate() -> Self {
        let mut key = [0u8; 32];
        rand::rngs::OsRng.fill_bytes(&mut key);
        Self(key)
    }

    pub fn from_bytes(bytes: [u8; 32]) -> Self {
        Self(bytes)
    }

    fn cipher(&self) -> Aes256Gcm {
        Aes256Gcm::new(Key::<Aes256Gcm>::from_slice(&self.0))
    }
}

impl std::fmt::Debug for EncryptionKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "EncryptionKey(<secret>)")
    }
}

/// Ciphertext with the nonce it was sealed under. Hex fields.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SealedBox {
    pub algorithm: String,
    pub nonce: String,
    pub ciphertext: String,
}

/// Encrypt `plaintext` under `key`, authenticating `aad`.
pub fn seal(key: &EncryptionKey, plaintext: &[u8], aad: &[u8]) -> Result<SealedBox, CryptoError> {
    let mut nonce_bytes = [0u8; NONCE_LEN];
    rand::rngs::OsRng.fill_bytes(&mut nonce_bytes);
    let ciphertext = key
        .cipher()
        .encrypt(
            Nonce::from_slice(&nonce_bytes),
            Payload {
                msg: plaintext,
                aad,
            },
        )
        .map_err(|e| CryptoError::Encryption(e.to_string()))?;
    Ok(SealedBox {
        algorithm: ALGORITHM_AES_256_GCM.to_string(),
        nonce: bytes_to_hex(&nonce_bytes),
        ciphertext: bytes_to_hex(&ciphertext),
    })
}

/// Decrypt and authenticate `sealed`.
///
/// # Errors
///
/// [`CryptoError::Decryption`] on a wrong key, wrong `aad`, malformed box or
/// any modification of nonce or ciphertext.
pub fn open(key: &EncryptionKey, sealed: &SealedBox, aad: &[u8]) -> Result<Vec<u8>, CryptoError> {
    if sealed.algorithm != ALGORITHM_AES_256_GCM {
        return Err(CryptoError::Decryption(format!(
            "unsupported algorithm {}",
            sealed.algorithm
        )));
    }
    let nonce = hex_to_bytes(&sealed.nonce).map_err(|e| CryptoError::Decryption(e.to_string()))?;
    if nonce.len() != NONCE_LEN {
        return Err(CryptoError::Decryption(format!(
            "nonce must be {NONCE_LEN} bytes, got {}",
            nonce.len()
        )));
    }
    let ciphertext =
        hex_to_bytes(&sealed.ciphertext).map_err(|e| CryptoError::Decryption(e.to_string()))?;
    key.cipher()
        .decrypt(
            Nonce::from_slice(&nonce),
            Payload {
                msg: &ciphertext,
                aad,
            },
        )
        .map_err(|_| CryptoError::Decryption("authentication failed".to_string()))
}
