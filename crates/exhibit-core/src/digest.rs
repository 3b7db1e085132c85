//! # Hex Digests
//!
//! All digests in the Exhibit stack are carried as lowercase hex strings:
//! they are compared, concatenated into the fingerprint's `custom_hash`,
//! fed to the Merkle aggregator and signed as text.
//!
//! Two SHA-256 entry points exist on purpose:
//!
//! - [`sha256_hex`] hashes raw evidence content (opaque bytes).
//! - [`sha256_canonical_hex`] hashes structured values, and only accepts
//!   `&CanonicalBytes`.

use sha2::{Digest, Sha256};

use crate::canonical::CanonicalBytes;
use crate::error::CoreError;

/// SHA-256 of raw bytes, as 64 lowercase hex chars.
pub fn sha256_hex(data: &[u8]) -> String {
    bytes_to_hex(&Sha256::digest(data))
}

/// SHA-256 of canonical bytes, as 64 lowercase hex chars.
pub fn sha256_canonical_hex(data: &CanonicalBytes) -> String {
    sha256_hex(data.as_bytes())
}

/// Encode bytes as lowercase hex.
pub fn bytes_to_hex(bytes: &[u8]) -> String {
    bytes.iter().map(|b| format!("{b:02x}")).collect()
}

/// Decode a hex string (either case) into bytes.
///
/// # Errors
///
/// Returns [`CoreError::Input`] on odd length or non-hex characters.
pub fn hex_to_bytes(hex: &str) -> Result<Vec<u8>, CoreError> {
    let hex = hex.trim();
    if hex.len() % 2 != 0 {
        return Err(CoreError::Input(format!(
            "hex string must have even length, got {}",
            hex.len()
        )));
    }
    (0..hex.len())
        .step_by(2)
        .map(|i| {
            hex.get(i..i + 2)
                .and_then(|pair| u8::from_str_radix(pair, 16).ok())
                .ok_or_else(|| CoreError::Input(format!("invalid hex at position {i}")))
        })
        .collect()
}

/// True if `s` is a non-empty string of hex digits.
pub fn is_hex(s: &str) -> bool {
    !s.is_empty() && s.bytes().all(|b| b.is_ascii_hexdigit())
}
