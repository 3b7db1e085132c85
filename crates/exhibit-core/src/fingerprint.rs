//! # Fingerprint Engine
//!
//! Computes the deterministic multi-digest fingerprint of an evidence item.
//!
//! ## Digests
//!
//! | Field           | Input                                   |
//! |-----------------|-----------------------------------------|
//! | `sha256`        | content bytes                           |
//! | `sha1`          | content bytes                           |
//! | `md5`           | content bytes                           |
//! | `crc32`         | content bytes (8 hex chars)             |
//! | `custom_hash`   | SHA-256 of `sha256 ∥ sha1 ∥ md5 ∥ crc32` as hex text |
//! | `metadata_hash` | SHA-256 of canonical JSON of the metadata (`{}` when absent) |
//!
//! SHA-1, MD5 and CRC-32 are interoperability comparators for legacy forensic
//! tooling. Integrity guarantees rest on SHA-256 and the signature over it.
//!
//! ## Security Invariant
//!
//! Identical bytes and metadata always produce identical digests. Only
//! `created_at` differs between runs, and [`DigitalFingerprint::same_digests`]
//! ignores it.

use serde::{Deserialize, Serialize};
use sha1::Sha1;
use sha2::{Digest, Sha256};

use crate::canonical::CanonicalBytes;
use crate::digest::{bytes_to_hex, sha256_canonical_hex, sha256_hex};
use crate::error::CoreError;
use crate::temporal::Timestamp;

/// The multi-algorithm digest set of one evidence item.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DigitalFingerprint {
    /// SHA-256 of the content.
    pub sha256: String,
    /// SHA-1 of the content.
    pub sha1: String,
    /// MD5 of the content.
    pub md5: String,
    /// CRC-32 (IEEE) of the content, 8 lowercase hex chars.
    pub crc32: String,
    /// SHA-256 over the concatenated hex of the four content digests.
    pub custom_hash: String,
    /// SHA-256 of the canonical metadata.
    pub metadata_hash: String,
    /// When this fingerprint was computed. Not part of the digest contract.
    pub created_at: Timestamp,
}

impl DigitalFingerprint {
    /// Compare every digest, ignoring `created_at`.
    pub fn same_digests(&self, other: &DigitalFingerprint) -> bool {
        self.sha256 == other.sha256
            && self.sha1 == other.sha1
            && self.md5 == other.md5
            && self.crc32 == other.crc32
            && self.custom_hash == other.custom_hash
            && self.metadata_hash == other.metadata_hash
    }
}

/// Generate the fingerprint of `content` and optional `metadata`.
///
/// An empty buffer is valid input. A missing buffer is not.
///
/// # Errors
///
/// - [`CoreError::Input`] if `content` is `None`.
/// - [`CoreError::Canonicalization`] if `metadata` cannot be canonicalized.
///   Floats are accepted and hashed in their RFC 8785 form.
pub fn generate(
    content: Option<&[u8]>,
    metadata: Option<&serde_json::Value>,
) -> Result<DigitalFingerprint, CoreError> {
    let content =
        content.ok_or_else(|| CoreError::Input("content buffer is missing".to_string()))?;

    let sha256 = sha256_hex(content);
    let sha1 = bytes_to_hex(&Sha1::digest(content));
    let md5 = format!("{:x}", md5::compute(content));
    let crc32 = format!("{:08x}", crc32fast::hash(content));
    let custom_hash = custom_hash(&sha256, &sha1, &md5, &crc32);
    let metadata_hash = metadata_hash(metadata)?;

    Ok(DigitalFingerprint {
        sha256,
        sha1,
        md5,
        crc32,
        custom_hash,
        metadata_hash,
        created_at: Timestamp::now(),
    })
}

/// Fingerprint of content without metadata.
pub fn fingerprint(content: &[u8]) -> Result<DigitalFingerprint, CoreError> {
    generate(Some(content), None)
}

/// `SHA-256(sha256 ∥ sha1 ∥ md5 ∥ crc32)` over the hex text.
pub fn custom_hash(sha256: &str, sha1: &str, md5: &str, crc32: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(sha256.as_bytes());
    hasher.update(sha1.as_bytes());
    hasher.update(md5.as_bytes());
    hasher.update(crc32.as_bytes());
    bytes_to_hex(&hasher.finalize())
}

fn metadata_hash(metadata: Option<&serde_json::Value>) -> Result<String, CoreError> {
    let empty = serde_json::Value::Object(serde_json::Map::new());
    let canonical = CanonicalBytes::from_metadata(metadata.unwrap_or(&empty))?;
    Ok(sha256_canonical_hex(&canonical))
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn missing_buffer_is_input_error() {
        match generate(None, None) {
            Err(CoreError::Input(msg)) => assert!(msg.contains("missing")),
            other => panic!("expected Input error, got {other:?}"),
        }
    }

    #[test]
    fn empty_buffer_has_known_digests() {
        let fp = fingerprint(b"").unwrap();
        assert_eq!(
            fp.sha256,
            "e3b0c44298fc1c149afbf4c8996fb92427ae41e4649b934ca495991b7852b855"
        );
        assert_eq!(fp.sha1, "da39a3ee5e6b4b0d3255bfef95601890afd80709");
        assert_eq!(fp.md5, "d41d8cd98f00b204e9800998ecf8427e");
        assert_eq!(fp.crc32, "00000000");
    }

    #[test]
    fn known_vectors_for_abc() {
        let fp = fingerprint(b"abc").unwrap();
        assert_eq!(
            fp.sha256,
            "ba7816bf8f01cfea414140de5dae2223b00361a396177a9cb410ff61f20015ad"
        );
        assert_eq!(fp.sha1, "a9993e364706816aba3e25717850c26c9cd0d89d");
        assert_eq!(fp.md5, "900150983cd24fb0d6963f7d28e17f72");
        assert_eq!(fp.crc32, "352441c2");
    }

    #[test]
    fn custom_hash_is_function_of_content_digests() {
        let fp = fingerprint(b"exhibit A").unwrap();
        assert_eq!(
            fp.custom_hash,
            custom_hash(&fp.sha256, &fp.sha1, &fp.md5, &fp.crc32)
        );
    }

    #[test]
    fn absent_metadata_hashes_as_empty_object() {
        let without = fingerprint(b"x").unwrap();
        let with_empty = generate(Some(b"x".as_slice()), Some(&json!({}))).unwrap();
        assert_eq!(without.metadata_hash, with_empty.metadata_hash);
        assert_eq!(
            without.metadata_hash,
            "44136fa355b3678a1146ad16f7e8649e94fb4fc21fe77e8310c060f61caaff8a"
        );
    }

    #[test]
    fn metadata_key_order_does_not_matter() {
        let a = generate(Some(b"x".as_slice()), Some(&json!({"case": "CR-1", "source": "phone"}))).unwrap();
        let b = generate(Some(b"x".as_slice()), Some(&json!({"source": "phone", "case": "CR-1"}))).unwrap();
        assert!(a.same_digests(&b));
    }

    #[test]
    fn metadata_changes_only_metadata_hash() {
        let a = generate(Some(b"x".as_slice()), Some(&json!({"case": "CR-1"}))).unwrap();
        let b = generate(Some(b"x".as_slice()), Some(&json!({"case": "CR-2"}))).unwrap();
        assert_eq!(a.sha256, b.sha256);
        assert_eq!(a.custom_hash, b.custom_hash);
        assert_ne!(a.metadata_hash, b.metadata_hash);
    }

    #[test]
    fn float_metadata_hashes_deterministically() {
        let a = generate(
            Some(b"photo".as_slice()),
            Some(&json!({"gps_lat": 40.7128, "gps_lon": -74.006})),
        )
        .expect("gps metadata fingerprints");
        let b = generate(
            Some(b"photo".as_slice()),
            Some(&json!({"gps_lon": -74.006, "gps_lat": 40.7128})),
        )
        .expect("gps metadata fingerprints");
        assert_eq!(a.metadata_hash, b.metadata_hash);

        let moved = generate(Some(b"photo".as_slice()), Some(&json!({"gps_lat": 40.7129}))).unwrap();
        assert_ne!(a.metadata_hash, moved.metadata_hash);
    }

    #[test]
    fn single_byte_flip_changes_every_content_digest() {
        let a = fingerprint(b"chain of custody").unwrap();
        let b = fingerprint(b"chain of custodY").unwrap();
        assert_ne!(a.sha256, b.sha256);
        assert_ne!(a.sha1, b.sha1);
        assert_ne!(a.md5, b.md5);
        assert_ne!(a.crc32, b.crc32);
        assert_ne!(a.custom_hash, b.custom_hash);
    }
}
