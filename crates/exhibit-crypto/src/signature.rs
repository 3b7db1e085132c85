//! # Signature Service
//!
//! Creates and verifies Ed25519 signatures over hex digests. Every signature
//! carries a [`SignaturePurpose`] tag, and the tag is part of the signed
//! message, so a custody-transfer signature can never pass as an integrity
//! signature.
//!
//! ## Signed Message
//!
//! The bytes signed are the canonical JSON of
//!
//! ```text
//! {"algorithm": "Ed25519", "digest": <hex>, "purpose": <tag>,
//!  "signed_at": <UTC>, "signer_id": <actor>}
//! ```
//!
//! Changing any field, including the digest by a single character,
//! invalidates the signature.
//!
//! ## Key Resolution
//!
//! Signatures embed the signer's public key. Which key verification trusts
//! is decided by a [`KeyResolver`]:
//!
//! - [`EmbeddedKeyResolver`] trusts the embedded key (trust-on-first-use).
//! - [`PinnedKeyResolver`] trusts only keys registered per signer.
//!
//! ## Security Invariant
//!
//! [`SignatureService::verify`] never returns an error. Every cryptographic,
//! encoding or resolution failure answers `false`.

use std::collections::HashMap;
use std::sync::Arc;

use exhibit_core::{is_hex, ActorId, CanonicalBytes, Timestamp};
use serde::{Deserialize, Serialize};

use crate::ed25519::{Ed25519KeyPair, Ed25519PublicKey, Ed25519Signature};
use crate::error::CryptoError;

/// Algorithm identifier recorded in every signature.
pub const ALGORITHM_ED25519: &str = "Ed25519";

/// What a signature attests to. Tags are not interchangeable.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum SignaturePurpose {
    /// Binds a content digest at ingestion.
    IntegrityVerification,
    /// Authorizes one custody hand-off.
    CustodyTransfer,
    /// Issued by a timestamp authority over its token statement.
    TimestampAttestation,
}

impl SignaturePurpose {
    /// Domain tag bound into the signed envelope.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::IntegrityVerification => "INTEGRITY_VERIFICATION",
            Self::CustodyTransfer => "CUSTODY_TRANSFER",
            Self::TimestampAttestation => "TIMESTAMP_ATTESTATION",
        }
    }
}

impl std::fmt::Display for SignaturePurpose {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A purpose-tagged signature over a hex digest.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DigitalSignature {
    pub signature: Ed25519Signature,
    pub algorithm: String,
    /// Public key derived from the signing key at creation.
    pub public_key: Ed25519PublicKey,
    pub signer_id: ActorId,
    pub signed_at: Timestamp,
    pub purpose: SignaturePurpose,
    /// Optional X.509-style chain (PEM text) supplied by stricter deployments.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub certificate_chain: Option<Vec<String>>,
}

#[derive(Serialize)]
struct SignedMessage<'a> {
    algorithm: &'a str,
    digest: &'a str,
    purpose: SignaturePurpose,
    signed_at: Timestamp,
    signer_id: &'a ActorId,
}

fn signed_message(
    digest: &str,
    algorithm: &str,
    purpose: SignaturePurpose,
    signed_at: Timestamp,
    signer_id: &ActorId,
) -> Result<CanonicalBytes, CryptoError> {
    Ok(CanonicalBytes::new(&SignedMessage {
        algorithm,
        digest,
        purpose,
        signed_at,
        signer_id,
    })?)
}

// ── Key resolution ──────────────────────────────────────────────────

/// Decides which public key verification trusts for a signature.
///
/// Implementations must be `Send + Sync`; the service shares one resolver
/// across tasks.
pub trait KeyResolver: Send + Sync {
    /// The key to verify `signature` with, or `None` if the signer is not
    /// trusted.
    fn resolve(&self, signature: &DigitalSignature) -> Option<Ed25519PublicKey>;

    /// Short name for diagnostics.
    fn resolver_name(&self) -> &str;
}

/// Trusts the public key embedded in the signature.
#[derive(Debug, Clone, Copy, Default)]
pub struct EmbeddedKeyResolver;

impl KeyResolver for EmbeddedKeyResolver {
    fn resolve(&self, signature: &DigitalSignature) -> Option<Ed25519PublicKey> {
        Some(signature.public_key)
    }

    fn resolver_name(&self) -> &str {
        "embedded"
    }
}

/// Trusts only keys pinned per signer. Unknown signers never verify, and a
/// signature embedding a different key than the pinned one is rejected.
#[derive(Debug, Clone, Default)]
pub struct PinnedKeyResolver {
    keys: HashMap<ActorId, Ed25519PublicKey>,
}

impl PinnedKeyResolver {
    pub fn new() -> Self {
        Self::default()
    }

    /// Pin `key` for `signer`, replacing any earlier pin.
    pub fn pin(mut self, signer: ActorId, key: Ed25519PublicKey) -> Self {
        self.keys.insert(signer, key);
        self
    }

    pub fn len(&self) -> usize {
        self.keys.len()
    }

    pub fn is_empty(&self) -> bool {
        self.keys.is_empty()
    }
}

impl KeyResolver for PinnedKeyResolver {
    fn resolve(&self, signature: &DigitalSignature) -> Option<Ed25519PublicKey> {
        let pinned = self.keys.get(&signature.signer_id)?;
        (pinned == &signature.public_key).then_some(*pinned)
    }

    fn resolver_name(&self) -> &str {
        "pinned"
    }
}

// ── Service ─────────────────────────────────────────────────────────

/// Signs digests and verifies signatures through a [`KeyResolver`].
#[derive(Clone)]
pub struct SignatureService {
    resolver: Arc<dyn KeyResolver>,
}

impl std::fmt::Debug for SignatureService {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SignatureService")
            .field("resolver", &self.resolver.resolver_name())
            .finish()
    }
}

impl Default for SignatureService {
    fn default() -> Self {
        Self::trust_on_first_use()
    }
}

impl SignatureService {
    pub fn new(resolver: Arc<dyn KeyResolver>) -> Self {
        Self { resolver }
    }

    /// Service that trusts embedded public keys.
    pub fn trust_on_first_use() -> Self {
        Self::new(Arc::new(EmbeddedKeyResolver))
    }

    pub fn resolver(&self) -> &Arc<dyn KeyResolver> {
        &self.resolver
    }

    /// Sign `digest_hex` now.
    pub fn create(
        &self,
        digest_hex: &str,
        key: &Ed25519KeyPair,
        signer_id: &ActorId,
        purpose: SignaturePurpose,
    ) -> Result<DigitalSignature, CryptoError> {
        self.create_at(digest_hex, key, signer_id, purpose, Timestamp::now())
    }

    /// Sign `digest_hex` with an explicit `signed_at`.
    ///
    /// # Errors
    ///
    /// [`CryptoError::InvalidDigest`] if the digest is empty or not hex.
    pub fn create_at(
        &self,
        digest_hex: &str,
        key: &Ed25519KeyPair,
        signer_id: &ActorId,
        purpose: SignaturePurpose,
        signed_at: Timestamp,
    ) -> Result<DigitalSignature, CryptoError> {
        let digest = normalize_digest(digest_hex).ok_or_else(|| {
            CryptoError::InvalidDigest(format!("digest must be non-empty hex, got {digest_hex:?}"))
        })?;
        let message = signed_message(&digest, ALGORITHM_ED25519, purpose, signed_at, signer_id)?;
        Ok(DigitalSignature {
            signature: key.sign(&message),
            algorithm: ALGORITHM_ED25519.to_string(),
            public_key: key.public_key(),
            signer_id: signer_id.clone(),
            signed_at,
            purpose,
            certificate_chain: None,
        })
    }

    /// Whether `signature` was issued over exactly `digest_hex` by a key the
    /// resolver trusts, under the purpose recorded in the signature.
    pub fn verify(&self, digest_hex: &str, signature: &DigitalSignature) -> bool {
        self.check(digest_hex, signature).is_ok()
    }

    /// As [`verify`](Self::verify), and the signature's purpose must be
    /// `expected`.
    pub fn verify_for(
        &self,
        digest_hex: &str,
        signature: &DigitalSignature,
        expected: SignaturePurpose,
    ) -> bool {
        signature.purpose == expected && self.verify(digest_hex, signature)
    }

    fn check(&self, digest_hex: &str, signature: &DigitalSignature) -> Result<(), CryptoError> {
        if signature.algorithm != ALGORITHM_ED25519 {
            return Err(CryptoError::VerificationFailed(format!(
                "unsupported algorithm {}",
                signature.algorithm
            )));
        }
        let digest = normalize_digest(digest_hex)
            .ok_or_else(|| CryptoError::InvalidDigest(digest_hex.to_string()))?;
        let key = self.resolver.resolve(signature).ok_or_else(|| {
            CryptoError::VerificationFailed(format!(
                "{} resolver has no trusted key for {}",
                self.resolver.resolver_name(),
                signature.signer_id
            ))
        })?;
        let message = signed_message(
            &digest,
            &signature.algorithm,
            signature.purpose,
            signature.signed_at,
            &signature.signer_id,
        )?;
        key.verify(&message, &signature.signature)
    }
}

fn normalize_digest(digest_hex: &str) -> Option<String> {
    is_hex(digest_hex).then(|| digest_hex.to_ascii_lowercase())
}

#[cfg(test)]
mod tests {
    use super::*;
    use exhibit_core::sha256_hex;

    fn signer() -> ActorId {
        ActorId::new("examiner-1").unwrap()
    }

    fn digest(data: &[u8]) -> String {
        sha256_hex(data)
    }

    // ── Round trip ──────────────────────────────────────────────────

    #[test]
    fn verifies_the_exact_digest_it_signed() {
        let svc = SignatureService::default();
        let kp = Ed25519KeyPair::generate();
        let d = digest(b"exhibit A");
        let sig = svc
            .create(&d, &kp, &signer(), SignaturePurpose::IntegrityVerification)
            .unwrap();
        assert!(svc.verify(&d, &sig));
        assert_eq!(sig.public_key, kp.public_key());
        assert_eq!(sig.algorithm, "Ed25519");
    }

    #[test]
    fn other_digest_does_not_verify() {
        let svc = SignatureService::default();
        let kp = Ed25519KeyPair::generate();
        let sig = svc
            .create(&digest(b"a"), &kp, &signer(), SignaturePurpose::IntegrityVerification)
            .unwrap();
        assert!(!svc.verify(&digest(b"b"), &sig));
    }

    #[test]
    fn digest_case_is_normalized() {
        let svc = SignatureService::default();
        let kp = Ed25519KeyPair::generate();
        let d = digest(b"case");
        let sig = svc
            .create(&d.to_uppercase(), &kp, &signer(), SignaturePurpose::IntegrityVerification)
            .unwrap();
        assert!(svc.verify(&d, &sig));
    }

    // ── Purpose binding ─────────────────────────────────────────────

    #[test]
    fn purposes_are_not_interchangeable() {
        let svc = SignatureService::default();
        let kp = Ed25519KeyPair::generate();
        let d = digest(b"transfer");
        let sig = svc
            .create(&d, &kp, &signer(), SignaturePurpose::CustodyTransfer)
            .unwrap();
        assert!(svc.verify_for(&d, &sig, SignaturePurpose::CustodyTransfer));
        assert!(!svc.verify_for(&d, &sig, SignaturePurpose::IntegrityVerification));

        let mut relabeled = sig.clone();
        relabeled.purpose = SignaturePurpose::IntegrityVerification;
        assert!(!svc.verify(&d, &relabeled));
    }

    #[test]
    fn altered_metadata_breaks_signature() {
        let svc = SignatureService::default();
        let kp = Ed25519KeyPair::generate();
        let d = digest(b"meta");
        let sig = svc
            .create(&d, &kp, &signer(), SignaturePurpose::IntegrityVerification)
            .unwrap();

        let mut other_signer = sig.clone();
        other_signer.signer_id = ActorId::new("someone-else").unwrap();
        assert!(!svc.verify(&d, &other_signer));

        let mut shifted = sig.clone();
        shifted.signed_at = sig.signed_at.plus_secs(1);
        assert!(!svc.verify(&d, &shifted));

        let mut algo = sig;
        algo.algorithm = "RSA-SHA256".to_string();
        assert!(!svc.verify(&d, &algo));
    }

    // ── Input and failure handling ──────────────────────────────────

    #[test]
    fn create_rejects_non_hex_digest() {
        let svc = SignatureService::default();
        let kp = Ed25519KeyPair::generate();
        for bad in ["", "xyz", "12 34"] {
            assert!(matches!(
                svc.create(bad, &kp, &signer(), SignaturePurpose::IntegrityVerification),
                Err(CryptoError::InvalidDigest(_))
            ));
        }
    }

    #[test]
    fn verify_answers_false_on_garbage_digest() {
        let svc = SignatureService::default();
        let kp = Ed25519KeyPair::generate();
        let sig = svc
            .create(&digest(b"x"), &kp, &signer(), SignaturePurpose::IntegrityVerification)
            .unwrap();
        assert!(!svc.verify("not-a-digest", &sig));
        assert!(!svc.verify("", &sig));
    }

    #[test]
    fn signature_serde_round_trip_still_verifies() {
        let svc = SignatureService::default();
        let kp = Ed25519KeyPair::generate();
        let d = digest(b"serde");
        let sig = svc
            .create(&d, &kp, &signer(), SignaturePurpose::TimestampAttestation)
            .unwrap();
        let json = serde_json::to_string(&sig).unwrap();
        assert!(json.contains("\"TIMESTAMP_ATTESTATION\""));
        assert!(!json.contains("certificate_chain"));
        let back: DigitalSignature = serde_json::from_str(&json).unwrap();
        assert!(svc.verify(&d, &back));
    }

    // ── Key resolvers ───────────────────────────────────────────────

    #[test]
    fn pinned_resolver_accepts_pinned_signer_only() {
        let kp = Ed25519KeyPair::generate();
        let impostor = Ed25519KeyPair::generate();
        let pinned = SignatureService::new(Arc::new(
            PinnedKeyResolver::new().pin(signer(), kp.public_key()),
        ));
        let d = digest(b"pinned");

        let genuine = pinned
            .create(&d, &kp, &signer(), SignaturePurpose::IntegrityVerification)
            .unwrap();
        assert!(pinned.verify(&d, &genuine));

        // Self-consistent signature from a different key under the same name.
        let forged = pinned
            .create(&d, &impostor, &signer(), SignaturePurpose::IntegrityVerification)
            .unwrap();
        assert!(SignatureService::default().verify(&d, &forged));
        assert!(!pinned.verify(&d, &forged));

        let stranger = pinned
            .create(
                &d,
                &kp,
                &ActorId::new("unknown").unwrap(),
                SignaturePurpose::IntegrityVerification,
            )
            .unwrap();
        assert!(!pinned.verify(&d, &stranger));
    }

    #[test]
    fn debug_names_the_resolver() {
        let svc = SignatureService::new(Arc::new(PinnedKeyResolver::new()));
        assert!(format!("{svc:?}").contains("pinned"));
    }
}
