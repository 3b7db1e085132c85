//! # Integrity Proofs
//!
//! An [`IntegrityProof`] is created once, at ingestion, and binds:
//!
//! 1. the content fingerprint,
//! 2. an `INTEGRITY_VERIFICATION` signature over the fingerprint's SHA-256,
//! 3. a timestamp token (possibly `PENDING`),
//! 4. the Merkle root of `[sha256, sha1, md5, metadata_hash]`,
//! 5. optionally, an entry in the local [`CommitmentLog`].
//!
//! ## Security Invariant
//!
//! Proofs are never deleted. After creation only the verification history
//! (append-only) and the status change, and only through the verification
//! engine. Neither is writable from outside this crate.

use std::sync::Arc;

use exhibit_core::fingerprint::generate;
use exhibit_core::{ActorId, Clock, DigitalFingerprint, EvidenceId, Timestamp};
use exhibit_crypto::merkle::{calculate_root, PROOF_FORMAT_VERSION};
use exhibit_crypto::{DigitalSignature, Ed25519KeyPair, SignaturePurpose, SignatureService};
use serde::{Deserialize, Serialize};

use crate::commitment::{CommitmentLog, ProofCommitment};
use crate::error::IntegrityError;
use crate::timestamp::{TimestampClient, TimestampToken};

/// Status of a proof, mirroring its latest verification.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum VerificationStatus {
    Valid,
    Invalid,
    Expired,
    Pending,
    Compromised,
}

/// Verdict of one verification.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum VerificationResult {
    Verified,
    Inconclusive,
    Failed,
}

impl VerificationResult {
    /// Wire name, as serialized and written to the audit trail.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Verified => "VERIFIED",
            Self::Inconclusive => "INCONCLUSIVE",
            Self::Failed => "FAILED",
        }
    }

    /// Proof status implied by this verdict.
    pub fn status(&self) -> VerificationStatus {
        match self {
            Self::Verified => VerificationStatus::Valid,
            Self::Inconclusive => VerificationStatus::Pending,
            Self::Failed => VerificationStatus::Compromised,
        }
    }
}

/// One immutable entry of a proof's verification history.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct VerificationRecord {
    pub verifier: ActorId,
    pub timestamp: Timestamp,
    pub method: String,
    pub result: VerificationResult,
    /// 0 to 100.
    pub confidence: u8,
    pub hash_match: bool,
    pub signature_valid: bool,
    pub timestamp_valid: bool,
    pub merkle_present: bool,
    pub notes: String,
}

/// Integrity proof of one evidence item.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct IntegrityProof {
    pub evidence_id: EvidenceId,
    pub fingerprint: DigitalFingerprint,
    pub signature: DigitalSignature,
    pub timestamp: TimestampToken,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub merkle_root: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub commitment: Option<ProofCommitment>,
    verification_history: Vec<VerificationRecord>,
    verification_status: VerificationStatus,
    pub created_at: Timestamp,
    pub format_version: u32,
}

impl IntegrityProof {
    pub fn verification_history(&self) -> &[VerificationRecord] {
        &self.verification_history
    }

    pub fn verification_status(&self) -> VerificationStatus {
        self.verification_status
    }

    pub fn latest_verification(&self) -> Option<&VerificationRecord> {
        self.verification_history.last()
    }

    /// The Merkle root recomputed from the stored fingerprint.
    pub fn expected_merkle_root(&self) -> String {
        proof_merkle_root(&self.fingerprint)
    }

    pub(crate) fn append_verification(&mut self, record: VerificationRecord) {
        self.verification_status = record.result.status();
        self.verification_history.push(record);
    }
}

/// Root over the fingerprint fields in proof-format order.
pub fn proof_merkle_root(fp: &DigitalFingerprint) -> String {
    calculate_root(&[
        fp.sha256.as_str(),
        fp.sha1.as_str(),
        fp.md5.as_str(),
        fp.metadata_hash.as_str(),
    ])
}

// ── Builder ─────────────────────────────────────────────────────────

/// Composes fingerprint, signature, timestamp and Merkle root into a proof.
#[derive(Debug, Clone)]
pub struct ProofBuilder {
    signatures: SignatureService,
    timestamps: TimestampClient,
    commitments: Option<Arc<CommitmentLog>>,
}

impl ProofBuilder {
    pub fn new(signatures: SignatureService, timestamps: TimestampClient) -> Self {
        Self {
            signatures,
            timestamps,
            commitments: None,
        }
    }

    /// Also commit every proof's Merkle root to `log`.
    pub fn with_commitment_log(mut self, log: Arc<CommitmentLog>) -> Self {
        self.commitments = Some(log);
        self
    }

    pub fn timestamps(&self) -> &TimestampClient {
        &self.timestamps
    }

    pub fn clock(&self) -> &Arc<dyn Clock> {
        self.timestamps.clock()
    }

    /// Build the proof for `content` without metadata.
    pub async fn create_proof(
        &self,
        evidence_id: &EvidenceId,
        content: &[u8],
        key: &Ed25519KeyPair,
        signer_id: &ActorId,
    ) -> Result<IntegrityProof, IntegrityError> {
        self.create_proof_with_metadata(evidence_id, content, None, key, signer_id)
            .await
    }

    /// Build the proof for `content` and `metadata`.
    ///
    /// A failing timestamp authority yields a `PENDING` token, never an error.
    pub async fn create_proof_with_metadata(
        &self,
        evidence_id: &EvidenceId,
        content: &[u8],
        metadata: Option<&serde_json::Value>,
        key: &Ed25519KeyPair,
        signer_id: &ActorId,
    ) -> Result<IntegrityProof, IntegrityError> {
        let fingerprint = generate(Some(content), metadata)?;
        let token = self.timestamps.request_or_pending(&fingerprint.sha256).await;
        self.assemble(evidence_id, fingerprint, token, key, signer_id)
    }

    /// Sign and seal a proof from an already computed fingerprint and token.
    pub fn assemble(
        &self,
        evidence_id: &EvidenceId,
        fingerprint: DigitalFingerprint,
        timestamp: TimestampToken,
        key: &Ed25519KeyPair,
        signer_id: &ActorId,
    ) -> Result<IntegrityProof, IntegrityError> {
        let now = self.clock().now();
        let signature = self.signatures.create_at(
            &fingerprint.sha256,
            key,
            signer_id,
            SignaturePurpose::IntegrityVerification,
            now,
        )?;
        let merkle_root = proof_merkle_root(&fingerprint);
        let commitment = match &self.commitments {
            Some(log) => Some(log.commit(&merkle_root, now)?),
            None => None,
        };

        tracing::debug!(
            evidence_id = %evidence_id,
            sha256 = %fingerprint.sha256,
            timestamp_pending = timestamp.is_pending(),
            "integrity proof assembled"
        );

        Ok(IntegrityProof {
            evidence_id: evidence_id.clone(),
            fingerprint,
            signature,
            timestamp,
            merkle_root: Some(merkle_root),
            commitment,
            verification_history: Vec::new(),
            verification_status: VerificationStatus::Valid,
            created_at: now,
            format_version: PROOF_FORMAT_VERSION,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::TimestampAuthorityError;
    use crate::timestamp::{LocalTimestampAuthority, TimestampAuthority, TokenStatus};
    use async_trait::async_trait;
    use exhibit_core::FixedClock;
    use std::time::Duration;

    struct Offline;

    #[async_trait]
    impl TimestampAuthority for Offline {
        async fn request_timestamp(
            &self,
            _digest_hex: &str,
        ) -> Result<TimestampToken, TimestampAuthorityError> {
            Err(TimestampAuthorityError::Unavailable {
                authority_id: "offline".to_string(),
                reason: "dns failure".to_string(),
            })
        }

        fn authority_id(&self) -> &str {
            "offline"
        }
    }

    fn now() -> Timestamp {
        Timestamp::parse("2026-05-04T09:30:00Z").unwrap()
    }

    fn builder(authority: Arc<dyn TimestampAuthority>) -> ProofBuilder {
        let clock: Arc<dyn Clock> = Arc::new(FixedClock(now()));
        ProofBuilder::new(
            SignatureService::default(),
            TimestampClient::new(authority, Duration::from_secs(2)).with_clock(clock),
        )
    }

    fn local_tsa() -> Arc<dyn TimestampAuthority> {
        Arc::new(LocalTimestampAuthority::new(
            "tsa",
            Ed25519KeyPair::generate(),
            Arc::new(FixedClock(now())),
        ))
    }

    #[tokio::test]
    async fn fresh_proof_is_valid_with_empty_history() {
        let key = Ed25519KeyPair::generate();
        let id = EvidenceId::new("EV-1").unwrap();
        let signer = ActorId::new("intake").unwrap();
        let proof = builder(local_tsa())
            .create_proof(&id, b"photo bytes", &key, &signer)
            .await
            .unwrap();

        assert_eq!(proof.evidence_id, id);
        assert_eq!(proof.verification_status(), VerificationStatus::Valid);
        assert!(proof.verification_history().is_empty());
        assert_eq!(proof.format_version, 1);
        assert_eq!(proof.created_at, now());
        assert_eq!(proof.timestamp.status, TokenStatus::Granted);
        assert_eq!(proof.signature.purpose, SignaturePurpose::IntegrityVerification);
        assert!(SignatureService::default().verify(&proof.fingerprint.sha256, &proof.signature));
        assert!(proof.commitment.is_none());
    }

    #[tokio::test]
    async fn merkle_root_follows_fixed_order() {
        let key = Ed25519KeyPair::generate();
        let proof = builder(local_tsa())
            .create_proof(
                &EvidenceId::new("EV-2").unwrap(),
                b"doc",
                &key,
                &ActorId::new("intake").unwrap(),
            )
            .await
            .unwrap();
        let fp = &proof.fingerprint;
        let expected = calculate_root(&[
            fp.sha256.clone(),
            fp.sha1.clone(),
            fp.md5.clone(),
            fp.metadata_hash.clone(),
        ]);
        assert_eq!(proof.merkle_root.as_deref(), Some(expected.as_str()));
        assert_eq!(proof.expected_merkle_root(), expected);
    }

    #[tokio::test]
    async fn authority_outage_degrades_to_pending() {
        let key = Ed25519KeyPair::generate();
        let proof = builder(Arc::new(Offline))
            .create_proof(
                &EvidenceId::new("EV-3").unwrap(),
                b"audio",
                &key,
                &ActorId::new("intake").unwrap(),
            )
            .await
            .unwrap();
        assert!(proof.timestamp.is_pending());
        assert_eq!(proof.verification_status(), VerificationStatus::Valid);
    }

    #[tokio::test]
    async fn commitment_log_records_root() {
        let log = Arc::new(CommitmentLog::new());
        let key = Ed25519KeyPair::generate();
        let proof = builder(local_tsa())
            .with_commitment_log(Arc::clone(&log))
            .create_proof(
                &EvidenceId::new("EV-4").unwrap(),
                b"video",
                &key,
                &ActorId::new("intake").unwrap(),
            )
            .await
            .unwrap();
        let commitment = proof.commitment.as_ref().unwrap();
        let root = proof.merkle_root.as_deref().unwrap();
        assert!(log.verify(commitment, root));
        assert_eq!(log.len(), 1);
    }

    #[tokio::test]
    async fn gps_metadata_is_bound_into_the_fingerprint() {
        let key = Ed25519KeyPair::generate();
        let meta = serde_json::json!({"gps": 51.5, "heading": -0.25});
        let proof = builder(local_tsa())
            .create_proof_with_metadata(
                &EvidenceId::new("EV-5").unwrap(),
                b"x",
                Some(&meta),
                &key,
                &ActorId::new("intake").unwrap(),
            )
            .await
            .expect("float metadata is accepted");
        let expected = exhibit_core::fingerprint::generate(Some(b"x".as_slice()), Some(&meta)).unwrap();
        assert_eq!(proof.fingerprint.metadata_hash, expected.metadata_hash);
    }

    #[test]
    fn verdicts_map_to_statuses() {
        assert_eq!(VerificationResult::Verified.status(), VerificationStatus::Valid);
        assert_eq!(VerificationResult::Inconclusive.status(), VerificationStatus::Pending);
        assert_eq!(VerificationResult::Failed.status(), VerificationStatus::Compromised);
    }
}
