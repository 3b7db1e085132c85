//! # Verification Engine
//!
//! Recomputes the fingerprint of the current content and compares it with a
//! stored proof:
//!
//! - **hash match**: recomputed SHA-256 equals the digest the proof's
//!   signature was issued over.
//! - **signature valid**: the proof's signature verifies, as an
//!   `INTEGRITY_VERIFICATION` signature, against the *recomputed* digest.
//! - **timestamp valid**: the token is granted, verified and in bounds now.
//! - **Merkle present**: the proof carries a non-empty Merkle root.
//!
//! [`ScoringPolicy`] turns the checks into a confidence and a verdict. The
//! resulting [`VerificationRecord`] is appended to the proof's history and
//! the proof status mirrors the verdict. Nothing else on the proof changes.

use std::sync::Arc;

use exhibit_core::fingerprint::fingerprint;
use exhibit_core::{ActorId, Clock, DigitalFingerprint, EvidenceId, SystemClock, Timestamp};
use exhibit_crypto::{SignaturePurpose, SignatureService};
use serde::{Deserialize, Serialize};

use crate::error::IntegrityError;
use crate::policy::ScoringPolicy;
use crate::proof::{IntegrityProof, VerificationRecord};
use crate::timestamp::verify_timestamp_at;

/// Method recorded on engine-produced records.
pub const METHOD_RECOMPUTE: &str = "RECOMPUTE_AND_COMPARE";

/// Outcome of the primitive checks shared by verification and tamper checks.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PrimitiveChecks {
    pub hash_match: bool,
    pub signature_valid: bool,
    pub timestamp_valid: bool,
    pub merkle_present: bool,
}

impl PrimitiveChecks {
    pub fn evaluate(
        current: &DigitalFingerprint,
        proof: &IntegrityProof,
        signatures: &SignatureService,
        now: Timestamp,
    ) -> Self {
        Self {
            hash_match: current.sha256 == proof.fingerprint.sha256,
            signature_valid: signatures.verify_for(
                &current.sha256,
                &proof.signature,
                SignaturePurpose::IntegrityVerification,
            ),
            timestamp_valid: verify_timestamp_at(&proof.timestamp, now),
            merkle_present: proof.merkle_root.as_deref().is_some_and(|r| !r.is_empty()),
        }
    }

    fn notes(&self) -> String {
        let mut failed = Vec::new();
        if !self.hash_match {
            failed.push("content digest differs from signed digest");
        }
        if !self.signature_valid {
            failed.push("signature does not verify against current content");
        }
        if !self.timestamp_valid {
            failed.push("timestamp token pending, unverified or out of bounds");
        }
        if !self.merkle_present {
            failed.push("no merkle root on proof");
        }
        if failed.is_empty() {
            "all checks passed".to_string()
        } else {
            failed.join("; ")
        }
    }
}

/// Scores current content against stored proofs.
#[derive(Clone)]
pub struct VerificationEngine {
    signatures: SignatureService,
    policy: ScoringPolicy,
    clock: Arc<dyn Clock>,
}

impl std::fmt::Debug for VerificationEngine {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("VerificationEngine")
            .field("signatures", &self.signatures)
            .field("policy", &self.policy)
            .finish()
    }
}

impl Default for VerificationEngine {
    fn default() -> Self {
        Self::new(SignatureService::default(), Arc::new(SystemClock))
    }
}

impl VerificationEngine {
    pub fn new(signatures: SignatureService, clock: Arc<dyn Clock>) -> Self {
        Self {
            signatures,
            policy: ScoringPolicy::default(),
            clock,
        }
    }

    pub fn with_policy(mut self, policy: ScoringPolicy) -> Self {
        self.policy = policy;
        self
    }

    pub fn policy(&self) -> &ScoringPolicy {
        &self.policy
    }

    /// Score `current` against `proof` without touching the proof.
    pub fn assess(
        &self,
        current: &DigitalFingerprint,
        proof: &IntegrityProof,
        verifier: &ActorId,
    ) -> VerificationRecord {
        let now = self.clock.now();
        let checks = PrimitiveChecks::evaluate(current, proof, &self.signatures, now);
        let confidence = self.policy.confidence(&checks);
        VerificationRecord {
            verifier: verifier.clone(),
            timestamp: now,
            method: METHOD_RECOMPUTE.to_string(),
            result: self.policy.verdict(confidence),
            confidence,
            hash_match: checks.hash_match,
            signature_valid: checks.signature_valid,
            timestamp_valid: checks.timestamp_valid,
            merkle_present: checks.merkle_present,
            notes: checks.notes(),
        }
    }

    /// Fingerprint `current`, score it, append the record to `proof` and
    /// update its status.
    pub fn verify(
        &self,
        evidence_id: &EvidenceId,
        current: &[u8],
        proof: &mut IntegrityProof,
        verifier: &ActorId,
    ) -> Result<VerificationRecord, IntegrityError> {
        let current = fingerprint(current)?;
        self.record(evidence_id, &current, proof, verifier)
    }

    /// As [`verify`](Self::verify), from an already computed fingerprint.
    ///
    /// # Errors
    ///
    /// [`IntegrityError::Input`] if `proof` belongs to another evidence item.
    pub fn record(
        &self,
        evidence_id: &EvidenceId,
        current: &DigitalFingerprint,
        proof: &mut IntegrityProof,
        verifier: &ActorId,
    ) -> Result<VerificationRecord, IntegrityError> {
        if &proof.evidence_id != evidence_id {
            return Err(IntegrityError::Input(format!(
                "proof belongs to {}, not {evidence_id}",
                proof.evidence_id
            )));
        }
        let record = self.assess(current, proof, verifier);
        proof.append_verification(record.clone());
        tracing::info!(
            evidence_id = %evidence_id,
            verifier = %verifier,
            result = ?record.result,
            confidence = record.confidence,
            "evidence verified"
        );
        Ok(record)
    }
}
