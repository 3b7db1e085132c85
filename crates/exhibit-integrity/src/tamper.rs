//! # Tamper Detector
//!
//! A forensic sweep independent of verification. It runs the same primitive
//! checks but reports each failure as a severity-scored [`TamperIndicator`]:
//!
//! | Indicator | Trigger | Severity | Confidence |
//! |---|---|---|---|
//! | `HASH_MISMATCH` | content digest differs from the proof | CRITICAL | 95 |
//! | `TIMESTAMP_ANOMALY` | token dated after the check time | HIGH | 90 |
//! | `SIGNATURE_INVALID` | signature fails on current content | CRITICAL | 98 |
//! | `MERKLE_ROOT_MISMATCH` | stored root differs from the fingerprint's root | HIGH | 85 |
//!
//! Every check yields a new immutable [`TamperCheck`]. The proof is only
//! read. A detected tamper flags the item for investigation under a freshly
//! minted investigation id.

use std::sync::Arc;

use exhibit_core::fingerprint::fingerprint;
use exhibit_core::{ActorId, Clock, DigitalFingerprint, EvidenceId, SystemClock, Timestamp};
use exhibit_crypto::SignatureService;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::IntegrityError;
use crate::policy::ScoringPolicy;
use crate::proof::IntegrityProof;
use crate::verification::PrimitiveChecks;

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Severity {
    Low,
    Medium,
    High,
    Critical,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum IndicatorType {
    HashMismatch,
    TimestampAnomaly,
    SignatureInvalid,
    MerkleRootMismatch,
}

/// Why a check ran.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum CheckType {
    Scheduled,
    OnAccess,
    Manual,
    PreTransfer,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TamperIndicator {
    pub indicator_type: IndicatorType,
    pub severity: Severity,
    pub description: String,
    /// What was observed, e.g. expected and actual digests.
    pub evidence: String,
    /// 0 to 100.
    pub confidence: u8,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "SCREAMING_SNAKE_CASE")]
pub enum TamperAction {
    None,
    FlaggedForInvestigation { investigation_id: String },
}

/// Result of one check. Never mutated after creation and kept for audit
/// independently of the evidence it references.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TamperCheck {
    pub id: String,
    pub evidence_id: EvidenceId,
    pub check_type: CheckType,
    pub checked_by: ActorId,
    pub checked_at: Timestamp,
    pub tamper_detected: bool,
    pub indicators: Vec<TamperIndicator>,
    /// 0 to 100.
    pub integrity_score: u8,
    pub action_taken: TamperAction,
}

/// Runs tamper checks.
#[derive(Clone)]
pub struct TamperDetector {
    signatures: SignatureService,
    policy: ScoringPolicy,
    clock: Arc<dyn Clock>,
}

impl std::fmt::Debug for TamperDetector {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TamperDetector")
            .field("signatures", &self.signatures)
            .field("policy", &self.policy)
            .finish()
    }
}

impl Default for TamperDetector {
    fn default() -> Self {
        Self::new(SignatureService::default(), Arc::new(SystemClock))
    }
}

impl TamperDetector {
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

    /// Fingerprint `current` and check it against `proof`.
    pub fn perform_check(
        &self,
        evidence_id: &EvidenceId,
        current: &[u8],
        proof: &IntegrityProof,
        checked_by: &ActorId,
        check_type: CheckType,
    ) -> Result<TamperCheck, IntegrityError> {
        let current = fingerprint(current)?;
        self.inspect(evidence_id, &current, proof, checked_by, check_type)
    }

    /// As [`perform_check`](Self::perform_check), from an already computed
    /// fingerprint.
    pub fn inspect(
        &self,
        evidence_id: &EvidenceId,
        current: &DigitalFingerprint,
        proof: &IntegrityProof,
        checked_by: &ActorId,
        check_type: CheckType,
    ) -> Result<TamperCheck, IntegrityError> {
        if &proof.evidence_id != evidence_id {
            return Err(IntegrityError::Input(format!(
                "proof belongs to {}, not {evidence_id}",
                proof.evidence_id
            )));
        }
        let checked_at = self.clock.now();
        let indicators = self.indicators(current, proof, checked_at);
        let integrity_score = self.policy.integrity_score(&indicators);
        let tamper_detected = !indicators.is_empty();

        let action_taken = if tamper_detected {
            let investigation_id = format!("INV-{}", Uuid::new_v4());
            tracing::warn!(
                evidence_id = %evidence_id,
                integrity_score,
                indicators = indicators.len(),
                investigation_id = %investigation_id,
                "tamper indicators found, flagged for investigation"
            );
            TamperAction::FlaggedForInvestigation { investigation_id }
        } else {
            TamperAction::None
        };

        Ok(TamperCheck {
            id: Uuid::new_v4().to_string(),
            evidence_id: evidence_id.clone(),
            check_type,
            checked_by: checked_by.clone(),
            checked_at,
            tamper_detected,
            indicators,
            integrity_score,
            action_taken,
        })
    }

    fn indicators(
        &self,
        current: &DigitalFingerprint,
        proof: &IntegrityProof,
        checked_at: Timestamp,
    ) -> Vec<TamperIndicator> {
        let checks = PrimitiveChecks::evaluate(current, proof, &self.signatures, checked_at);
        let mut found = Vec::new();

        if !checks.hash_match {
            found.push(TamperIndicator {
                indicator_type: IndicatorType::HashMismatch,
                severity: Severity::Critical,
                description: "content digest differs from the digest recorded at ingestion"
                    .to_string(),
                evidence: format!(
                    "expected sha256 {}, found {}",
                    proof.fingerprint.sha256, current.sha256
                ),
                confidence: 95,
            });
        }

        if proof.timestamp.timestamp > checked_at {
            found.push(TamperIndicator {
                indicator_type: IndicatorType::TimestampAnomaly,
                severity: Severity::High,
                description: "timestamp token is dated after the check".to_string(),
                evidence: format!(
                    "token {} from {}, checked at {checked_at}",
                    proof.timestamp.timestamp, proof.timestamp.authority_id
                ),
                confidence: 90,
            });
        }

        if !checks.signature_valid {
            found.push(TamperIndicator {
                indicator_type: IndicatorType::SignatureInvalid,
                severity: Severity::Critical,
                description: "integrity signature does not verify against current content"
                    .to_string(),
                evidence: format!(
                    "signer {} key {}",
                    proof.signature.signer_id, proof.signature.public_key
                ),
                confidence: 98,
            });
        }

        if let Some(stored) = proof.merkle_root.as_deref() {
            let expected = proof.expected_merkle_root();
            if stored != expected {
                found.push(TamperIndicator {
                    indicator_type: IndicatorType::MerkleRootMismatch,
                    severity: Severity::High,
                    description: "stored merkle root does not match the stored fingerprint"
                        .to_string(),
                    evidence: format!("stored {stored}, recomputed {expected}"),
                    confidence: 85,
                });
            }
        }

        found
    }
}
