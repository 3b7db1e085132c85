//! # Evidence Aggregate
//!
//! An [`Evidence`] item exclusively owns its fingerprint, its integrity
//! proof and its custody chain, and moves through a lifecycle:
//!
//! ```text
//! COLLECTED → PROCESSING → ANALYZED → READY → PRESENTED
//!     └───────────┴────────────┴────────┴────────┴──→ ARCHIVED | DESTROYED
//! ```
//!
//! `ARCHIVED` and `DESTROYED` are terminal. Terminal evidence accepts no
//! transitions and no custody transfers. Its proof is retained.

use exhibit_core::{ActorId, DigitalFingerprint, EvidenceId, Timestamp};
use exhibit_crypto::Ed25519KeyPair;
use exhibit_integrity::{IntegrityProof, VerificationEngine, VerificationRecord};
use serde::{Deserialize, Serialize};

use crate::custody::{CustodyChain, CustodyRecord, CustodyTransfer};
use crate::error::EvidenceError;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum EvidenceStatus {
    Collected,
    Processing,
    Analyzed,
    Ready,
    Presented,
    Archived,
    Destroyed,
}

impl EvidenceStatus {
    /// Wire name, as serialized.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Collected => "COLLECTED",
            Self::Processing => "PROCESSING",
            Self::Analyzed => "ANALYZED",
            Self::Ready => "READY",
            Self::Presented => "PRESENTED",
            Self::Archived => "ARCHIVED",
            Self::Destroyed => "DESTROYED",
        }
    }

    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Archived | Self::Destroyed)
    }

    /// The status that follows in the main line, if any.
    fn successor(&self) -> Option<Self> {
        match self {
            Self::Collected => Some(Self::Processing),
            Self::Processing => Some(Self::Analyzed),
            Self::Analyzed => Some(Self::Ready),
            Self::Ready => Some(Self::Presented),
            Self::Presented | Self::Archived | Self::Destroyed => None,
        }
    }

    pub fn can_transition_to(&self, next: Self) -> bool {
        if self.is_terminal() {
            return false;
        }
        next.is_terminal() || self.successor() == Some(next)
    }
}

impl std::fmt::Display for EvidenceStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One evidence item.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Evidence {
    id: EvidenceId,
    fingerprint: DigitalFingerprint,
    proof: IntegrityProof,
    custody: CustodyChain,
    status: EvidenceStatus,
    updated_at: Timestamp,
}

impl Evidence {
    /// Assemble a freshly ingested item in status `COLLECTED`.
    ///
    /// # Errors
    ///
    /// [`EvidenceError::Input`] if the proof or chain belong to another item.
    pub fn new(proof: IntegrityProof, custody: CustodyChain) -> Result<Self, EvidenceError> {
        if custody.evidence_id() != &proof.evidence_id {
            return Err(EvidenceError::Input(format!(
                "proof is for {}, custody chain for {}",
                proof.evidence_id,
                custody.evidence_id()
            )));
        }
        Ok(Self {
            id: proof.evidence_id.clone(),
            fingerprint: proof.fingerprint.clone(),
            updated_at: proof.created_at,
            proof,
            custody,
            status: EvidenceStatus::Collected,
        })
    }

    pub fn id(&self) -> &EvidenceId {
        &self.id
    }

    pub fn fingerprint(&self) -> &DigitalFingerprint {
        &self.fingerprint
    }

    pub fn proof(&self) -> &IntegrityProof {
        &self.proof
    }

    /// Score `current` against the stored proof and append the outcome to
    /// its verification history. Nothing else in the proof changes.
    ///
    /// # Errors
    ///
    /// [`EvidenceError::Integrity`] if the engine refuses the proof.
    pub fn record_verification(
        &mut self,
        engine: &VerificationEngine,
        current: &DigitalFingerprint,
        verifier: &ActorId,
    ) -> Result<VerificationRecord, EvidenceError> {
        Ok(engine.record(&self.id, current, &mut self.proof, verifier)?)
    }

    pub fn custody(&self) -> &CustodyChain {
        &self.custody
    }

    pub fn status(&self) -> EvidenceStatus {
        self.status
    }

    pub fn updated_at(&self) -> Timestamp {
        self.updated_at
    }

    /// Move to `next`.
    pub fn advance(&mut self, next: EvidenceStatus, at: Timestamp) -> Result<(), EvidenceError> {
        if self.status.is_terminal() {
            return Err(EvidenceError::TerminalState {
                evidence_id: self.id.to_string(),
                state: self.status.to_string(),
            });
        }
        if !self.status.can_transition_to(next) {
            let reason = match self.status.successor() {
                Some(expected) => format!("next status is {expected}, or ARCHIVED/DESTROYED"),
                None => "only ARCHIVED or DESTROYED may follow".to_string(),
            };
            return Err(EvidenceError::InvalidTransition {
                from: self.status.to_string(),
                to: next.to_string(),
                reason,
            });
        }
        tracing::info!(evidence_id = %self.id, from = %self.status, to = %next, "evidence status changed");
        self.status = next;
        self.updated_at = at;
        Ok(())
    }

    /// Transfer custody; refused once the item is terminal.
    pub fn transfer_custody(
        &mut self,
        transfer: CustodyTransfer,
        key: &Ed25519KeyPair,
        at: Timestamp,
    ) -> Result<&CustodyRecord, EvidenceError> {
        if self.status.is_terminal() {
            return Err(EvidenceError::TerminalState {
                evidence_id: self.id.to_string(),
                state: self.status.to_string(),
            });
        }
        let record = self.custody.transfer(transfer, key, at)?;
        self.updated_at = at;
        Ok(record)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use exhibit_core::{fingerprint::fingerprint, Clock, FixedClock};
    use exhibit_crypto::SignatureService;
    use exhibit_integrity::{
        LocalTimestampAuthority, ProofBuilder, TimestampClient, VerificationResult,
        VerificationStatus,
    };
    use std::sync::Arc;
    use std::time::Duration;

    use super::EvidenceStatus::*;

    fn t0() -> Timestamp {
        Timestamp::parse("2026-04-01T00:00:00Z").unwrap()
    }

    async fn item(id: &str) -> (Evidence, Ed25519KeyPair) {
        let key = Ed25519KeyPair::generate();
        let clock: Arc<dyn Clock> = Arc::new(FixedClock(t0()));
        let tsa = LocalTimestampAuthority::new("tsa", Ed25519KeyPair::generate(), clock.clone());
        let id = EvidenceId::new(id).unwrap();
        let collector = ActorId::new("alice").unwrap();
        let proof = ProofBuilder::new(
            SignatureService::default(),
            TimestampClient::new(Arc::new(tsa), Duration::from_secs(1)).with_clock(clock),
        )
        .create_proof(&id, b"content", &key, &collector)
        .await
        .unwrap();
        let custody = CustodyChain::open(id, collector, "scene", &key, t0()).unwrap();
        (Evidence::new(proof, custody).unwrap(), key)
    }

    #[test]
    fn main_line_and_exits() {
        assert!(Collected.can_transition_to(Processing));
        assert!(Ready.can_transition_to(Presented));
        assert!(!Collected.can_transition_to(Analyzed));
        assert!(!Presented.can_transition_to(Ready));
        for s in [Collected, Processing, Analyzed, Ready, Presented] {
            assert!(s.can_transition_to(Archived));
            assert!(s.can_transition_to(Destroyed));
        }
        assert!(!Archived.can_transition_to(Destroyed));
        assert!(!Destroyed.can_transition_to(Archived));
    }

    #[tokio::test]
    async fn advance_through_lifecycle() {
        let (mut ev, _) = item("EV-L1").await;
        assert_eq!(ev.status(), Collected);
        for next in [Processing, Analyzed, Ready, Presented, Archived] {
            ev.advance(next, t0().plus_secs(10)).unwrap();
        }
        assert_eq!(ev.status(), Archived);
        assert!(matches!(
            ev.advance(Destroyed, t0()),
            Err(EvidenceError::TerminalState { .. })
        ));
    }

    #[tokio::test]
    async fn skipping_a_stage_is_rejected() {
        let (mut ev, _) = item("EV-L2").await;
        let err = ev.advance(Ready, t0()).unwrap_err();
        assert!(matches!(err, EvidenceError::InvalidTransition { .. }));
        assert_eq!(ev.status(), Collected);
    }

    #[tokio::test]
    async fn destroyed_evidence_cannot_change_hands() {
        let (mut ev, key) = item("EV-L3").await;
        ev.advance(Destroyed, t0()).unwrap();
        let transfer = CustodyTransfer {
            from: ActorId::new("alice").unwrap(),
            to: ActorId::new("bob").unwrap(),
            reason: "court".to_string(),
            location: "vault".to_string(),
            storage_conditions: None,
            integrity_verified: false,
        };
        assert!(matches!(
            ev.transfer_custody(transfer, &key, t0()),
            Err(EvidenceError::TerminalState { .. })
        ));
        assert_eq!(ev.custody().len(), 1);
    }

    #[tokio::test]
    async fn mismatched_parts_are_rejected() {
        let (a, key) = item("EV-A").await;
        let other_chain = CustodyChain::open(
            EvidenceId::new("EV-B").unwrap(),
            ActorId::new("alice").unwrap(),
            "scene",
            &key,
            t0(),
        )
        .unwrap();
        assert!(matches!(
            Evidence::new(a.proof().clone(), other_chain),
            Err(EvidenceError::Input(_))
        ));
    }

    #[tokio::test]
    async fn verification_only_grows_the_history() {
        let (mut ev, _) = item("EV-V1").await;
        let before = ev.proof().clone();
        let engine = VerificationEngine::new(SignatureService::default(), Arc::new(FixedClock(t0())));
        let verifier = ActorId::new("lab").unwrap();

        let ok = ev
            .record_verification(&engine, &fingerprint(b"content").unwrap(), &verifier)
            .unwrap();
        assert_eq!(ok.result, VerificationResult::Verified);
        let bad = ev
            .record_verification(&engine, &fingerprint(b"c0ntent").unwrap(), &verifier)
            .unwrap();
        assert_eq!(bad.result, VerificationResult::Failed);

        let proof = ev.proof();
        assert_eq!(proof.verification_history().len(), 2);
        assert_eq!(proof.verification_status(), VerificationStatus::Compromised);
        assert_eq!(proof.fingerprint, before.fingerprint);
        assert_eq!(proof.signature, before.signature);
        assert_eq!(proof.timestamp, before.timestamp);
        assert_eq!(proof.merkle_root, before.merkle_root);
        assert_eq!(ev.fingerprint(), &before.fingerprint);
    }
}
