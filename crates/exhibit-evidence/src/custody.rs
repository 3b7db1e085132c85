//! # Custody Ledger
//!
//! An append-only chain of signed custody records for one evidence item.
//!
//! ## Continuity
//!
//! Record `n` hands the item from `custodian` to `transferred_to`; the next
//! record must be made by that recipient:
//!
//! ```text
//! chain[n].transferred_to == chain[n + 1].custodian
//! ```
//!
//! The head's `transferred_to` is the current holder. The genesis record is
//! the collector taking the item into custody (`custodian == transferred_to`,
//! no `transferred_from`).
//!
//! ## Signatures
//!
//! Each record carries a `CUSTODY_TRANSFER` signature by the releasing
//! custodian over the SHA-256 of the canonical statement
//! `{evidence_id, from, to, reason, location, timestamp}`.
//!
//! ## Security Invariant
//!
//! Records are never mutated or removed. A mistaken transfer is corrected by
//! transferring back.

use exhibit_core::{sha256_canonical_hex, ActorId, CanonicalBytes, EvidenceId, Timestamp};
use exhibit_crypto::{DigitalSignature, Ed25519KeyPair, SignaturePurpose, SignatureService};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::EvidenceError;

/// Purpose recorded on the genesis record.
pub const COLLECTION_PURPOSE: &str = "COLLECTION";

/// One immutable link of the chain.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CustodyRecord {
    pub id: String,
    pub evidence_id: EvidenceId,
    /// Zero-based position in the chain.
    pub sequence: u64,
    /// Party that held the item and signs this record.
    pub custodian: ActorId,
    /// `None` on the genesis record.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub transferred_from: Option<ActorId>,
    pub transferred_to: ActorId,
    pub purpose: String,
    pub location: String,
    /// When `transferred_to` took possession.
    pub received_at: Timestamp,
    /// When `custodian` gave up possession. `None` on the genesis record.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub released_at: Option<Timestamp>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub storage_conditions: Option<String>,
    pub transfer_signature: DigitalSignature,
    /// Whether an integrity check passed before the hand-off.
    pub integrity_verified: bool,
}

/// A requested hand-off.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CustodyTransfer {
    pub from: ActorId,
    pub to: ActorId,
    pub reason: String,
    pub location: String,
    #[serde(default)]
    pub storage_conditions: Option<String>,
    #[serde(default)]
    pub integrity_verified: bool,
}

#[derive(Serialize)]
struct TransferStatement<'a> {
    evidence_id: &'a EvidenceId,
    from: Option<&'a ActorId>,
    to: &'a ActorId,
    reason: &'a str,
    location: &'a str,
    timestamp: Timestamp,
}

impl CustodyRecord {
    /// SHA-256 of the canonical transfer statement this record signs.
    pub fn statement_digest(&self) -> Result<String, EvidenceError> {
        statement_digest(
            &self.evidence_id,
            self.transferred_from.as_ref(),
            &self.transferred_to,
            &self.purpose,
            &self.location,
            self.received_at,
        )
    }

    pub fn is_genesis(&self) -> bool {
        self.transferred_from.is_none()
    }
}

fn statement_digest(
    evidence_id: &EvidenceId,
    from: Option<&ActorId>,
    to: &ActorId,
    reason: &str,
    location: &str,
    timestamp: Timestamp,
) -> Result<String, EvidenceError> {
    let canonical = CanonicalBytes::new(&TransferStatement {
        evidence_id,
        from,
        to,
        reason,
        location,
        timestamp,
    })
    .map_err(exhibit_core::CoreError::from)?;
    Ok(sha256_canonical_hex(&canonical))
}

/// The custody chain of one evidence item.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CustodyChain {
    evidence_id: EvidenceId,
    records: Vec<CustodyRecord>,
}

impl CustodyChain {
    /// Start a chain with `collector` taking custody at `at`.
    pub fn open(
        evidence_id: EvidenceId,
        collector: ActorId,
        location: impl Into<String>,
        key: &Ed25519KeyPair,
        at: Timestamp,
    ) -> Result<Self, EvidenceError> {
        let location = location.into();
        let digest = statement_digest(
            &evidence_id,
            None,
            &collector,
            COLLECTION_PURPOSE,
            &location,
            at,
        )?;
        let signature = sign(&digest, key, &collector, at)?;
        let genesis = CustodyRecord {
            id: Uuid::new_v4().to_string(),
            evidence_id: evidence_id.clone(),
            sequence: 0,
            custodian: collector.clone(),
            transferred_from: None,
            transferred_to: collector,
            purpose: COLLECTION_PURPOSE.to_string(),
            location,
            received_at: at,
            released_at: None,
            storage_conditions: None,
            transfer_signature: signature,
            integrity_verified: true,
        };
        Ok(Self {
            evidence_id,
            records: vec![genesis],
        })
    }

    pub fn evidence_id(&self) -> &EvidenceId {
        &self.evidence_id
    }

    pub fn records(&self) -> &[CustodyRecord] {
        &self.records
    }

    pub fn head(&self) -> Option<&CustodyRecord> {
        self.records.last()
    }

    pub fn current_holder(&self) -> Option<&ActorId> {
        self.head().map(|r| &r.transferred_to)
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Hand the item from `transfer.from` to `transfer.to`, signed with `key`.
    ///
    /// # Errors
    ///
    /// - [`EvidenceError::CustodyChainViolation`] if `from` is not the
    ///   current holder.
    /// - [`EvidenceError::Input`] for a self-transfer or a timestamp before
    ///   the head record.
    ///
    /// The chain is unchanged on every error.
    pub fn transfer(
        &mut self,
        transfer: CustodyTransfer,
        key: &Ed25519KeyPair,
        at: Timestamp,
    ) -> Result<&CustodyRecord, EvidenceError> {
        let head = self.head().ok_or_else(|| EvidenceError::BrokenChain {
            evidence_id: self.evidence_id.to_string(),
            sequence: 0,
            reason: "chain has no genesis record".to_string(),
        })?;
        if head.transferred_to != transfer.from {
            tracing::warn!(
                evidence_id = %self.evidence_id,
                current_holder = %head.transferred_to,
                attempted_from = %transfer.from,
                "custody transfer rejected, sender is not the current holder"
            );
            return Err(EvidenceError::CustodyChainViolation {
                evidence_id: self.evidence_id.to_string(),
                current_holder: head.transferred_to.to_string(),
                attempted_from: transfer.from.to_string(),
            });
        }
        if transfer.from == transfer.to {
            return Err(EvidenceError::Input(format!(
                "{} already holds {}",
                transfer.to, self.evidence_id
            )));
        }
        if at < head.received_at {
            return Err(EvidenceError::Input(format!(
                "transfer at {at} precedes current custody from {}",
                head.received_at
            )));
        }

        let digest = statement_digest(
            &self.evidence_id,
            Some(&transfer.from),
            &transfer.to,
            &transfer.reason,
            &transfer.location,
            at,
        )?;
        let signature = sign(&digest, key, &transfer.from, at)?;
        let record = CustodyRecord {
            id: Uuid::new_v4().to_string(),
            evidence_id: self.evidence_id.clone(),
            sequence: self.records.len() as u64,
            custodian: transfer.from.clone(),
            transferred_from: Some(transfer.from),
            transferred_to: transfer.to,
            purpose: transfer.reason,
            location: transfer.location,
            received_at: at,
            released_at: Some(at),
            storage_conditions: transfer.storage_conditions,
            transfer_signature: signature,
            integrity_verified: transfer.integrity_verified,
        };
        tracing::info!(
            evidence_id = %self.evidence_id,
            sequence = record.sequence,
            from = %record.custodian,
            to = %record.transferred_to,
            "custody transferred"
        );
        self.records.push(record);
        Ok(&self.records[self.records.len() - 1])
    }

    /// Re-check genesis shape, sequence numbering, continuity and every
    /// signature, with keys resolved by `signatures`.
    pub fn verify_chain(&self, signatures: &SignatureService) -> Result<(), EvidenceError> {
        let broken = |sequence: u64, reason: String| EvidenceError::BrokenChain {
            evidence_id: self.evidence_id.to_string(),
            sequence,
            reason,
        };
        let Some(genesis) = self.records.first() else {
            return Err(broken(0, "chain has no genesis record".to_string()));
        };
        if !genesis.is_genesis() || genesis.custodian != genesis.transferred_to {
            return Err(broken(0, "first record is not a collection".to_string()));
        }

        let mut previous: Option<&CustodyRecord> = None;
        for (i, record) in self.records.iter().enumerate() {
            let seq = i as u64;
            if record.sequence != seq {
                return Err(broken(seq, format!("sequence number is {}", record.sequence)));
            }
            if record.evidence_id != self.evidence_id {
                return Err(broken(seq, format!("record is for {}", record.evidence_id)));
            }
            if let Some(prev) = previous {
                if record.is_genesis() {
                    return Err(broken(seq, "second genesis record".to_string()));
                }
                if prev.transferred_to != record.custodian {
                    return Err(broken(
                        seq,
                        format!("{} held the item, not {}", prev.transferred_to, record.custodian),
                    ));
                }
                if record.transferred_from.as_ref() != Some(&record.custodian) {
                    return Err(broken(seq, "transferred_from differs from custodian".to_string()));
                }
            }
            if record.transfer_signature.signer_id != record.custodian {
                return Err(broken(seq, "record not signed by its custodian".to_string()));
            }
            let digest = record.statement_digest()?;
            if !signatures.verify_for(
                &digest,
                &record.transfer_signature,
                SignaturePurpose::CustodyTransfer,
            ) {
                return Err(broken(seq, "transfer signature does not verify".to_string()));
            }
            previous = Some(record);
        }
        Ok(())
    }
}

fn sign(
    digest: &str,
    key: &Ed25519KeyPair,
    signer: &ActorId,
    at: Timestamp,
) -> Result<DigitalSignature, EvidenceError> {
    Ok(SignatureService::default().create_at(
        digest,
        key,
        signer,
        SignaturePurpose::CustodyTransfer,
        at,
    )?)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn actor(name: &str) -> ActorId {
        ActorId::new(name).unwrap()
    }

    fn t(offset: i64) -> Timestamp {
        Timestamp::parse("2026-02-02T09:00:00Z").unwrap().plus_secs(offset)
    }

    fn hand_off(from: &str, to: &str) -> CustodyTransfer {
        CustodyTransfer {
            from: actor(from),
            to: actor(to),
            reason: "analysis".to_string(),
            location: "lab 3".to_string(),
            storage_conditions: Some("sealed bag".to_string()),
            integrity_verified: true,
        }
    }

    fn opened(key: &Ed25519KeyPair) -> CustodyChain {
        CustodyChain::open(
            EvidenceId::new("EV-C").unwrap(),
            actor("alice"),
            "scene",
            key,
            t(0),
        )
        .unwrap()
    }

    #[test]
    fn genesis_makes_collector_the_holder() {
        let key = Ed25519KeyPair::generate();
        let chain = opened(&key);
        assert_eq!(chain.len(), 1);
        assert_eq!(chain.current_holder(), Some(&actor("alice")));
        let genesis = chain.head().unwrap();
        assert!(genesis.is_genesis());
        assert_eq!(genesis.purpose, COLLECTION_PURPOSE);
        assert_eq!(genesis.transfer_signature.purpose, SignaturePurpose::CustodyTransfer);
        chain.verify_chain(&SignatureService::default()).unwrap();
    }

    #[test]
    fn transfer_links_to_previous_recipient() {
        let key = Ed25519KeyPair::generate();
        let mut chain = opened(&key);
        let record = chain.transfer(hand_off("alice", "bob"), &key, t(60)).unwrap();
        assert_eq!(record.sequence, 1);
        assert_eq!(record.custodian, actor("alice"));
        assert_eq!(record.transferred_from, Some(actor("alice")));
        assert_eq!(record.released_at, Some(t(60)));
        assert_eq!(chain.current_holder(), Some(&actor("bob")));
        chain.verify_chain(&SignatureService::default()).unwrap();
    }

    #[test]
    fn non_holder_transfer_changes_nothing() {
        let key = Ed25519KeyPair::generate();
        let mut chain = opened(&key);
        let before = chain.clone();
        let err = chain.transfer(hand_off("mallory", "bob"), &key, t(60)).unwrap_err();
        assert!(matches!(err, EvidenceError::CustodyChainViolation { .. }));
        assert_eq!(chain, before);
    }

    #[test]
    fn self_transfer_and_backdating_are_rejected() {
        let key = Ed25519KeyPair::generate();
        let mut chain = opened(&key);
        assert!(matches!(
            chain.transfer(hand_off("alice", "alice"), &key, t(60)),
            Err(EvidenceError::Input(_))
        ));
        assert!(matches!(
            chain.transfer(hand_off("alice", "bob"), &key, t(-1)),
            Err(EvidenceError::Input(_))
        ));
        assert_eq!(chain.len(), 1);
    }

    #[test]
    fn edited_record_breaks_verification() {
        let key = Ed25519KeyPair::generate();
        let mut chain = opened(&key);
        chain.transfer(hand_off("alice", "bob"), &key, t(60)).unwrap();

        let mut json = serde_json::to_value(&chain).unwrap();
        json["records"][1]["location"] = serde_json::json!("somewhere else");
        let edited: CustodyChain = serde_json::from_value(json).unwrap();
        let err = edited.verify_chain(&SignatureService::default()).unwrap_err();
        assert!(matches!(err, EvidenceError::BrokenChain { sequence: 1, .. }));
    }

    #[test]
    fn reordered_records_break_continuity() {
        let key = Ed25519KeyPair::generate();
        let mut chain = opened(&key);
        chain.transfer(hand_off("alice", "bob"), &key, t(60)).unwrap();
        chain.transfer(hand_off("bob", "carol"), &key, t(120)).unwrap();

        let mut json = serde_json::to_value(&chain).unwrap();
        let records = json["records"].as_array_mut().unwrap();
        records.swap(1, 2);
        let reordered: CustodyChain = serde_json::from_value(json).unwrap();
        assert!(matches!(
            reordered.verify_chain(&SignatureService::default()),
            Err(EvidenceError::BrokenChain { sequence: 1, .. })
        ));
    }

    #[test]
    fn integrity_signature_is_not_accepted_as_custody_signature() {
        let key = Ed25519KeyPair::generate();
        let mut chain = opened(&key);
        chain.transfer(hand_off("alice", "bob"), &key, t(60)).unwrap();
        let record = &chain.records()[1];
        let digest = record.statement_digest().unwrap();
        let wrong = SignatureService::default()
            .create_at(
                &digest,
                &key,
                &actor("alice"),
                SignaturePurpose::IntegrityVerification,
                t(60),
            )
            .unwrap();

        let mut json = serde_json::to_value(&chain).unwrap();
        json["records"][1]["transfer_signature"] = serde_json::to_value(&wrong).unwrap();
        let swapped: CustodyChain = serde_json::from_value(json).unwrap();
        assert!(swapped.verify_chain(&SignatureService::default()).is_err());
    }
}
