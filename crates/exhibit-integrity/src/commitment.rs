//! # Local Commitment Log
//!
//! An append-only, in-process hash chain over proof Merkle roots. Each entry
//! commits to its predecessor:
//!
//! ```text
//! commitment[n] = SHA-256(commitment[n-1] ∥ merkle_root ∥ committed_at)
//! ```
//!
//! with `commitment[-1]` the all-zero genesis digest. Rewriting any earlier
//! entry changes every later commitment.
//!
//! This is not a distributed ledger. There are no blocks, transactions or
//! confirmations. Deployments needing external anchoring publish the head
//! commitment elsewhere.

use exhibit_core::{is_hex, sha256_hex, Timestamp};
use parking_lot::Mutex;
use serde::{Deserialize, Serialize};

use crate::error::IntegrityError;

/// Predecessor of the first commitment.
pub const GENESIS_COMMITMENT: &str =
    "0000000000000000000000000000000000000000000000000000000000000000";

/// One entry of the log, stored on the proof it commits.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProofCommitment {
    /// Zero-based position in the log.
    pub sequence: u64,
    pub merkle_root: String,
    pub commitment: String,
    /// Commitment of the preceding entry, or [`GENESIS_COMMITMENT`].
    pub previous: String,
    pub committed_at: Timestamp,
}

impl ProofCommitment {
    /// Recompute the commitment and compare it with the stored one and with
    /// `merkle_root`.
    pub fn verify(&self, merkle_root: &str) -> bool {
        self.merkle_root == merkle_root
            && self.commitment == chain_digest(&self.previous, merkle_root, self.committed_at)
    }
}

fn chain_digest(previous: &str, merkle_root: &str, at: Timestamp) -> String {
    let input = format!("{previous}{merkle_root}{}", at.to_iso8601());
    sha256_hex(input.as_bytes())
}

/// Append-only log of [`ProofCommitment`]s. Safe to share across threads.
#[derive(Default)]
pub struct CommitmentLog {
    entries: Mutex<Vec<ProofCommitment>>,
}

impl CommitmentLog {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a commitment to `merkle_root`.
    ///
    /// # Errors
    ///
    /// [`IntegrityError::Input`] if the root is empty or not hex.
    pub fn commit(&self, merkle_root: &str, at: Timestamp) -> Result<ProofCommitment, IntegrityError> {
        if !is_hex(merkle_root) {
            return Err(IntegrityError::Input(format!(
                "merkle root must be non-empty hex, got {merkle_root:?}"
            )));
        }
        let mut entries = self.entries.lock();
        let previous = entries
            .last()
            .map(|e| e.commitment.clone())
            .unwrap_or_else(|| GENESIS_COMMITMENT.to_string());
        let entry = ProofCommitment {
            sequence: entries.len() as u64,
            merkle_root: merkle_root.to_string(),
            commitment: chain_digest(&previous, merkle_root, at),
            previous,
            committed_at: at,
        };
        entries.push(entry.clone());
        Ok(entry)
    }

    /// Whether `entry` is in this log, unaltered, and commits `merkle_root`.
    pub fn verify(&self, entry: &ProofCommitment, merkle_root: &str) -> bool {
        let entries = self.entries.lock();
        let Ok(index) = usize::try_from(entry.sequence) else {
            return false;
        };
        entries.get(index) == Some(entry) && entry.verify(merkle_root)
    }

    /// Re-walk the whole chain.
    pub fn verify_log(&self) -> bool {
        let entries = self.entries.lock();
        let mut previous = GENESIS_COMMITMENT.to_string();
        for (i, e) in entries.iter().enumerate() {
            if e.sequence != i as u64 || e.previous != previous || !e.verify(&e.merkle_root) {
                return false;
            }
            previous = e.commitment.clone();
        }
        true
    }

    pub fn head(&self) -> Option<ProofCommitment> {
        self.entries.lock().last().cloned()
    }

    pub fn len(&self) -> usize {
        self.entries.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.lock().is_empty()
    }
}

impl std::fmt::Debug for CommitmentLog {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CommitmentLog")
            .field("entries", &self.len())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn at(secs: i64) -> Timestamp {
        Timestamp::from_epoch_secs(1_780_000_000 + secs).unwrap()
    }

    #[test]
    fn entries_chain_from_genesis() {
        let log = CommitmentLog::new();
        let a = log.commit(&sha256_hex(b"a"), at(0)).unwrap();
        let b = log.commit(&sha256_hex(b"b"), at(1)).unwrap();
        assert_eq!(a.sequence, 0);
        assert_eq!(a.previous, GENESIS_COMMITMENT);
        assert_eq!(b.sequence, 1);
        assert_eq!(b.previous, a.commitment);
        assert_eq!(log.head(), Some(b));
        assert!(log.verify_log());
    }

    #[test]
    fn verify_detects_wrong_root_and_edits() {
        let log = CommitmentLog::new();
        let root = sha256_hex(b"root");
        let entry = log.commit(&root, at(0)).unwrap();
        assert!(log.verify(&entry, &root));
        assert!(!log.verify(&entry, &sha256_hex(b"other")));

        let mut moved = entry.clone();
        moved.committed_at = at(5);
        assert!(!moved.verify(&root));
        assert!(!log.verify(&moved, &root));
    }

    #[test]
    fn foreign_entry_is_not_in_log() {
        let root = sha256_hex(b"root");
        let ours = CommitmentLog::new();
        let theirs = CommitmentLog::new();
        theirs.commit(&sha256_hex(b"x"), at(0)).unwrap();
        let foreign = theirs.commit(&root, at(1)).unwrap();
        assert!(foreign.verify(&root));
        assert!(!ours.verify(&foreign, &root));
    }

    #[test]
    fn rejects_non_hex_root() {
        let log = CommitmentLog::new();
        assert!(matches!(log.commit("", at(0)), Err(IntegrityError::Input(_))));
        assert!(log.is_empty());
    }
}
