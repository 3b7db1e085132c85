//! # Evidence Error Types
//!
//! Custody and lifecycle rejections carry the state at the time of failure
//! so operators can act without reading logs.

use exhibit_core::CoreError;
use exhibit_crypto::CryptoError;
use exhibit_integrity::IntegrityError;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum EvidenceError {
    /// A transfer was attempted by someone other than the current holder.
    /// Nothing was appended.
    #[error("custody chain violation on {evidence_id}: transfer from {attempted_from}, but current holder is {current_holder}")]
    CustodyChainViolation {
        /// Evidence identifier.
        evidence_id: String,
        /// Head of the chain.
        current_holder: String,
        /// The `from` of the rejected transfer.
        attempted_from: String,
    },

    /// A stored chain failed re-verification.
    #[error("custody chain of {evidence_id} broken at record {sequence}: {reason}")]
    BrokenChain {
        /// Evidence identifier.
        evidence_id: String,
        /// Position of the first bad record.
        sequence: u64,
        /// What failed.
        reason: String,
    },

    /// Lifecycle transition not allowed from the current status.
    #[error("invalid evidence transition from {from} to {to}: {reason}")]
    InvalidTransition {
        /// Current status.
        from: String,
        /// Requested status.
        to: String,
        /// Why it was rejected.
        reason: String,
    },

    /// The evidence is archived or destroyed.
    #[error("evidence {evidence_id} is in terminal state {state}")]
    TerminalState {
        /// Evidence identifier.
        evidence_id: String,
        /// Terminal status.
        state: String,
    },

    /// Malformed input, e.g. a self-transfer or a proof for another item.
    #[error("invalid input: {0}")]
    Input(String),

    #[error(transparent)]
    Core(#[from] CoreError),

    #[error(transparent)]
    Crypto(#[from] CryptoError),

    /// The verification engine refused the stored proof.
    #[error(transparent)]
    Integrity(#[from] IntegrityError),
}
