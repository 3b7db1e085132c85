//! # exhibit-integrity — Integrity Proofs, Verification and Tamper Checks
//!
//! Composes the primitives of `exhibit-core` and `exhibit-crypto` into the
//! artifacts that prove a piece of evidence is unchanged since ingestion:
//!
//! - [`timestamp`]: trusted timestamp tokens behind an async
//!   [`TimestampAuthority`] port, with a timeout-bound client.
//! - [`proof`]: the [`IntegrityProof`] record and the [`ProofBuilder`].
//! - [`verification`]: recompute-and-compare producing a scored
//!   [`VerificationRecord`] appended to the proof's history.
//! - [`tamper`]: an independent forensic sweep producing a [`TamperCheck`].
//! - [`policy`]: the fixed confidence weights and severity deductions.
//! - [`commitment`]: the local append-only commitment log.
//!
//! ## Security Invariant
//!
//! After creation, only a proof's verification history (append-only) and
//! status change. Tamper checks never touch the proof.

pub mod commitment;
pub mod error;
pub mod policy;
pub mod proof;
pub mod tamper;
pub mod timestamp;
pub mod verification;

pub use commitment::{CommitmentLog, ProofCommitment};
pub use error::{IntegrityError, TimestampAuthorityError};
pub use policy::ScoringPolicy;
pub use proof::{
    IntegrityProof, ProofBuilder, VerificationRecord, VerificationResult, VerificationStatus,
};
pub use tamper::{
    CheckType, IndicatorType, Severity, TamperAction, TamperCheck, TamperDetector, TamperIndicator,
};
pub use timestamp::{
    LocalTimestampAuthority, TimestampAuthority, TimestampClient, TimestampToken, TokenStatus,
};
pub use verification::{PrimitiveChecks, VerificationEngine};
