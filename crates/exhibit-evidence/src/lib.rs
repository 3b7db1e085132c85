//! # exhibit-evidence — Custody Ledger and Evidence Lifecycle
//!
//! - [`custody`]: the append-only [`CustodyChain`] of signed hand-offs.
//!   A transfer must come from the current holder.
//! - [`evidence`]: the [`Evidence`] aggregate, which owns one integrity
//!   proof and one custody chain, and its lifecycle state machine.
//!
//! Tamper checks are not part of the aggregate. They reference evidence by
//! id only and outlive archival.

pub mod custody;
pub mod error;
pub mod evidence;

pub use custody::{CustodyChain, CustodyRecord, CustodyTransfer};
pub use error::EvidenceError;
pub use evidence::{Evidence, EvidenceStatus};
