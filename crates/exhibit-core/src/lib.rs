//! # exhibit-core — Foundational Types for the Exhibit Stack
//!
//! This crate is the leaf of the Exhibit workspace. It defines the types every
//! other crate builds on when it proves that a piece of evidence has not been
//! altered since ingestion.
//!
//! ## Key Design Principles
//!
//! 1. **`CanonicalBytes` newtype.** Every structured value that is hashed or
//!    signed flows through `CanonicalBytes`. Signature envelopes and custody
//!    transfers use `new()`, which rejects floats; collector metadata uses
//!    `from_metadata()`, which keeps them in RFC 8785 form. Raw evidence content is the only thing hashed
//!    as-is, and only by the fingerprint engine.
//!
//! 2. **Deterministic fingerprints.** [`fingerprint::generate`] is a pure
//!    function of content and metadata. Only `created_at` varies between runs.
//!
//! 3. **UTC-only timestamps and injected clocks.** [`Timestamp`] is UTC with
//!    seconds precision; time-dependent checks read a [`Clock`] so tests can
//!    pin "now".
//!
//! 4. **Newtype identifiers.** Evidence, custodians and actors are distinct
//!    types. No bare strings for identifiers.
//!
//! ## Crate Policy
//!
//! - No dependencies on other `exhibit-*` crates.
//! - No `unsafe` code.
//! - No `panic!()` or `.unwrap()` outside tests.

pub mod canonical;
pub mod digest;
pub mod error;
pub mod fingerprint;
pub mod identity;
pub mod temporal;

pub use canonical::CanonicalBytes;
pub use digest::{bytes_to_hex, hex_to_bytes, is_hex, sha256_canonical_hex, sha256_hex};
pub use error::{CanonicalizationError, CoreError};
pub use fingerprint::DigitalFingerprint;
pub use identity::{ActorId, EvidenceId};
pub use temporal::{Clock, FixedClock, SystemClock, Timestamp};
