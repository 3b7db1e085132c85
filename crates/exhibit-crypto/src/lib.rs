//! # exhibit-crypto — Cryptographic Primitives
//!
//! - **Ed25519** key pairs, public keys and signatures with hex serde.
//! - **Signature service** that signs digests under a [`SignaturePurpose`]
//!   tag and verifies through a pluggable [`KeyResolver`].
//! - **Merkle aggregator** that folds an ordered digest list into one root.
//! - **AES-256-GCM** sealing with a fresh nonce per call.
//!
//! ## Crate Policy
//!
//! - Depends only on `exhibit-core` internally.
//! - No mocking of cryptographic operations in tests.
//! - Private keys are never serialized or logged.

pub mod aead;
pub mod ed25519;
pub mod error;
pub mod merkle;
pub mod signature;

pub use aead::{EncryptionKey, SealedBox};
pub use ed25519::{Ed25519KeyPair, Ed25519PublicKey, Ed25519Signature};
pub use error::CryptoError;
pub use merkle::calculate_root;
pub use signature::{
    DigitalSignature, EmbeddedKeyResolver, KeyResolver, PinnedKeyResolver, SignaturePurpose,
    SignatureService,
};
