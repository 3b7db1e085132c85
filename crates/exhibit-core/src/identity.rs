//! # Identifier Newtypes
//!
//! Evidence items and the people or services acting on them (custodians,
//! verifiers, signers) have distinct identifier types, so a custodian can
//! never be passed where an evidence id is expected.

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::CoreError;

/// Identifier of one evidence item, as assigned by the case-management system.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct EvidenceId(String);

impl EvidenceId {
    /// Wrap an externally assigned identifier.
    ///
    /// # Errors
    ///
    /// Returns [`CoreError::Input`] if the identifier is empty or whitespace.
    pub fn new(id: impl Into<String>) -> Result<Self, CoreError> {
        let id = id.into();
        if id.trim().is_empty() {
            return Err(CoreError::Input("evidence id must not be empty".to_string()));
        }
        Ok(Self(id))
    }

    /// Mint a fresh identifier of the form `EV-<uuid>`.
    pub fn generate() -> Self {
        Self(format!("EV-{}", Uuid::new_v4()))
    }

    /// Borrow as a string slice.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for EvidenceId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

/// Identifier of a person or service acting on evidence: a custodian,
/// verifier, signer or tamper-check operator.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ActorId(String);

impl ActorId {
    /// Wrap an actor identifier.
    ///
    /// # Errors
    ///
    /// Returns [`CoreError::Input`] if the identifier is empty or whitespace.
    pub fn new(id: impl Into<String>) -> Result<Self, CoreError> {
        let id = id.into();
        if id.trim().is_empty() {
            return Err(CoreError::Input("actor id must not be empty".to_string()));
        }
        Ok(Self(id))
    }

    /// Borrow as a string slice.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for ActorId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}
