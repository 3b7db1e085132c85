//! # Canonical Serialization
//!
//! `CanonicalBytes` is the only byte sequence the stack hashes or signs when
//! the input is a structured value: evidence metadata, signature envelopes,
//! custody transfer statements and commitment payloads.
//!
//! ## Security Invariant
//!
//! The inner `Vec<u8>` is private and the only constructors are
//! [`CanonicalBytes::new()`] and [`CanonicalBytes::from_metadata()`]. Two
//! logically equal values therefore always produce identical bytes, which is
//! what makes `metadata_hash` and every signature reproducible.
//!
//! ## Rules
//!
//! 1. **Reject floats in signed statements.** Envelopes and transfer
//!    statements carry quantities as strings or integers. Collector metadata
//!    (GPS coordinates, sensor readings) keeps its floats and relies on the
//!    RFC 8785 number form instead.
//! 2. **Sorted keys, compact separators.** Serialization goes through
//!    `serde_jcs` (RFC 8785, JSON Canonicalization Scheme).
//! 3. **Timestamps** serialize through [`crate::Timestamp`], which is UTC with
//!    a `Z` suffix and seconds precision.

use serde::Serialize;
use serde_json::Value;

use crate::error::CanonicalizationError;

/// Bytes produced exclusively by JCS canonicalization.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct CanonicalBytes(Vec<u8>);

impl CanonicalBytes {
    /// Construct canonical bytes from any serializable value.
    ///
    /// # Errors
    ///
    /// Returns [`CanonicalizationError::FloatRejected`] if the value contains
    /// a float, and [`CanonicalizationError::SerializationFailed`] if the value
    /// cannot be represented as JSON.
    pub fn new(obj: &impl Serialize) -> Result<Self, CanonicalizationError> {
        let value = serde_json::to_value(obj)?;
        reject_floats(&value)?;
        let s = serde_jcs::to_string(&value)?;
        Ok(Self(s.into_bytes()))
    }

    /// Canonicalize free-form evidence metadata.
    ///
    /// Floats are written in the ECMAScript shortest round-trip form RFC 8785
    /// prescribes, so `40.7128` always canonicalizes to the same bytes.
    ///
    /// # Errors
    ///
    /// Returns [`CanonicalizationError::SerializationFailed`] if the value
    /// cannot be represented as JSON.
    pub fn from_metadata(metadata: &Value) -> Result<Self, CanonicalizationError> {
        let s = serde_jcs::to_string(metadata)?;
        Ok(Self(s.into_bytes()))
    }

    /// Access the canonical bytes.
    pub fn as_bytes(&self) -> &[u8] {
        &self.0
    }

    /// Returns the length of the canonical byte sequence.
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// Returns true if the canonical byte sequence is empty.
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl AsRef<[u8]> for CanonicalBytes {
    fn as_ref(&self) -> &[u8] {
        &self.0
    }
}

fn reject_floats(value: &Value) -> Result<(), CanonicalizationError> {
    match value {
        Value::Null | Value::Bool(_) | Value::String(_) => Ok(()),
        Value::Number(n) => {
            if n.is_f64() {
                if let Some(f) = n.as_f64() {
                    return Err(CanonicalizationError::FloatRejected(f));
                }
            }
            Ok(())
        }
        Value::Array(items) => items.iter().try_for_each(reject_floats),
        Value::Object(map) => map.values().try_for_each(reject_floats),
    }
}
