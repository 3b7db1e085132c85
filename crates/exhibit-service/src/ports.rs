//! # Collaborator Ports
//!
//! The service never talks to storage or audit infrastructure directly.
//! Deployments implement these traits; [`crate::memory`] provides
//! in-process versions.
//!
//! - [`BlobStore`]: evidence content. Upload and at-rest encryption are the
//!   store's business.
//! - [`EvidenceStore`]: whole-record persistence. An [`Evidence`] is always
//!   saved and loaded entire, never patched field by field, so readers
//!   never see half an append. Tamper checks are stored apart and keyed by
//!   evidence id only.
//! - [`AuditSink`]: fire-and-forget events. Delivery failures stay inside
//!   the sink.
//!
//! The timestamp authority port lives in `exhibit-integrity`.

use async_trait::async_trait;
use exhibit_core::EvidenceId;
use exhibit_evidence::Evidence;
use exhibit_integrity::TamperCheck;

use crate::audit::AuditEvent;
use crate::error::StorageError;

#[async_trait]
pub trait BlobStore: Send + Sync {
    /// Content of `id`, or `None` if no blob exists.
    async fn read(&self, id: &EvidenceId) -> Result<Option<Vec<u8>>, StorageError>;
}

#[async_trait]
pub trait EvidenceStore: Send + Sync {
    async fn load(&self, id: &EvidenceId) -> Result<Option<Evidence>, StorageError>;

    /// Replace the stored record of `evidence.id()`.
    async fn save(&self, evidence: &Evidence) -> Result<(), StorageError>;

    async fn append_tamper_check(&self, check: &TamperCheck) -> Result<(), StorageError>;

    /// Checks for `id` in the order they were appended.
    async fn tamper_checks(&self, id: &EvidenceId) -> Result<Vec<TamperCheck>, StorageError>;
}

pub trait AuditSink: Send + Sync {
    fn emit(&self, event: AuditEvent);
}
