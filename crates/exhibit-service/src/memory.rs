//! In-memory adapters backed by `DashMap`.
//!
//! Evidence is stored as `serde_json::Value` so every load is a full decode
//! of what was saved, the same path a real document store takes. Clones
//! share the same data.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use async_trait::async_trait;
use dashmap::DashMap;
use exhibit_core::EvidenceId;
use exhibit_evidence::Evidence;
use exhibit_integrity::TamperCheck;
use parking_lot::Mutex;
use serde_json::Value;

use crate::audit::AuditEvent;
use crate::error::StorageError;
use crate::ports::{AuditSink, BlobStore, EvidenceStore};

#[derive(Debug, Clone, Default)]
pub struct MemoryBlobStore {
    blobs: Arc<DashMap<EvidenceId, Vec<u8>>>,
}

impl MemoryBlobStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Store or replace the content of `id`.
    pub fn put(&self, id: EvidenceId, content: impl Into<Vec<u8>>) {
        self.blobs.insert(id, content.into());
    }
}

#[async_trait]
impl BlobStore for MemoryBlobStore {
    async fn read(&self, id: &EvidenceId) -> Result<Option<Vec<u8>>, StorageError> {
        Ok(self.blobs.get(id).map(|b| b.value().clone()))
    }
}

#[derive(Default)]
struct Inner {
    evidence: DashMap<EvidenceId, Value>,
    tamper_checks: DashMap<EvidenceId, Vec<Value>>,
    fail_writes: AtomicBool,
}

#[derive(Clone, Default)]
pub struct MemoryEvidenceStore {
    inner: Arc<Inner>,
}

impl std::fmt::Debug for MemoryEvidenceStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MemoryEvidenceStore")
            .field("evidence", &self.inner.evidence.len())
            .field("tamper_checks", &self.inner.tamper_checks.len())
            .finish()
    }
}

impl MemoryEvidenceStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Make every subsequent write fail with [`StorageError::Backend`].
    pub fn fail_writes(&self, fail: bool) {
        self.inner.fail_writes.store(fail, Ordering::SeqCst);
    }

    pub fn len(&self) -> usize {
        self.inner.evidence.len()
    }

    pub fn is_empty(&self) -> bool {
        self.inner.evidence.is_empty()
    }

    fn check_writable(&self, operation: &str) -> Result<(), StorageError> {
        if self.inner.fail_writes.load(Ordering::SeqCst) {
            return Err(StorageError::Backend {
                operation: operation.to_string(),
                reason: "write rejected".to_string(),
            });
        }
        Ok(())
    }
}

#[async_trait]
impl EvidenceStore for MemoryEvidenceStore {
    async fn load(&self, id: &EvidenceId) -> Result<Option<Evidence>, StorageError> {
        match self.inner.evidence.get(id) {
            Some(value) => Ok(Some(serde_json::from_value(value.value().clone())?)),
            None => Ok(None),
        }
    }

    async fn save(&self, evidence: &Evidence) -> Result<(), StorageError> {
        self.check_writable("save evidence")?;
        let value = serde_json::to_value(evidence)?;
        self.inner.evidence.insert(evidence.id().clone(), value);
        Ok(())
    }

    async fn append_tamper_check(&self, check: &TamperCheck) -> Result<(), StorageError> {
        self.check_writable("append tamper check")?;
        let value = serde_json::to_value(check)?;
        self.inner
            .tamper_checks
            .entry(check.evidence_id.clone())
            .or_default()
            .push(value);
        Ok(())
    }

    async fn tamper_checks(&self, id: &EvidenceId) -> Result<Vec<TamperCheck>, StorageError> {
        let Some(values) = self.inner.tamper_checks.get(id) else {
            return Ok(Vec::new());
        };
        values
            .iter()
            .map(|v| serde_json::from_value(v.clone()).map_err(StorageError::from))
            .collect()
    }
}

/// Collects events for inspection.
#[derive(Debug, Clone, Default)]
pub struct MemoryAuditSink {
    events: Arc<Mutex<Vec<AuditEvent>>>,
}

impl MemoryAuditSink {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn events(&self) -> Vec<AuditEvent> {
        self.events.lock().clone()
    }
}

impl AuditSink for MemoryAuditSink {
    fn emit(&self, event: AuditEvent) {
        self.events.lock().push(event);
    }
}
