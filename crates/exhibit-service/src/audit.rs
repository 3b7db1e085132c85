//! Audit events emitted on every proof creation, verification, tamper
//! check, custody transfer and status change.

use exhibit_core::{ActorId, EvidenceId, Timestamp};
use serde::{Deserialize, Serialize};

use crate::ports::AuditSink;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum AuditKind {
    ProofCreated,
    Verification,
    TamperCheck,
    CustodyTransfer,
    StatusChange,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AuditEvent {
    pub evidence_id: EvidenceId,
    pub kind: AuditKind,
    pub actor_id: ActorId,
    /// Outcome, e.g. `VERIFIED`, `TAMPER_DETECTED` or `REJECTED`.
    pub result: String,
    pub timestamp: Timestamp,
}

/// Writes audit events to the `exhibit::audit` tracing target.
#[derive(Debug, Clone, Copy, Default)]
pub struct TracingAuditSink;

impl AuditSink for TracingAuditSink {
    fn emit(&self, event: AuditEvent) {
        tracing::info!(
            target: "exhibit::audit",
            evidence_id = %event.evidence_id,
            kind = ?event.kind,
            actor_id = %event.actor_id,
            result = %event.result,
            timestamp = %event.timestamp,
            "audit"
        );
    }
}
