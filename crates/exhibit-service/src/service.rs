//! # Evidence Service
//!
//! Orchestrates ingestion, verification, tamper checks, custody transfers
//! and status changes against the [`ports`](crate::ports).
//!
//! ## Security Invariant
//!
//! A record is saved only after every step of its operation succeeded
//! within the caller's deadline. Read-modify-write of one evidence item
//! happens under that item's lock, so two transfers from the same holder
//! cannot both win.

use std::sync::Arc;

use exhibit_core::fingerprint::{fingerprint, generate};
use exhibit_core::{ActorId, Clock, DigitalFingerprint, EvidenceId};
use exhibit_crypto::{Ed25519KeyPair, KeyResolver, SignatureService};
use exhibit_evidence::{CustodyChain, CustodyRecord, CustodyTransfer, Evidence, EvidenceStatus};
use exhibit_integrity::{
    CheckType, CommitmentLog, LocalTimestampAuthority, ProofBuilder, TamperCheck, TamperDetector,
    TimestampAuthority, TimestampClient, VerificationEngine, VerificationRecord,
};

use crate::audit::{AuditEvent, AuditKind};
use crate::config::ServiceConfig;
use crate::deadline::Deadline;
use crate::error::ServiceError;
use crate::locks::{KeyedGuard, KeyedLocks};
use crate::ports::{AuditSink, BlobStore, EvidenceStore};

/// Input of [`EvidenceService::ingest`]. The content itself is read from
/// the blob store under `evidence_id`.
#[derive(Debug, Clone)]
pub struct IngestRequest {
    pub evidence_id: EvidenceId,
    pub metadata: Option<serde_json::Value>,
    pub collector: ActorId,
    pub location: String,
}

pub struct EvidenceService {
    config: ServiceConfig,
    blobs: Arc<dyn BlobStore>,
    store: Arc<dyn EvidenceStore>,
    audit: Arc<dyn AuditSink>,
    clock: Arc<dyn Clock>,
    timestamps: TimestampClient,
    signatures: SignatureService,
    commitments: Option<Arc<CommitmentLog>>,
    builder: ProofBuilder,
    engine: VerificationEngine,
    detector: TamperDetector,
    locks: KeyedLocks,
}

impl std::fmt::Debug for EvidenceService {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("EvidenceService")
            .field("config", &self.config)
            .field("timestamps", &self.timestamps)
            .field("locks", &self.locks.len())
            .finish()
    }
}

impl EvidenceService {
    pub fn new(
        config: ServiceConfig,
        blobs: Arc<dyn BlobStore>,
        store: Arc<dyn EvidenceStore>,
        audit: Arc<dyn AuditSink>,
        authority: Arc<dyn TimestampAuthority>,
        clock: Arc<dyn Clock>,
    ) -> Self {
        let timestamps =
            TimestampClient::new(authority, config.timestamp_timeout).with_clock(clock.clone());
        let signatures = SignatureService::default();
        Self {
            builder: ProofBuilder::new(signatures.clone(), timestamps.clone()),
            engine: VerificationEngine::new(signatures.clone(), clock.clone()),
            detector: TamperDetector::new(signatures.clone(), clock.clone()),
            config,
            blobs,
            store,
            audit,
            clock,
            timestamps,
            signatures,
            commitments: None,
            locks: KeyedLocks::new(),
        }
    }

    /// Service backed by an in-process authority named after
    /// `config.authority_id` and signing with `tsa_key`.
    pub fn with_local_authority(
        config: ServiceConfig,
        blobs: Arc<dyn BlobStore>,
        store: Arc<dyn EvidenceStore>,
        audit: Arc<dyn AuditSink>,
        tsa_key: Ed25519KeyPair,
        clock: Arc<dyn Clock>,
    ) -> Self {
        let authority =
            LocalTimestampAuthority::new(config.authority_id.clone(), tsa_key, clock.clone());
        Self::new(config, blobs, store, audit, Arc::new(authority), clock)
    }

    /// Resolve signer keys through `resolver` instead of the embedded key.
    pub fn with_key_resolver(mut self, resolver: Arc<dyn KeyResolver>) -> Self {
        self.signatures = SignatureService::new(resolver);
        self.rebuild();
        self
    }

    /// Commit every new proof's Merkle root to `log`.
    pub fn with_commitment_log(mut self, log: Arc<CommitmentLog>) -> Self {
        self.commitments = Some(log);
        self.rebuild();
        self
    }

    fn rebuild(&mut self) {
        let mut builder = ProofBuilder::new(self.signatures.clone(), self.timestamps.clone());
        if let Some(log) = &self.commitments {
            builder = builder.with_commitment_log(log.clone());
        }
        self.builder = builder;
        self.engine = VerificationEngine::new(self.signatures.clone(), self.clock.clone());
        self.detector = TamperDetector::new(self.signatures.clone(), self.clock.clone());
    }

    pub fn config(&self) -> &ServiceConfig {
        &self.config
    }

    /// Deadline using the configured default budget.
    pub fn default_deadline(&self) -> Deadline {
        Deadline::after(self.config.default_deadline)
    }

    // ── Ingestion ───────────────────────────────────────────────────

    /// Fingerprint, timestamp, sign and store a new evidence item, opening
    /// its custody chain with the collector.
    ///
    /// # Errors
    ///
    /// - [`ServiceError::AlreadyExists`] if `evidence_id` has a record.
    /// - [`ServiceError::NotFound`] if the blob store has no content for it.
    /// - [`ServiceError::DeadlineExceeded`] if any step outlives `deadline`.
    ///
    /// An unreachable timestamp authority is not an error; the proof is
    /// stored with a pending token.
    pub async fn ingest(
        &self,
        request: IngestRequest,
        key: &Ed25519KeyPair,
        deadline: Deadline,
    ) -> Result<Evidence, ServiceError> {
        let id = request.evidence_id;
        deadline.check("ingest")?;
        if deadline.run("load evidence", self.store.load(&id)).await??.is_some() {
            return Err(already_exists(&id));
        }

        let content = self.read_blob(&id, &deadline).await?;
        let metadata = request.metadata;
        let fingerprint = self
            .hash(&deadline, move || generate(Some(content.as_slice()), metadata.as_ref()))
            .await?;
        let token = deadline
            .run("timestamp", self.timestamps.request_or_pending(&fingerprint.sha256))
            .await?;

        let _guard = self.lock(&id, &deadline).await?;
        if deadline.run("load evidence", self.store.load(&id)).await??.is_some() {
            return Err(already_exists(&id));
        }
        let proof = self
            .builder
            .assemble(&id, fingerprint, token, key, &request.collector)?;
        let custody = CustodyChain::open(
            id.clone(),
            request.collector.clone(),
            request.location,
            key,
            proof.created_at,
        )?;
        let evidence = Evidence::new(proof, custody)?;

        deadline.check("save evidence")?;
        deadline.run("save evidence", self.store.save(&evidence)).await??;

        tracing::info!(
            evidence_id = %id,
            collector = %request.collector,
            timestamp_pending = evidence.proof().timestamp.is_pending(),
            "evidence ingested"
        );
        self.emit(&id, AuditKind::ProofCreated, &request.collector, "CREATED");
        Ok(evidence)
    }

    // ── Verification ────────────────────────────────────────────────

    /// Re-read the content, score it against the stored proof and append
    /// the verification record.
    ///
    /// A failed verification is returned as a record, not as an error.
    pub async fn verify(
        &self,
        id: &EvidenceId,
        verifier: &ActorId,
        deadline: Deadline,
    ) -> Result<VerificationRecord, ServiceError> {
        deadline.check("verify")?;
        let content = self.read_blob(id, &deadline).await?;
        let current = self.hash(&deadline, move || fingerprint(&content)).await?;

        let _guard = self.lock(id, &deadline).await?;
        let mut evidence = self.load_existing(id, &deadline).await?;
        let record = evidence.record_verification(&self.engine, &current, verifier)?;

        deadline.check("save evidence")?;
        deadline.run("save evidence", self.store.save(&evidence)).await??;
        self.emit(id, AuditKind::Verification, verifier, record.result.as_str());
        Ok(record)
    }

    /// Run a tamper check and store it. The proof is not modified.
    ///
    /// Hashing runs unlocked; the stored check list is appended under the
    /// item's lock, so concurrent checks each land exactly once.
    pub async fn tamper_check(
        &self,
        id: &EvidenceId,
        checked_by: &ActorId,
        check_type: CheckType,
        deadline: Deadline,
    ) -> Result<TamperCheck, ServiceError> {
        deadline.check("tamper check")?;
        let content = self.read_blob(id, &deadline).await?;
        let current = self.hash(&deadline, move || fingerprint(&content)).await?;

        let _guard = self.lock(id, &deadline).await?;
        let evidence = self.load_existing(id, &deadline).await?;
        let check = self
            .detector
            .inspect(id, &current, evidence.proof(), checked_by, check_type)?;

        deadline.check("save tamper check")?;
        deadline
            .run("save tamper check", self.store.append_tamper_check(&check))
            .await??;
        let result = if check.tamper_detected {
            "TAMPER_DETECTED"
        } else {
            "CLEAN"
        };
        self.emit(id, AuditKind::TamperCheck, checked_by, result);
        Ok(check)
    }

    // ── Custody and lifecycle ───────────────────────────────────────

    /// Append a signed transfer to the custody chain. `key` belongs to the
    /// releasing custodian, `transfer.from`.
    ///
    /// A rejected transfer is audited with result `REJECTED` and leaves the
    /// stored record untouched.
    pub async fn transfer(
        &self,
        id: &EvidenceId,
        transfer: CustodyTransfer,
        key: &Ed25519KeyPair,
        deadline: Deadline,
    ) -> Result<CustodyRecord, ServiceError> {
        deadline.check("transfer")?;
        let _guard = self.lock(id, &deadline).await?;
        let mut evidence = self.load_existing(id, &deadline).await?;

        let actor = transfer.from.clone();
        let record = match evidence.transfer_custody(transfer, key, self.clock.now()) {
            Ok(record) => record.clone(),
            Err(e) => {
                self.emit(id, AuditKind::CustodyTransfer, &actor, "REJECTED");
                return Err(e.into());
            }
        };

        deadline.check("save evidence")?;
        deadline.run("save evidence", self.store.save(&evidence)).await??;
        self.emit(id, AuditKind::CustodyTransfer, &actor, "TRANSFERRED");
        Ok(record)
    }

    /// Move the item to `next` in its lifecycle.
    pub async fn advance_status(
        &self,
        id: &EvidenceId,
        next: EvidenceStatus,
        actor: &ActorId,
        deadline: Deadline,
    ) -> Result<EvidenceStatus, ServiceError> {
        deadline.check("advance status")?;
        let _guard = self.lock(id, &deadline).await?;
        let mut evidence = self.load_existing(id, &deadline).await?;
        evidence.advance(next, self.clock.now())?;

        deadline.check("save evidence")?;
        deadline.run("save evidence", self.store.save(&evidence)).await??;
        self.emit(id, AuditKind::StatusChange, actor, next.as_str());
        Ok(next)
    }

    /// Verify every signature and link of the stored custody chain.
    pub async fn verify_custody(&self, id: &EvidenceId) -> Result<(), ServiceError> {
        let evidence = self.load(id).await?;
        evidence.custody().verify_chain(&self.signatures)?;
        Ok(())
    }

    // ── Reads ───────────────────────────────────────────────────────

    pub async fn load(&self, id: &EvidenceId) -> Result<Evidence, ServiceError> {
        self.store
            .load(id)
            .await?
            .ok_or_else(|| not_found(id))
    }

    pub async fn tamper_history(&self, id: &EvidenceId) -> Result<Vec<TamperCheck>, ServiceError> {
        Ok(self.store.tamper_checks(id).await?)
    }

    /// Evidence items currently locked or waited on.
    pub fn locked_items(&self) -> usize {
        self.locks.len()
    }

    // ── Helpers ─────────────────────────────────────────────────────

    async fn lock(&self, id: &EvidenceId, deadline: &Deadline) -> Result<KeyedGuard<'_>, ServiceError> {
        let acquired = deadline.run("lock", self.locks.lock(id)).await;
        if acquired.is_err() {
            self.locks.prune();
        }
        acquired
    }

    async fn read_blob(&self, id: &EvidenceId, deadline: &Deadline) -> Result<Vec<u8>, ServiceError> {
        deadline
            .run("read content", self.blobs.read(id))
            .await??
            .ok_or_else(|| not_found(id))
    }

    async fn load_existing(
        &self,
        id: &EvidenceId,
        deadline: &Deadline,
    ) -> Result<Evidence, ServiceError> {
        deadline
            .run("load evidence", self.store.load(id))
            .await??
            .ok_or_else(|| not_found(id))
    }

    /// Hash on the blocking pool. On expiry the worker result is discarded.
    async fn hash<F>(&self, deadline: &Deadline, job: F) -> Result<DigitalFingerprint, ServiceError>
    where
        F: FnOnce() -> Result<DigitalFingerprint, exhibit_core::CoreError> + Send + 'static,
    {
        let joined = deadline
            .run("fingerprint", tokio::task::spawn_blocking(job))
            .await?;
        Ok(joined.map_err(|e| ServiceError::Worker(e.to_string()))??)
    }

    fn emit(&self, id: &EvidenceId, kind: AuditKind, actor: &ActorId, result: &str) {
        self.audit.emit(AuditEvent {
            evidence_id: id.clone(),
            kind,
            actor_id: actor.clone(),
            result: result.to_string(),
            timestamp: self.clock.now(),
        });
    }
}

fn not_found(id: &EvidenceId) -> ServiceError {
    ServiceError::NotFound {
        evidence_id: id.to_string(),
    }
}

fn already_exists(id: &EvidenceId) -> ServiceError {
    ServiceError::AlreadyExists {
        evidence_id: id.to_string(),
    }
}
