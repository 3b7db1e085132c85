//! # exhibit-service — Evidence Service Composition Root
//!
//! Wires the integrity and custody components to their collaborators and
//! enforces the concurrency model:
//!
//! - Mutations of one evidence item are serialized by [`KeyedLocks`].
//!   Distinct items proceed in parallel.
//! - Hashing runs on the blocking pool and the timestamp request runs with a
//!   timeout. Neither holds the per-item lock; the lock covers only the
//!   final load, compare and save.
//! - Every operation takes a caller [`Deadline`]. Work abandoned at the
//!   deadline is discarded, never saved.
//! - No retries. Timestamp failures degrade to pending tokens; storage
//!   failures propagate.
//!
//! Collaborators are reached through the traits in [`ports`]. [`memory`]
//! provides in-process adapters for tests and the CLI.

pub mod audit;
pub mod config;
pub mod deadline;
pub mod error;
pub mod locks;
pub mod memory;
pub mod ports;
pub mod service;

pub use audit::{AuditEvent, AuditKind, TracingAuditSink};
pub use config::{ConfigError, ServiceConfig};
pub use deadline::Deadline;
pub use error::{ServiceError, StorageError};
pub use locks::{KeyedGuard, KeyedLocks};
pub use memory::{MemoryAuditSink, MemoryBlobStore, MemoryEvidenceStore};
pub use ports::{AuditSink, BlobStore, EvidenceStore};
pub use service::{EvidenceService, IngestRequest};
