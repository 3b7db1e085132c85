//! # exhibit-cli — Operator CLI for the Evidence Stack
//!
//! Provides the `exhibit` binary. State lives in a local directory
//! (`--state-dir`, default `.exhibit`):
//!
//! ```text
//! .exhibit/
//!   tsa.key              seed of the local timestamp authority
//!   evidence/<id>.json   evidence record (proof, custody chain, status)
//!   tamper/<id>.json     tamper-check history
//! ```
//!
//! Content is never copied into the state directory. Commands that need it
//! take the content file explicitly.
//!
//! ## Subcommands
//!
//! - `exhibit keygen` — write a new Ed25519 signing key.
//! - `exhibit fingerprint` — print the digital fingerprint of a file.
//! - `exhibit ingest` — create the integrity proof and open custody.
//! - `exhibit verify` — re-verify content against its proof.
//! - `exhibit tamper-check` — run a forensic tamper check.
//! - `exhibit transfer` — hand custody to another actor.
//! - `exhibit status` — advance the evidence lifecycle.
//! - `exhibit show` — print the stored record and check its custody chain.

pub mod commands;
pub mod keys;
pub mod store;

use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::{Context, Result};
use exhibit_core::{EvidenceId, SystemClock};
use exhibit_service::{EvidenceService, MemoryBlobStore, ServiceConfig, TracingAuditSink};

use crate::store::FileEvidenceStore;

/// Default state directory, relative to the working directory.
pub const DEFAULT_STATE_DIR: &str = ".exhibit";

/// A state directory plus the service configuration for one invocation.
#[derive(Debug, Clone)]
pub struct Workspace {
    state_dir: PathBuf,
    config: ServiceConfig,
}

impl Workspace {
    pub fn new(state_dir: impl Into<PathBuf>, config: ServiceConfig) -> Self {
        Self {
            state_dir: state_dir.into(),
            config,
        }
    }

    pub fn state_dir(&self) -> &Path {
        &self.state_dir
    }

    pub fn config(&self) -> &ServiceConfig {
        &self.config
    }

    /// Build the service over this workspace. When `content` is given, the
    /// file is served as the blob of that evidence id.
    pub fn service(&self, content: Option<(&EvidenceId, &Path)>) -> Result<EvidenceService> {
        let blobs = MemoryBlobStore::new();
        if let Some((id, path)) = content {
            let bytes = std::fs::read(path)
                .with_context(|| format!("failed to read content file {}", path.display()))?;
            blobs.put(id.clone(), bytes);
        }
        let tsa_key = keys::load_or_create(&self.state_dir.join("tsa.key"))?;
        Ok(EvidenceService::with_local_authority(
            self.config.clone(),
            Arc::new(blobs),
            Arc::new(FileEvidenceStore::new(&self.state_dir)),
            Arc::new(TracingAuditSink),
            tsa_key,
            Arc::new(SystemClock),
        ))
    }
}
