//! # Subcommands
//!
//! Each handler prints its result as pretty JSON on stdout and returns the
//! process exit code. Verification and tamper findings are results, not
//! errors: a failed verification or detected tampering exits with
//! [`EXIT_FINDING`].

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use clap::{Subcommand, ValueEnum};
use exhibit_core::fingerprint::generate;
use exhibit_core::{ActorId, EvidenceId};
use exhibit_evidence::{CustodyTransfer, EvidenceStatus};
use exhibit_integrity::{CheckType, VerificationResult};
use serde::Serialize;

use crate::keys;
use crate::Workspace;

/// Exit code for a completed command that found a problem.
pub const EXIT_FINDING: u8 = 2;

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Generate an Ed25519 signing key.
    Keygen {
        /// Where to write the key seed.
        #[arg(long)]
        out: PathBuf,
    },

    /// Print the digital fingerprint of a file.
    Fingerprint {
        /// Content file.
        path: PathBuf,
        /// JSON file with metadata to bind into the fingerprint.
        #[arg(long)]
        metadata: Option<PathBuf>,
    },

    /// Create the integrity proof of a file and open its custody chain.
    Ingest {
        /// Evidence identifier.
        #[arg(long)]
        id: String,
        /// Content file.
        #[arg(long)]
        content: PathBuf,
        /// Collecting officer, who becomes the first custodian.
        #[arg(long)]
        collector: String,
        /// Where the evidence was collected.
        #[arg(long)]
        location: String,
        /// Collector's signing key.
        #[arg(long)]
        key: PathBuf,
        /// JSON metadata file.
        #[arg(long)]
        metadata: Option<PathBuf>,
    },

    /// Verify content against its stored proof.
    Verify {
        #[arg(long)]
        id: String,
        #[arg(long)]
        content: PathBuf,
        #[arg(long)]
        verifier: String,
    },

    /// Run a tamper check of content against its stored proof.
    TamperCheck {
        #[arg(long)]
        id: String,
        #[arg(long)]
        content: PathBuf,
        #[arg(long)]
        checked_by: String,
        #[arg(long, value_enum, default_value_t = CheckKind::Manual)]
        check_type: CheckKind,
    },

    /// Transfer custody. Signed with the releasing custodian's key.
    Transfer {
        #[arg(long)]
        id: String,
        /// Current holder.
        #[arg(long)]
        from: String,
        /// Receiving custodian.
        #[arg(long)]
        to: String,
        #[arg(long)]
        reason: String,
        #[arg(long)]
        location: String,
        /// Releasing custodian's signing key.
        #[arg(long)]
        key: PathBuf,
        #[arg(long)]
        storage_conditions: Option<String>,
        /// The sender checked integrity before handing over.
        #[arg(long)]
        integrity_verified: bool,
    },

    /// Advance the evidence lifecycle.
    Status {
        #[arg(long)]
        id: String,
        #[arg(long, value_enum)]
        to: Stage,
        #[arg(long)]
        actor: String,
    },

    /// Print the stored record and verify its custody chain.
    Show {
        #[arg(long)]
        id: String,
    },
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, ValueEnum)]
pub enum CheckKind {
    Scheduled,
    OnAccess,
    Manual,
    PreTransfer,
}

impl From<CheckKind> for CheckType {
    fn from(kind: CheckKind) -> Self {
        match kind {
            CheckKind::Scheduled => CheckType::Scheduled,
            CheckKind::OnAccess => CheckType::OnAccess,
            CheckKind::Manual => CheckType::Manual,
            CheckKind::PreTransfer => CheckType::PreTransfer,
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, ValueEnum)]
pub enum Stage {
    Processing,
    Analyzed,
    Ready,
    Presented,
    Archived,
    Destroyed,
}

impl From<Stage> for EvidenceStatus {
    fn from(stage: Stage) -> Self {
        match stage {
            Stage::Processing => EvidenceStatus::Processing,
            Stage::Analyzed => EvidenceStatus::Analyzed,
            Stage::Ready => EvidenceStatus::Ready,
            Stage::Presented => EvidenceStatus::Presented,
            Stage::Archived => EvidenceStatus::Archived,
            Stage::Destroyed => EvidenceStatus::Destroyed,
        }
    }
}

/// Execute `command` against `workspace`.
pub async fn run(command: Command, workspace: &Workspace) -> Result<u8> {
    match command {
        Command::Keygen { out } => {
            let public = keys::generate_key_file(&out)?;
            print_json(&serde_json::json!({
                "key_file": out.display().to_string(),
                "public_key": public.to_hex(),
            }))?;
            Ok(0)
        }

        Command::Fingerprint { path, metadata } => {
            let content = std::fs::read(&path)
                .with_context(|| format!("failed to read {}", path.display()))?;
            let metadata = read_metadata(metadata.as_deref())?;
            print_json(&generate(Some(content.as_slice()), metadata.as_ref())?)?;
            Ok(0)
        }

        Command::Ingest {
            id,
            content,
            collector,
            location,
            key,
            metadata,
        } => {
            let id = EvidenceId::new(id)?;
            let service = workspace.service(Some((&id, content.as_path())))?;
            let key = keys::read_key_file(&key)?;
            let request = exhibit_service::IngestRequest {
                evidence_id: id,
                metadata: read_metadata(metadata.as_deref())?,
                collector: ActorId::new(collector)?,
                location,
            };
            let evidence = service
                .ingest(request, &key, service.default_deadline())
                .await?;
            print_json(evidence.proof())?;
            Ok(0)
        }

        Command::Verify {
            id,
            content,
            verifier,
        } => {
            let id = EvidenceId::new(id)?;
            let service = workspace.service(Some((&id, content.as_path())))?;
            let record = service
                .verify(&id, &ActorId::new(verifier)?, service.default_deadline())
                .await?;
            print_json(&record)?;
            Ok(if record.result == VerificationResult::Verified {
                0
            } else {
                EXIT_FINDING
            })
        }

        Command::TamperCheck {
            id,
            content,
            checked_by,
            check_type,
        } => {
            let id = EvidenceId::new(id)?;
            let service = workspace.service(Some((&id, content.as_path())))?;
            let check = service
                .tamper_check(
                    &id,
                    &ActorId::new(checked_by)?,
                    check_type.into(),
                    service.default_deadline(),
                )
                .await?;
            print_json(&check)?;
            Ok(if check.tamper_detected { EXIT_FINDING } else { 0 })
        }

        Command::Transfer {
            id,
            from,
            to,
            reason,
            location,
            key,
            storage_conditions,
            integrity_verified,
        } => {
            let id = EvidenceId::new(id)?;
            let service = workspace.service(None)?;
            let key = keys::read_key_file(&key)?;
            let transfer = CustodyTransfer {
                from: ActorId::new(from)?,
                to: ActorId::new(to)?,
                reason,
                location,
                storage_conditions,
                integrity_verified,
            };
            let record = service
                .transfer(&id, transfer, &key, service.default_deadline())
                .await?;
            print_json(&record)?;
            Ok(0)
        }

        Command::Status { id, to, actor } => {
            let id = EvidenceId::new(id)?;
            let service = workspace.service(None)?;
            let status = service
                .advance_status(&id, to.into(), &ActorId::new(actor)?, service.default_deadline())
                .await?;
            print_json(&serde_json::json!({ "evidence_id": id, "status": status }))?;
            Ok(0)
        }

        Command::Show { id } => {
            let id = EvidenceId::new(id)?;
            let service = workspace.service(None)?;
            let evidence = service.load(&id).await?;
            let custody_valid = match service.verify_custody(&id).await {
                Ok(()) => true,
                Err(e) => {
                    tracing::warn!(evidence_id = %id, error = %e, "custody chain does not verify");
                    false
                }
            };
            print_json(&serde_json::json!({
                "evidence": evidence,
                "custody_valid": custody_valid,
                "tamper_checks": service.tamper_history(&id).await?,
            }))?;
            Ok(if custody_valid { 0 } else { EXIT_FINDING })
        }
    }
}

fn read_metadata(path: Option<&Path>) -> Result<Option<serde_json::Value>> {
    let Some(path) = path else {
        return Ok(None);
    };
    let raw = std::fs::read(path)
        .with_context(|| format!("failed to read metadata file {}", path.display()))?;
    let value = serde_json::from_slice(&raw)
        .with_context(|| format!("{} is not valid JSON", path.display()))?;
    Ok(Some(value))
}

fn print_json<T: Serialize + ?Sized>(value: &T) -> Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}
