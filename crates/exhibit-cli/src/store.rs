//! # File-backed Evidence Store
//!
//! One JSON document per evidence item under `<root>/evidence/<id>.json`
//! and one JSON array of tamper checks under `<root>/tamper/<id>.json`.
//! Documents are written to a uniquely named temporary file and renamed
//! into place, so a reader sees either the previous record or the new one.
//!
//! `append_tamper_check` is a read-modify-write of one file. Callers
//! serialize it per evidence id, as `EvidenceService` does.

use std::path::{Path, PathBuf};

use async_trait::async_trait;
use exhibit_core::EvidenceId;
use exhibit_evidence::Evidence;
use exhibit_integrity::TamperCheck;
use exhibit_service::{EvidenceStore, StorageError};
use serde::de::DeserializeOwned;
use serde::Serialize;
use uuid::Uuid;

#[derive(Debug, Clone)]
pub struct FileEvidenceStore {
    root: PathBuf,
}

impl FileEvidenceStore {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    fn evidence_path(&self, id: &EvidenceId) -> Result<PathBuf, StorageError> {
        document_path(&self.root.join("evidence"), id)
    }

    fn tamper_path(&self, id: &EvidenceId) -> Result<PathBuf, StorageError> {
        document_path(&self.root.join("tamper"), id)
    }
}

/// Reject ids that would escape `dir` when used as a file name.
fn document_path(dir: &Path, id: &EvidenceId) -> Result<PathBuf, StorageError> {
    let name = id.as_str();
    if name.contains(&['/', '\\', '\0'][..]) || name == "." || name == ".." {
        return Err(StorageError::Backend {
            operation: "resolve path".to_string(),
            reason: format!("evidence id {name:?} is not a valid file name"),
        });
    }
    Ok(dir.join(format!("{name}.json")))
}

fn backend(operation: &str, path: &Path, err: std::io::Error) -> StorageError {
    StorageError::Backend {
        operation: operation.to_string(),
        reason: format!("{}: {err}", path.display()),
    }
}

async fn read_document<T: DeserializeOwned>(path: &Path) -> Result<Option<T>, StorageError> {
    match tokio::fs::read(path).await {
        Ok(bytes) => Ok(Some(serde_json::from_slice(&bytes)?)),
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(None),
        Err(e) => Err(backend("read", path, e)),
    }
}

async fn write_document<T: Serialize + ?Sized>(path: &Path, value: &T) -> Result<(), StorageError> {
    if let Some(parent) = path.parent() {
        tokio::fs::create_dir_all(parent)
            .await
            .map_err(|e| backend("create directory", parent, e))?;
    }
    let bytes = serde_json::to_vec_pretty(value)?;
    let tmp = path.with_extension(format!("json.{}.tmp", Uuid::new_v4().simple()));
    tokio::fs::write(&tmp, bytes)
        .await
        .map_err(|e| backend("write", &tmp, e))?;
    if let Err(e) = tokio::fs::rename(&tmp, path).await {
        let _ = tokio::fs::remove_file(&tmp).await;
        return Err(backend("rename", path, e));
    }
    Ok(())
}

#[async_trait]
impl EvidenceStore for FileEvidenceStore {
    async fn load(&self, id: &EvidenceId) -> Result<Option<Evidence>, StorageError> {
        read_document(&self.evidence_path(id)?).await
    }

    async fn save(&self, evidence: &Evidence) -> Result<(), StorageError> {
        write_document(&self.evidence_path(evidence.id())?, evidence).await
    }

    async fn append_tamper_check(&self, check: &TamperCheck) -> Result<(), StorageError> {
        let path = self.tamper_path(&check.evidence_id)?;
        let mut checks: Vec<TamperCheck> = read_document(&path).await?.unwrap_or_default();
        checks.push(check.clone());
        write_document(&path, &checks).await
    }

    async fn tamper_checks(&self, id: &EvidenceId) -> Result<Vec<TamperCheck>, StorageError> {
        Ok(read_document(&self.tamper_path(id)?).await?.unwrap_or_default())
    }
}
