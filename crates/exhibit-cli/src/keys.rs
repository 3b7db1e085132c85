//! Signing key files.
//!
//! A key file holds the 32-byte Ed25519 seed as one line of lowercase hex.
//! Files are never overwritten.

use std::path::Path;

use anyhow::{bail, Context, Result};
use exhibit_core::bytes_to_hex;
use exhibit_crypto::{Ed25519KeyPair, Ed25519PublicKey};

/// Generate a key, write its seed to `path` and return the public key.
pub fn generate_key_file(path: &Path) -> Result<Ed25519PublicKey> {
    let key = Ed25519KeyPair::generate();
    write_key_file(path, &key)?;
    Ok(key.public_key())
}

pub fn write_key_file(path: &Path, key: &Ed25519KeyPair) -> Result<()> {
    if path.exists() {
        bail!("refusing to overwrite existing key file {}", path.display());
    }
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        std::fs::create_dir_all(parent)
            .with_context(|| format!("failed to create {}", parent.display()))?;
    }
    let seed = bytes_to_hex(&key.export_seed());
    std::fs::write(path, format!("{seed}\n"))
        .with_context(|| format!("failed to write key file {}", path.display()))
}

pub fn read_key_file(path: &Path) -> Result<Ed25519KeyPair> {
    let raw = std::fs::read_to_string(path)
        .with_context(|| format!("failed to read key file {}", path.display()))?;
    Ed25519KeyPair::from_seed_hex(raw.trim())
        .with_context(|| format!("{} is not an Ed25519 seed", path.display()))
}

/// Read the key at `path`, creating it first if missing.
pub fn load_or_create(path: &Path) -> Result<Ed25519KeyPair> {
    if !path.exists() {
        let key = Ed25519KeyPair::generate();
        write_key_file(path, &key)?;
        tracing::info!(path = %path.display(), "created signing key");
        return Ok(key);
    }
    read_key_file(path)
}
