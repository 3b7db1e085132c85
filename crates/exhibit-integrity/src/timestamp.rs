//! # Timestamp Authority Client
//!
//! A timestamp token asserts that a digest existed at a point in time. The
//! authority is an external, trusted dependency reached through the async
//! [`TimestampAuthority`] port.
//!
//! ## Validity
//!
//! A token is valid iff it is `verified`, its status is `GRANTED`, and its
//! timestamp lies within `[now - 365 days, now + 5 minutes]` at the moment
//! of checking.
//!
//! ## Degraded Mode
//!
//! An unreachable or slow authority must not block proof creation.
//! [`TimestampClient::request_or_pending`] turns any failure into a
//! `PENDING` token, which never counts as valid.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use exhibit_core::{is_hex, CanonicalBytes, Clock, SystemClock, Timestamp};
use exhibit_crypto::{Ed25519KeyPair, Ed25519PublicKey, Ed25519Signature, SignaturePurpose};
use serde::{Deserialize, Serialize};

use crate::error::TimestampAuthorityError;

/// Oldest accepted token age.
pub const MAX_TOKEN_AGE_SECS: i64 = 365 * 24 * 60 * 60;

/// Tolerated clock skew for tokens dated in the future.
pub const MAX_FUTURE_SKEW_SECS: i64 = 5 * 60;

/// Authority id recorded on degraded tokens.
pub const PENDING_AUTHORITY_ID: &str = "pending";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum TokenStatus {
    /// Issued by an authority.
    Granted,
    /// Placeholder recorded while the authority was unavailable.
    Pending,
}

/// A timestamp token.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TimestampToken {
    pub authority_id: String,
    pub timestamp: Timestamp,
    /// Opaque token issued by the authority.
    pub token: String,
    /// Authority certificate or public key, opaque to the core.
    pub certificate: String,
    pub verified: bool,
    pub status: TokenStatus,
}

impl TimestampToken {
    /// Degraded token recorded when no authority answered.
    pub fn pending(now: Timestamp) -> Self {
        Self {
            authority_id: PENDING_AUTHORITY_ID.to_string(),
            timestamp: now,
            token: String::new(),
            certificate: String::new(),
            verified: false,
            status: TokenStatus::Pending,
        }
    }

    pub fn is_pending(&self) -> bool {
        self.status == TokenStatus::Pending
    }
}

/// Apply the validity rule at `now`.
pub fn verify_timestamp_at(token: &TimestampToken, now: Timestamp) -> bool {
    token.verified
        && token.status == TokenStatus::Granted
        && token.timestamp >= now.plus_secs(-MAX_TOKEN_AGE_SECS)
        && token.timestamp <= now.plus_secs(MAX_FUTURE_SKEW_SECS)
}

/// Port to a trusted timestamp authority.
#[async_trait]
pub trait TimestampAuthority: Send + Sync {
    /// Obtain a token over `digest_hex`.
    async fn request_timestamp(
        &self,
        digest_hex: &str,
    ) -> Result<TimestampToken, TimestampAuthorityError>;

    fn authority_id(&self) -> &str;
}

// ── Client ──────────────────────────────────────────────────────────

/// Wraps an authority with an explicit timeout and a clock.
#[derive(Clone)]
pub struct TimestampClient {
    authority: Arc<dyn TimestampAuthority>,
    timeout: Duration,
    clock: Arc<dyn Clock>,
}

impl std::fmt::Debug for TimestampClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TimestampClient")
            .field("authority", &self.authority.authority_id())
            .field("timeout", &self.timeout)
            .finish()
    }
}

impl TimestampClient {
    pub fn new(authority: Arc<dyn TimestampAuthority>, timeout: Duration) -> Self {
        Self {
            authority,
            timeout,
            clock: Arc::new(SystemClock),
        }
    }

    pub fn with_clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.clock = clock;
        self
    }

    pub fn clock(&self) -> &Arc<dyn Clock> {
        &self.clock
    }

    pub fn timeout(&self) -> Duration {
        self.timeout
    }

    /// Request a token, failing with [`TimestampAuthorityError::Timeout`]
    /// once the client timeout elapses.
    pub async fn request(&self, digest_hex: &str) -> Result<TimestampToken, TimestampAuthorityError> {
        match tokio::time::timeout(self.timeout, self.authority.request_timestamp(digest_hex)).await
        {
            Ok(result) => result,
            Err(_) => Err(TimestampAuthorityError::Timeout {
                authority_id: self.authority.authority_id().to_string(),
                timeout_ms: u64::try_from(self.timeout.as_millis()).unwrap_or(u64::MAX),
            }),
        }
    }

    /// Request a token, falling back to a pending token on any failure.
    pub async fn request_or_pending(&self, digest_hex: &str) -> TimestampToken {
        match self.request(digest_hex).await {
            Ok(token) => token,
            Err(e) => {
                tracing::warn!(
                    authority = self.authority.authority_id(),
                    digest = digest_hex,
                    error = %e,
                    "timestamp authority failed, recording pending token"
                );
                TimestampToken::pending(self.clock.now())
            }
        }
    }

    /// Validity of `token` against the client clock.
    pub fn verify_timestamp(&self, token: &TimestampToken) -> bool {
        verify_timestamp_at(token, self.clock.now())
    }
}

// ── Local authority ─────────────────────────────────────────────────

#[derive(Serialize)]
struct TokenStatement<'a> {
    authority_id: &'a str,
    digest: &'a str,
    purpose: SignaturePurpose,
    serial: u64,
    timestamp: Timestamp,
}

/// In-process authority that signs `{authority_id, digest, serial, timestamp}`
/// with its own Ed25519 key.
///
/// The token is `<serial>:<signature hex>` and the certificate is the
/// authority's public key in hex. Suitable for deployments without an
/// external authority and for tests.
pub struct LocalTimestampAuthority {
    authority_id: String,
    key: Ed25519KeyPair,
    clock: Arc<dyn Clock>,
    next_serial: AtomicU64,
}

impl std::fmt::Debug for LocalTimestampAuthority {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LocalTimestampAuthority")
            .field("authority_id", &self.authority_id)
            .field("public_key", &self.key.public_key())
            .finish()
    }
}

impl LocalTimestampAuthority {
    pub fn new(authority_id: impl Into<String>, key: Ed25519KeyPair, clock: Arc<dyn Clock>) -> Self {
        Self {
            authority_id: authority_id.into(),
            key,
            clock,
            next_serial: AtomicU64::new(1),
        }
    }

    /// Authority with a freshly generated key and the system clock.
    pub fn ephemeral(authority_id: impl Into<String>) -> Self {
        Self::new(authority_id, Ed25519KeyPair::generate(), Arc::new(SystemClock))
    }

    pub fn public_key(&self) -> Ed25519PublicKey {
        self.key.public_key()
    }

    fn statement(
        &self,
        digest: &str,
        serial: u64,
        timestamp: Timestamp,
    ) -> Result<CanonicalBytes, TimestampAuthorityError> {
        CanonicalBytes::new(&TokenStatement {
            authority_id: &self.authority_id,
            digest,
            purpose: SignaturePurpose::TimestampAttestation,
            serial,
            timestamp,
        })
        .map_err(|e| TimestampAuthorityError::Rejected(e.to_string()))
    }

    /// Whether `token` was issued by this authority over `digest_hex`.
    pub fn check_token(&self, token: &TimestampToken, digest_hex: &str) -> bool {
        if token.authority_id != self.authority_id
            || token.certificate != self.key.public_key().to_hex()
        {
            return false;
        }
        let Some((serial, sig)) = token.token.split_once(':') else {
            return false;
        };
        let (Ok(serial), Ok(sig)) = (serial.parse::<u64>(), Ed25519Signature::from_hex(sig)) else {
            return false;
        };
        let digest = digest_hex.to_ascii_lowercase();
        match self.statement(&digest, serial, token.timestamp) {
            Ok(msg) => self.key.public_key().verify(&msg, &sig).is_ok(),
            Err(_) => false,
        }
    }
}

#[async_trait]
impl TimestampAuthority for LocalTimestampAuthority {
    async fn request_timestamp(
        &self,
        digest_hex: &str,
    ) -> Result<TimestampToken, TimestampAuthorityError> {
        if !is_hex(digest_hex) {
            return Err(TimestampAuthorityError::Rejected(format!(
                "digest must be non-empty hex, got {digest_hex:?}"
            )));
        }
        let digest = digest_hex.to_ascii_lowercase();
        let serial = self.next_serial.fetch_add(1, Ordering::SeqCst);
        let timestamp = self.clock.now();
        let signature = self.key.sign(&self.statement(&digest, serial, timestamp)?);
        Ok(TimestampToken {
            authority_id: self.authority_id.clone(),
            timestamp,
            token: format!("{serial}:{}", signature.to_hex()),
            certificate: self.key.public_key().to_hex(),
            verified: true,
            status: TokenStatus::Granted,
        })
    }

    fn authority_id(&self) -> &str {
        &self.authority_id
    }
}
