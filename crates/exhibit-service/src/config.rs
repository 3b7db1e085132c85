//! Service configuration.
//!
//! Defaults suit a single-node deployment with the local timestamp
//! authority. Override through environment variables or explicit
//! construction.

use std::time::Duration;

/// Configuration of an [`EvidenceService`](crate::EvidenceService).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ServiceConfig {
    /// Upper bound on one timestamp-authority request.
    pub timestamp_timeout: Duration,
    /// Identifier of the timestamp authority.
    pub authority_id: String,
    /// Deadline used by callers that do not supply their own.
    pub default_deadline: Duration,
}

impl Default for ServiceConfig {
    fn default() -> Self {
        Self {
            timestamp_timeout: Duration::from_millis(5_000),
            authority_id: "exhibit-local-tsa".to_string(),
            default_deadline: Duration::from_millis(30_000),
        }
    }
}

impl ServiceConfig {
    /// Load configuration from environment variables.
    ///
    /// Variables:
    /// - `EXHIBIT_TSA_TIMEOUT_MS` (default: 5000)
    /// - `EXHIBIT_TSA_AUTHORITY_ID` (default: `exhibit-local-tsa`)
    /// - `EXHIBIT_DEADLINE_MS` (default: 30000)
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|var| std::env::var(var).ok())
    }

    /// As [`from_env`](Self::from_env), reading variables through `lookup`.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let defaults = Self::default();
        Ok(Self {
            timestamp_timeout: millis(&lookup, "EXHIBIT_TSA_TIMEOUT_MS")?
                .unwrap_or(defaults.timestamp_timeout),
            authority_id: lookup("EXHIBIT_TSA_AUTHORITY_ID")
                .filter(|s| !s.trim().is_empty())
                .unwrap_or(defaults.authority_id),
            default_deadline: millis(&lookup, "EXHIBIT_DEADLINE_MS")?
                .unwrap_or(defaults.default_deadline),
        })
    }
}

fn millis(
    lookup: &impl Fn(&str) -> Option<String>,
    var: &str,
) -> Result<Option<Duration>, ConfigError> {
    let Some(raw) = lookup(var) else {
        return Ok(None);
    };
    match raw.trim().parse::<u64>() {
        Ok(0) | Err(_) => Err(ConfigError::InvalidDuration(var.to_string(), raw)),
        Ok(ms) => Ok(Some(Duration::from_millis(ms))),
    }
}

/// Configuration errors.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("{0} must be a positive number of milliseconds, got {1:?}")]
    InvalidDuration(String, String),
}
