//! Caller deadlines.

use std::future::Future;
use std::time::Duration;

use tokio::time::Instant;

use crate::error::ServiceError;

/// Point in time after which an operation is abandoned.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Deadline {
    expires_at: Instant,
}

impl Deadline {
    pub fn after(budget: Duration) -> Self {
        Self {
            expires_at: Instant::now() + budget,
        }
    }

    pub fn at(expires_at: Instant) -> Self {
        Self { expires_at }
    }

    pub fn remaining(&self) -> Duration {
        self.expires_at.saturating_duration_since(Instant::now())
    }

    pub fn is_expired(&self) -> bool {
        Instant::now() >= self.expires_at
    }

    /// Fail with [`ServiceError::DeadlineExceeded`] if already expired.
    pub fn check(&self, operation: &str) -> Result<(), ServiceError> {
        if self.is_expired() {
            return Err(exceeded(operation));
        }
        Ok(())
    }

    /// Drive `fut` until it completes or the deadline passes. On expiry the
    /// future is dropped, cancelling whatever it was awaiting.
    pub async fn run<F: Future>(&self, operation: &str, fut: F) -> Result<F::Output, ServiceError> {
        tokio::time::timeout_at(self.expires_at, fut)
            .await
            .map_err(|_| exceeded(operation))
    }
}

fn exceeded(operation: &str) -> ServiceError {
    tracing::warn!(operation, "deadline exceeded, abandoning operation");
    ServiceError::DeadlineExceeded {
        operation: operation.to_string(),
    }
}
