//! # Temporal Types — UTC Timestamps and Clocks
//!
//! `Timestamp` is UTC-only and truncated to seconds, so every timestamp that
//! ends up inside a signed envelope or a custody statement has exactly one
//! canonical rendering: `YYYY-MM-DDTHH:MM:SSZ`.
//!
//! Time-dependent logic (timestamp-token bounds, tamper checks, custody
//! transfers) never calls `Utc::now()` directly. It reads a [`Clock`], which
//! is [`SystemClock`] in production and [`FixedClock`] in tests.

use chrono::{DateTime, Duration, Timelike, Utc};
use serde::{Deserialize, Serialize};

use crate::error::CoreError;

/// A UTC-only timestamp, truncated to seconds precision.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct Timestamp(DateTime<Utc>);

impl Timestamp {
    /// Current UTC time, truncated to seconds.
    pub fn now() -> Self {
        Self(truncate_to_seconds(Utc::now()))
    }

    /// From a `DateTime<Utc>`, truncating sub-seconds.
    pub fn from_utc(dt: DateTime<Utc>) -> Self {
        Self(truncate_to_seconds(dt))
    }

    /// Parse an RFC 3339 string. Only the `Z` suffix is accepted.
    ///
    /// # Errors
    ///
    /// Returns [`CoreError::Input`] for malformed strings or non-`Z` offsets.
    pub fn parse(s: &str) -> Result<Self, CoreError> {
        if !s.ends_with('Z') {
            return Err(CoreError::Input(format!(
                "timestamp must use Z suffix (UTC only), got: {s:?}"
            )));
        }
        let dt = DateTime::parse_from_rfc3339(s)
            .map_err(|e| CoreError::Input(format!("invalid RFC 3339 timestamp {s:?}: {e}")))?;
        Ok(Self(truncate_to_seconds(dt.with_timezone(&Utc))))
    }

    /// From Unix epoch seconds.
    pub fn from_epoch_secs(secs: i64) -> Result<Self, CoreError> {
        let dt = DateTime::from_timestamp(secs, 0)
            .ok_or_else(|| CoreError::Input(format!("invalid Unix timestamp: {secs}")))?;
        Ok(Self(dt))
    }

    /// Access the inner `DateTime<Utc>`.
    pub fn as_datetime(&self) -> &DateTime<Utc> {
        &self.0
    }

    /// Unix epoch seconds.
    pub fn epoch_secs(&self) -> i64 {
        self.0.timestamp()
    }

    /// Shift by a signed number of seconds. Saturates at the representable range.
    pub fn plus_secs(&self, secs: i64) -> Self {
        match Duration::try_seconds(secs).and_then(|d| self.0.checked_add_signed(d)) {
            Some(dt) => Self(dt),
            None if secs < 0 => Self(DateTime::<Utc>::MIN_UTC),
            None => Self(DateTime::<Utc>::MAX_UTC),
        }
    }

    /// Render as ISO 8601 with `Z` suffix.
    pub fn to_iso8601(&self) -> String {
        self.0.format("%Y-%m-%dT%H:%M:%SZ").to_string()
    }
}

impl std::fmt::Display for Timestamp {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.to_iso8601())
    }
}

fn truncate_to_seconds(dt: DateTime<Utc>) -> DateTime<Utc> {
    dt.with_nanosecond(0).unwrap_or(dt)
}

/// Source of "now" for time-dependent checks.
pub trait Clock: Send + Sync {
    /// The current instant.
    fn now(&self) -> Timestamp;
}

/// Wall-clock time.
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> Timestamp {
        Timestamp::now()
    }
}

/// A clock pinned to one instant.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FixedClock(pub Timestamp);

impl Clock for FixedClock {
    fn now(&self) -> Timestamp {
        self.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn now_has_no_subseconds() {
        assert_eq!(Timestamp::now().as_datetime().nanosecond(), 0);
    }

    #[test]
    fn from_utc_truncates() {
        let dt = Utc
            .with_ymd_and_hms(2026, 3, 9, 8, 15, 30)
            .unwrap()
            .with_nanosecond(987_654_321)
            .unwrap();
        assert_eq!(Timestamp::from_utc(dt).to_iso8601(), "2026-03-09T08:15:30Z");
    }

    #[test]
    fn parse_accepts_z_and_rejects_offsets() {
        assert!(Timestamp::parse("2026-03-09T08:15:30Z").is_ok());
        assert!(Timestamp::parse("2026-03-09T08:15:30+00:00").is_err());
        assert!(Timestamp::parse("2026-03-09T13:15:30+05:00").is_err());
        assert!(Timestamp::parse("yesterday").is_err());
    }

    #[test]
    fn plus_secs_moves_both_ways() {
        let ts = Timestamp::parse("2026-03-09T08:00:00Z").unwrap();
        assert_eq!(ts.plus_secs(300).to_iso8601(), "2026-03-09T08:05:00Z");
        assert_eq!(ts.plus_secs(-60).to_iso8601(), "2026-03-09T07:59:00Z");
    }

    #[test]
    fn plus_secs_saturates() {
        let ts = Timestamp::parse("2026-03-09T08:00:00Z").unwrap();
        assert!(ts.plus_secs(i64::MAX) > ts);
        assert!(ts.plus_secs(i64::MIN) < ts);
    }

    #[test]
    fn epoch_roundtrip() {
        let ts = Timestamp::parse("2026-03-09T08:00:00Z").unwrap();
        assert_eq!(Timestamp::from_epoch_secs(ts.epoch_secs()).unwrap(), ts);
    }

    #[test]
    fn serde_roundtrip() {
        let ts = Timestamp::parse("2026-03-09T08:00:00Z").unwrap();
        let json = serde_json::to_string(&ts).unwrap();
        assert_eq!(serde_json::from_str::<Timestamp>(&json).unwrap(), ts);
    }

    #[test]
    fn fixed_clock_is_fixed() {
        let ts = Timestamp::parse("2026-03-09T08:00:00Z").unwrap();
        let clock = FixedClock(ts);
        assert_eq!(clock.now(), ts);
        assert_eq!(clock.now(), clock.now());
    }
}
