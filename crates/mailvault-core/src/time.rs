//! Time abstraction for testability.
//!
//! The record builder falls back to "now" when a timestamp fails to
//! parse; routing that through a `Clock` keeps the fallback
//! deterministic in tests.

use chrono::{DateTime, Utc};

/// Abstraction over wall-clock time.
///
/// In production, use [`SystemClock`]. In tests, use [`FixedClock`] to
/// pin the timestamp fallback to a known instant.
pub trait Clock: Send + Sync {
    /// Returns the current instant.
    fn now(&self) -> DateTime<Utc>;
}

/// System clock that uses real time.
#[derive(Debug, Default, Clone, Copy)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> DateTime<Utc> {
        Utc::now()
    }
}

/// Clock pinned to a fixed instant.
#[derive(Debug, Clone, Copy)]
pub struct FixedClock(pub DateTime<Utc>);

impl Clock for FixedClock {
    fn now(&self) -> DateTime<Utc> {
        self.0
    }
}
