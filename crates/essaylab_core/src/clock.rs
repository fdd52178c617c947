//! Clock capability for timestamp stamping.
//!
//! # Responsibility
//! - Provide RFC3339 "now" to write paths without binding them to wall time.
//!
//! # Invariants
//! - Produced strings are valid RFC3339 with second precision.

use chrono::{SecondsFormat, Utc};

/// Source of RFC3339-formatted current time.
pub trait Clock: Send + Sync {
    fn now_rfc3339(&self) -> String;
}

/// Wall-clock implementation used by production wiring.
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now_rfc3339(&self) -> String {
        Utc::now().to_rfc3339_opts(SecondsFormat::Secs, true)
    }
}

/// Clock pinned to one instant. Test support for deterministic stamping.
#[derive(Debug, Clone)]
pub struct FixedClock {
    now: String,
}

impl FixedClock {
    pub fn new(now: impl Into<String>) -> Self {
        Self { now: now.into() }
    }

    /// Replaces the pinned instant for subsequent reads.
    pub fn set(&mut self, now: impl Into<String>) {
        self.now = now.into();
    }
}

impl Clock for FixedClock {
    fn now_rfc3339(&self) -> String {
        self.now.clone()
    }
}
