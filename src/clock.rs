//! Time sources
//!
//! The anchor chain needs a timestamp that only moves forward, the ledger
//! needs a wall-clock instant. Both come from a [`Clock`] handed in at
//! construction so tests can replay a fixed timeline.

use chrono::{DateTime, TimeZone, Utc};
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Instant;

pub trait Clock: Send + Sync {
    /// Nanoseconds since the Unix epoch, used as the causal timestamp.
    fn now_nanos(&self) -> u64;

    /// Wall-clock time stamped onto committed ledger records.
    fn now_utc(&self) -> DateTime<Utc>;
}

/// Wall clock pinned at construction and advanced by a monotonic `Instant`,
/// so readings never go backwards even if the system time is adjusted.
#[derive(Debug, Clone)]
pub struct SystemClock {
    base_nanos: u64,
    started: Instant,
}

impl SystemClock {
    pub fn new() -> Self {
        Self::not_before(0)
    }

    /// Clock whose first reading is strictly later than `floor_nanos`.
    ///
    /// Used when resuming a chain whose head was stamped by another process
    /// or host: if the wall clock now reads behind that head, readings
    /// continue from just past it instead.
    pub fn not_before(floor_nanos: u64) -> Self {
        let wall = Utc::now()
            .timestamp_nanos_opt()
            .map(|n| n.max(0) as u64)
            .unwrap_or(0);
        Self {
            base_nanos: wall.max(floor_nanos.saturating_add(1)),
            started: Instant::now(),
        }
    }
}

impl Default for SystemClock {
    fn default() -> Self {
        Self::new()
    }
}

impl Clock for SystemClock {
    fn now_nanos(&self) -> u64 {
        let elapsed = self.started.elapsed().as_nanos() as u64;
        self.base_nanos.saturating_add(elapsed)
    }

    fn now_utc(&self) -> DateTime<Utc> {
        Utc.timestamp_nanos(self.now_nanos() as i64)
    }
}

/// Hand-driven clock for deterministic tests. Can be moved backwards to
/// simulate a causality violation.
#[derive(Debug, Default)]
pub struct ManualClock {
    nanos: AtomicU64,
}

impl ManualClock {
    pub fn new(start_nanos: u64) -> Self {
        Self {
            nanos: AtomicU64::new(start_nanos),
        }
    }

    pub fn set(&self, nanos: u64) {
        self.nanos.store(nanos, Ordering::SeqCst);
    }

    pub fn advance(&self, nanos: u64) {
        self.nanos.fetch_add(nanos, Ordering::SeqCst);
    }
}

impl Clock for ManualClock {
    fn now_nanos(&self) -> u64 {
        self.nanos.load(Ordering::SeqCst)
    }

    fn now_utc(&self) -> DateTime<Utc> {
        Utc.timestamp_nanos(self.now_nanos() as i64)
    }
}
