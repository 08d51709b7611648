//! Injectable time source.
//!
//! Every "now" the engine reads goes through the [`Clock`] trait instead of
//! a direct `SystemTime::now()`. Scoring and round deadlines are both
//! functions of wall-clock timestamps, so tests need to dictate exact
//! response latencies — a trait seam makes that a one-liner instead of a
//! sleep-and-hope.
//!
//! Timestamps are epoch milliseconds (`u64`) rather than `Instant` because
//! they are persisted in the session document: the round controller must be
//! able to recompute a remaining deadline from storage after a host-process
//! restart, and a monotonic `Instant` does not survive one.

use std::sync::atomic::{AtomicU64, Ordering};
use std::time::{SystemTime, UNIX_EPOCH};

/// A source of "now" in epoch milliseconds.
pub trait Clock: Send + Sync + 'static {
    /// Milliseconds since the Unix epoch.
    fn now_ms(&self) -> u64;
}

/// The real wall clock. Used everywhere outside tests.
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now_ms(&self) -> u64 {
        // A system clock before 1970 is a machine misconfiguration;
        // defaulting to 0 is as good an answer as any.
        SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .unwrap_or_default()
            .as_millis() as u64
    }
}

/// A hand-driven clock for tests.
///
/// Starts at a chosen instant and only moves when told to. Tests use this
/// to produce exact response times ("player A answered 12 000 ms after the
/// question started") without sleeping.
#[derive(Debug, Default)]
pub struct ManualClock(AtomicU64);

impl ManualClock {
    /// A clock frozen at the given epoch-millisecond instant.
    pub fn new(start_ms: u64) -> Self {
        Self(AtomicU64::new(start_ms))
    }

    /// Moves the clock forward.
    pub fn advance(&self, ms: u64) {
        self.0.fetch_add(ms, Ordering::SeqCst);
    }

    /// Jumps the clock to an absolute instant.
    pub fn set(&self, ms: u64) {
        self.0.store(ms, Ordering::SeqCst);
    }
}

impl Clock for ManualClock {
    fn now_ms(&self) -> u64 {
        self.0.load(Ordering::SeqCst)
    }
}
