//! Round deadline scheduling for Quizwire.
//!
//! Each active question gets one deadline: question start + the round
//! duration. The [`RoundScheduler`] owns a cancellable tokio task per room
//! that sleeps until that deadline and then emits a [`RoundExpiry`] on the
//! scheduler's channel; the engine drains the channel and triggers the
//! reveal.
//!
//! Two properties matter more than the timer itself:
//!
//! - **Cancellation**: arming a room replaces (aborts) any previous task
//!   for it, and advancing cancels the old question's deadline outright.
//!   A stale timer that slips through anyway is harmless; every expiry
//!   carries its question index, and the reveal rejects stale indices.
//! - **Restart recovery**: deadlines are a function of the *persisted*
//!   question start timestamp, never of in-memory state alone.
//!   [`RoundScheduler::remaining_after`] recomputes the remaining window
//!   from storage so a restarted host re-arms mid-round; an already-past
//!   deadline yields zero and fires immediately.

use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tracing::{debug, trace};

use quizwire_model::RoomCode;

// ---------------------------------------------------------------------------
// Configuration
// ---------------------------------------------------------------------------

/// Round timing settings.
#[derive(Debug, Clone)]
pub struct RoundConfig {
    /// How long players have to answer each question.
    pub question_duration: Duration,
}

impl Default for RoundConfig {
    fn default() -> Self {
        Self {
            question_duration: Duration::from_secs(30),
        }
    }
}

// ---------------------------------------------------------------------------
// Expiry events
// ---------------------------------------------------------------------------

/// A deadline that elapsed: the question at `index` in room `code` ran out
/// of time. The receiver decides what that means (normally: reveal).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RoundExpiry {
    /// The room whose deadline elapsed.
    pub code: RoomCode,
    /// The question index the deadline was armed for. Consumers must
    /// treat an index that no longer matches the active question as stale.
    pub index: usize,
}

// ---------------------------------------------------------------------------
// Scheduler
// ---------------------------------------------------------------------------

struct ArmedRound {
    index: usize,
    task: JoinHandle<()>,
}

type ArmedMap = Arc<Mutex<HashMap<RoomCode, ArmedRound>>>;

/// Owns one cancellable deadline task per room.
///
/// Cheap to clone; all clones share the same armed-round table and feed
/// the same expiry channel.
#[derive(Clone)]
pub struct RoundScheduler {
    config: RoundConfig,
    expiry_tx: mpsc::UnboundedSender<RoundExpiry>,
    armed: ArmedMap,
}

impl RoundScheduler {
    /// Creates a scheduler and the receiving end of its expiry channel.
    pub fn new(config: RoundConfig) -> (Self, mpsc::UnboundedReceiver<RoundExpiry>) {
        let (expiry_tx, expiry_rx) = mpsc::unbounded_channel();
        (
            Self {
                config,
                expiry_tx,
                armed: Arc::new(Mutex::new(HashMap::new())),
            },
            expiry_rx,
        )
    }

    /// The configured round duration.
    pub fn question_duration(&self) -> Duration {
        self.config.question_duration
    }

    /// Arms the deadline for `(code, index)`, firing after `remaining`.
    ///
    /// Any previously armed round for the same room is aborted first:
    /// one room, one deadline.
    pub fn arm(&self, code: RoomCode, index: usize, remaining: Duration) {
        let task = {
            let code = code.clone();
            let tx = self.expiry_tx.clone();
            let armed = Arc::clone(&self.armed);
            tokio::spawn(async move {
                tokio::time::sleep(remaining).await;
                trace!(%code, index, "round deadline elapsed");
                // Drop our own entry before notifying, so a consumer that
                // immediately re-arms doesn't abort the wrong task.
                {
                    let mut map = armed.lock().expect("armed map poisoned");
                    if map.get(&code).is_some_and(|r| r.index == index) {
                        map.remove(&code);
                    }
                }
                let _ = tx.send(RoundExpiry { code, index });
            })
        };

        let mut map = self.armed.lock().expect("armed map poisoned");
        if let Some(previous) = map.insert(code.clone(), ArmedRound { index, task }) {
            previous.task.abort();
            debug!(%code, replaced = previous.index, index, "re-armed round deadline");
        } else {
            debug!(%code, index, "armed round deadline");
        }
    }

    /// Arms the deadline for `(code, index)` from the persisted question
    /// start timestamp. This is the restart-recovery path: remaining time
    /// is recomputed from storage, and an already-elapsed deadline fires
    /// immediately.
    pub fn arm_from_start(&self, code: RoomCode, index: usize, started_at_ms: u64, now_ms: u64) {
        let remaining = self.remaining_after(started_at_ms, now_ms);
        self.arm(code, index, remaining);
    }

    /// How much of the round window is left, given when the question
    /// started and what time it is now. Saturates at zero.
    pub fn remaining_after(&self, started_at_ms: u64, now_ms: u64) -> Duration {
        let deadline_ms = started_at_ms + self.config.question_duration.as_millis() as u64;
        Duration::from_millis(deadline_ms.saturating_sub(now_ms))
    }

    /// Cancels the armed deadline for a room, if any. Idempotent.
    pub fn cancel(&self, code: &RoomCode) {
        let mut map = self.armed.lock().expect("armed map poisoned");
        if let Some(round) = map.remove(code) {
            round.task.abort();
            debug!(%code, index = round.index, "cancelled round deadline");
        }
    }

    /// The question index currently armed for a room, if any.
    pub fn armed_index(&self, code: &RoomCode) -> Option<usize> {
        self.armed
            .lock()
            .expect("armed map poisoned")
            .get(code)
            .map(|r| r.index)
    }

    /// Number of rooms with an armed deadline.
    pub fn armed_count(&self) -> usize {
        self.armed.lock().expect("armed map poisoned").len()
    }
}
