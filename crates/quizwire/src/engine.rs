//! The engine facade: one handle that ties every layer together.
//!
//! `QuizEngine` wires the room registry, the session store, the round
//! scheduler, and the scoring config behind a small set of operations:
//! one method per thing a host or player can do. It also runs the expiry
//! pump: a background task that turns round deadlines into reveal
//! triggers.
//!
//! Reveal has two triggers and both land here: the answer quorum (checked
//! after every accepted answer) and the deadline (delivered by the pump).
//! Whichever fires first wins; the loser is a no-op because
//! [`Session::reveal`](quizwire_session::Session::reveal) is idempotent.

use std::sync::{Arc, Weak};

use tokio::sync::broadcast;
use tracing::{debug, info};

use quizwire_model::{ClientId, Player, Question, RoomCode};
use quizwire_round::{RoundConfig, RoundExpiry, RoundScheduler};
use quizwire_room::{RegistryConfig, RoomRegistry};
use quizwire_session::{Advance, Clock, RevealOutcome, ScoringConfig, SessionStatus};
use quizwire_store::{ChangeEvent, SessionStore, SessionView};

use crate::bank::{load_with_retry, QuestionBank, RetryPolicy};
use crate::QuizError;

/// Engine-wide settings.
///
/// The round duration lives inside [`ScoringConfig`]: the scoring decay
/// and the reveal deadline are the same window by construction, so the
/// two can never drift apart.
#[derive(Debug, Clone, Default)]
pub struct EngineConfig {
    /// Scoring curve and round duration.
    pub scoring: ScoringConfig,
    /// Code allocation and idle-expiry settings.
    pub registry: RegistryConfig,
}

struct EngineInner<S> {
    store: Arc<S>,
    registry: RoomRegistry<S>,
    rounds: RoundScheduler,
    clock: Arc<dyn Clock>,
    scoring: ScoringConfig,
}

/// The session engine. Cheap to clone; all clones share one set of
/// internals, so the handle can be passed freely to whatever façade
/// (HTTP, WebSocket, CLI) is driving it.
pub struct QuizEngine<S> {
    inner: Arc<EngineInner<S>>,
}

impl<S> Clone for QuizEngine<S> {
    fn clone(&self) -> Self {
        Self {
            inner: Arc::clone(&self.inner),
        }
    }
}

impl<S: SessionStore> QuizEngine<S> {
    /// Builds an engine over the given store and clock, and spawns the
    /// expiry pump. Must be called inside a tokio runtime.
    pub fn new(store: S, clock: Arc<dyn Clock>, config: EngineConfig) -> Self {
        let store = Arc::new(store);
        let (rounds, expiry_rx) = RoundScheduler::new(RoundConfig {
            question_duration: config.scoring.question_duration,
        });
        let registry = RoomRegistry::new(
            Arc::clone(&store),
            Arc::clone(&clock),
            config.registry,
        );
        let inner = Arc::new(EngineInner {
            store,
            registry,
            rounds,
            clock,
            scoring: config.scoring,
        });

        spawn_expiry_pump(Arc::downgrade(&inner), expiry_rx);
        Self { inner }
    }

    // -- Session lifecycle -------------------------------------------------

    /// Creates a session and seats `host` as its first player.
    pub async fn create_session(
        &self,
        host: ClientId,
        host_name: &str,
    ) -> Result<RoomCode, QuizError> {
        Ok(self.inner.registry.create(host, host_name).await?)
    }

    /// Seats a player in a session, or returns their existing record
    /// (the reconnect path).
    pub async fn join(
        &self,
        code: &RoomCode,
        id: ClientId,
        name: impl Into<String> + Send,
    ) -> Result<Player, QuizError> {
        let name = name.into();
        let player = self
            .inner
            .store
            .with_roster(code, move |session, roster| session.join(roster, id, name))
            .await??;
        Ok(player)
    }

    /// Replaces the session's question list (host only).
    pub async fn load_questions(
        &self,
        code: &RoomCode,
        caller: &ClientId,
        questions: Vec<Question>,
    ) -> Result<(), QuizError> {
        let now = self.inner.clock.now_ms();
        let caller = caller.clone();
        self.inner
            .store
            .with_session(code, move |session, _roster| {
                session.load_questions(&caller, questions, now)
            })
            .await??;
        Ok(())
    }

    /// Loads questions from a provider with bounded-backoff retry, then
    /// installs them in the session. Returns how many were loaded.
    pub async fn load_from_bank<B: QuestionBank>(
        &self,
        code: &RoomCode,
        caller: &ClientId,
        bank: &B,
        policy: &RetryPolicy,
    ) -> Result<usize, QuizError> {
        let questions = load_with_retry(bank, policy).await?;
        let count = questions.len();
        self.load_questions(code, caller, questions).await?;
        Ok(count)
    }

    /// Discards the question list (host only).
    pub async fn clear_questions(
        &self,
        code: &RoomCode,
        caller: &ClientId,
    ) -> Result<(), QuizError> {
        let now = self.inner.clock.now_ms();
        let caller = caller.clone();
        self.inner
            .store
            .with_session(code, move |session, _roster| {
                session.clear_questions(&caller, now)
            })
            .await??;
        Ok(())
    }

    /// Starts the game (host only) and arms question 0's deadline.
    pub async fn start(&self, code: &RoomCode, caller: &ClientId) -> Result<(), QuizError> {
        let now = self.inner.clock.now_ms();
        let caller = caller.clone();
        self.inner
            .store
            .with_session(code, move |session, roster| {
                session.start(&caller, roster, now)
            })
            .await??;

        self.inner
            .rounds
            .arm(code.clone(), 0, self.inner.rounds.question_duration());
        Ok(())
    }

    /// Records a player's answer, then reveals early if every non-host
    /// player has now answered.
    pub async fn submit_answer(
        &self,
        code: &RoomCode,
        caller: &ClientId,
        choice: impl Into<String> + Send,
    ) -> Result<(), QuizError> {
        let now = self.inner.clock.now_ms();
        let choice = choice.into();
        self.inner
            .store
            .with_player(code, caller, move |session, player| {
                session.submit_answer(player, choice, now)
            })
            .await??;

        // Quorum check on the committed state. Racing the deadline here
        // is fine; reveal is idempotent, first trigger wins.
        let view = self.inner.store.snapshot(code).await?;
        if view.session.status() == SessionStatus::Playing && !view.session.is_revealed() {
            if let Some(index) = view.session.current_index() {
                if view.roster.all_non_hosts_answered(index) {
                    debug!(%code, index, "all players answered, revealing early");
                    self.reveal(code, index).await?;
                }
            }
        }
        Ok(())
    }

    /// Reveals the question at `index` and scores it, exactly once.
    ///
    /// Safe to call from anywhere, any number of times: stale indices and
    /// repeats are no-ops. On the first (effective) reveal the pending
    /// deadline is cancelled.
    pub async fn reveal(
        &self,
        code: &RoomCode,
        index: usize,
    ) -> Result<RevealOutcome, QuizError> {
        let scoring = self.inner.scoring.clone();
        let outcome = self
            .inner
            .store
            .with_session(code, move |session, roster| {
                session.reveal(index, roster, &scoring)
            })
            .await?;

        if outcome == RevealOutcome::Revealed {
            self.inner.rounds.cancel(code);
        }
        Ok(outcome)
    }

    /// Advances to the next question (host only), re-arming the deadline,
    /// or ends play in Results when no question remains.
    pub async fn advance(&self, code: &RoomCode, caller: &ClientId) -> Result<Advance, QuizError> {
        let now = self.inner.clock.now_ms();
        let caller = caller.clone();
        let outcome = self
            .inner
            .store
            .with_session(code, move |session, roster| {
                session.advance(&caller, roster, now)
            })
            .await??;

        match outcome {
            Advance::NextQuestion(index) => {
                self.inner
                    .rounds
                    .arm(code.clone(), index, self.inner.rounds.question_duration());
            }
            Advance::Finished => self.inner.rounds.cancel(code),
        }
        Ok(outcome)
    }

    /// Ends the session (host only): cancels any pending deadline and
    /// deletes the session with every player record.
    pub async fn end_game(&self, code: &RoomCode, caller: &ClientId) -> Result<(), QuizError> {
        let view = self.inner.store.snapshot(code).await?;
        view.session.authorize_host(caller)?;

        self.inner.rounds.cancel(code);
        self.inner.registry.remove(code).await?;
        Ok(())
    }

    /// Restart recovery: re-arms the active question's deadline from the
    /// *persisted* start timestamp. An already-elapsed deadline fires
    /// immediately (and reveals through the pump).
    pub async fn recover(&self, code: &RoomCode) -> Result<(), QuizError> {
        let view = self.inner.store.snapshot(code).await?;
        let session = &view.session;
        if session.status() == SessionStatus::Playing && !session.is_revealed() {
            if let (Some(index), Some(started)) =
                (session.current_index(), session.question_started_at_ms())
            {
                let now = self.inner.clock.now_ms();
                self.inner
                    .rounds
                    .arm_from_start(code.clone(), index, started, now);
                info!(%code, index, "re-armed round deadline after restart");
            }
        }
        Ok(())
    }

    // -- Read surface ------------------------------------------------------

    /// A consistent snapshot of one session and its players.
    pub async fn session_view(&self, code: &RoomCode) -> Result<SessionView, QuizError> {
        Ok(self.inner.registry.lookup(code).await?)
    }

    /// Subscribes to the session's change feed (full-snapshot versions,
    /// at-least-once; resync via [`Self::session_view`] after a lag).
    pub async fn subscribe(
        &self,
        code: &RoomCode,
    ) -> Result<broadcast::Receiver<ChangeEvent>, QuizError> {
        Ok(self.inner.store.subscribe(code).await?)
    }

    // -- Maintenance -------------------------------------------------------

    /// Deletes idle sessions and cancels their timers. Returns the codes
    /// that were expired. Call periodically from a maintenance task.
    pub async fn expire_idle_rooms(&self) -> Vec<RoomCode> {
        let expired = self.inner.registry.expire_idle().await;
        for code in &expired {
            self.inner.rounds.cancel(code);
        }
        expired
    }
}

/// Drains round expiries into reveal calls until every engine handle is
/// gone (the `Weak` stops upgrading and the channel closes).
fn spawn_expiry_pump<S: SessionStore>(
    inner: Weak<EngineInner<S>>,
    mut expiry_rx: tokio::sync::mpsc::UnboundedReceiver<RoundExpiry>,
) {
    tokio::spawn(async move {
        while let Some(RoundExpiry { code, index }) = expiry_rx.recv().await {
            let Some(inner) = inner.upgrade() else { break };
            let engine = QuizEngine { inner };
            match engine.reveal(&code, index).await {
                Ok(outcome) => {
                    debug!(%code, index, ?outcome, "deadline reveal processed")
                }
                // The session may be gone (ended/expired) by the time its
                // deadline fires; that is not a fault.
                Err(err) => debug!(%code, index, %err, "deadline reveal skipped"),
            }
        }
    });
}
