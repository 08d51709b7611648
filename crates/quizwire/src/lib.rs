//! # Quizwire
//!
//! Host-driven trivia session engine. One host controls round progression,
//! N players answer synchronized questions, and a time-decay scoring engine
//! settles points at each reveal.
//!
//! The engine is server-authoritative and storage-agnostic: all shared
//! state lives behind the [`SessionStore`] contract (an in-process
//! [`MemoryStore`] ships for tests and single-host play), session-wide
//! fields are mutated only by the host's guarded transitions, and every
//! repeatable trigger (reveal, scoring) is idempotent so duplicate change
//! deliveries are harmless.
//!
//! ## Quick start
//!
//! ```rust,no_run
//! use std::sync::Arc;
//! use quizwire::prelude::*;
//!
//! # async fn demo() -> Result<(), quizwire::QuizError> {
//! let engine = QuizEngine::new(
//!     MemoryStore::new(),
//!     Arc::new(SystemClock),
//!     EngineConfig::default(),
//! );
//!
//! let host = ClientId::new("host-token");
//! let code = engine.create_session(host.clone(), "Quizmaster").await?;
//! engine.join(&code, ClientId::new("p1"), "Ada").await?;
//! engine.join(&code, ClientId::new("p2"), "Grace").await?;
//! // load questions from a provider, then:
//! engine.start(&code, &host).await?;
//! # Ok(())
//! # }
//! ```

mod bank;
mod engine;
mod error;

pub use bank::{load_with_retry, ProviderError, QuestionBank, RetryPolicy, StaticBank};
pub use engine::{EngineConfig, QuizEngine};
pub use error::QuizError;

pub use quizwire_model::{
    ClientId, ModelError, Player, PlayerAnswer, Question, QuestionId, RoomCode, Roster,
};
pub use quizwire_room::{RegistryConfig, RegistryError, RoomRegistry};
pub use quizwire_round::{RoundConfig, RoundExpiry, RoundScheduler};
pub use quizwire_session::{
    score_for_response, Advance, Clock, GameError, ManualClock, RevealOutcome, ScoringConfig,
    Session, SessionStatus, SystemClock,
};
pub use quizwire_store::{ChangeEvent, MemoryStore, SessionStore, SessionView, StoreError};

/// The types most callers need, in one import.
pub mod prelude {
    pub use crate::{
        Advance, ChangeEvent, ClientId, Clock, EngineConfig, MemoryStore, Player, Question,
        QuestionBank, QuestionId, QuizEngine, QuizError, RevealOutcome, RoomCode, SessionStatus,
        SessionStore, SessionView, StaticBank, SystemClock,
    };
}

/// Installs a `tracing` subscriber reading `RUST_LOG`, defaulting to
/// `info`. Safe to call more than once; later calls are no-ops.
pub fn init_tracing() {
    use tracing_subscriber::EnvFilter;

    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    let _ = tracing_subscriber::fmt().with_env_filter(filter).try_init();
}
