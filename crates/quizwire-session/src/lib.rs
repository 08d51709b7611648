//! Session state machine, answer handling, and scoring for Quizwire.
//!
//! The [`Session`] aggregate is the single writer of session-wide state:
//! every mutation is a named transition with explicit guards, and the host
//! identity recorded at creation is checked on each one. Player-side
//! operations ([`Session::join`], [`Session::submit_answer`]) take the
//! session read-only and mutate exactly one player record.
//!
//! This crate is deliberately free of async: the aggregate is plain
//! synchronous logic so the store can execute transitions inside its
//! atomic update closures.
//!
//! # Key types
//!
//! - [`Session`] — the aggregate and its transition methods
//! - [`SessionStatus`] — lifecycle state machine (Lobby → Upload → Playing → Results)
//! - [`ScoringConfig`] / [`score_for_response`] — the time-decay scoring engine
//! - [`Clock`] — injectable time source ([`SystemClock`], [`ManualClock`])
//! - [`GameError`] — rule violations (authorization, preconditions, replays)

mod clock;
mod error;
mod scoring;
mod session;
mod status;

pub use clock::{Clock, ManualClock, SystemClock};
pub use error::GameError;
pub use scoring::{award, score_for_response, ScoringConfig};
pub use session::{Advance, RevealOutcome, Session};
pub use status::SessionStatus;
