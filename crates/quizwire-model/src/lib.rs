//! Shared document types for Quizwire.
//!
//! Everything in this crate is data that lives in the shared session store:
//! identities, room codes, questions, and player records. The types here
//! carry their own validation (a [`Question`] can only be built with the
//! correct answer appearing exactly once among its options; a [`RoomCode`]
//! is always 4 characters from the fixed alphabet) so the layers above never
//! have to re-check document shape.
//!
//! # Key types
//!
//! - [`ClientId`] — opaque stable identity token from the identity provider
//! - [`RoomCode`] — 4-character human-typeable room code
//! - [`Question`] — one trivia question with a pre-shuffled option list
//! - [`Player`] — per-session player record (name, score, current answer)
//! - [`Roster`] — the per-session map of players with the queries the
//!   state machine needs

mod error;
mod identity;
mod player;
mod question;

pub use error::ModelError;
pub use identity::{ClientId, RoomCode, CODE_ALPHABET, CODE_LEN};
pub use player::{Player, PlayerAnswer, Roster};
pub use question::{Question, QuestionId};
