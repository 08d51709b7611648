//! Error types for the store layer.

use quizwire_model::{ClientId, RoomCode};

/// Errors raised by [`SessionStore`](crate::SessionStore) operations.
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    /// No live session owns this code. Either it never existed or it has
    /// already been deleted (host "end" or idle expiry).
    #[error("no live session with code {0}")]
    NotFound(RoomCode),

    /// A session with this code is already live. The registry reacts by
    /// regenerating a fresh code and retrying.
    #[error("room code {0} is already taken")]
    CodeTaken(RoomCode),

    /// The session exists but holds no record for this identity. Raised
    /// by the player scope; joining is what creates the record.
    #[error("no player record for {1} in session {0}")]
    PlayerNotFound(RoomCode, ClientId),
}
