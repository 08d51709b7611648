//! Error types for the room registry.

use quizwire_model::RoomCode;
use quizwire_store::StoreError;

/// Errors that can occur during registry operations.
#[derive(Debug, thiserror::Error)]
pub enum RegistryError {
    /// No live session owns this code.
    #[error("no live session with code {0}")]
    NotFound(RoomCode),

    /// Every generated code collided with a live session. With a 36^4
    /// code space this means the deployment is running far too many
    /// concurrent rooms for 4-character codes.
    #[error("room code space exhausted after {0} attempts")]
    CodesExhausted(usize),

    /// The store failed in some way other than a missing session.
    #[error(transparent)]
    Store(StoreError),
}

impl From<StoreError> for RegistryError {
    fn from(err: StoreError) -> Self {
        match err {
            StoreError::NotFound(code) => Self::NotFound(code),
            other => Self::Store(other),
        }
    }
}
