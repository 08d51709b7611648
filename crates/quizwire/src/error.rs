//! Unified error type for the Quizwire engine.

use quizwire_room::RegistryError;
use quizwire_session::GameError;
use quizwire_store::StoreError;

use crate::bank::ProviderError;

/// Top-level error that wraps all layer-specific errors.
///
/// Callers of the `quizwire` facade deal with this single type; the
/// `#[from]` impls let the engine use `?` across layer boundaries. Game
/// and registry errors are terminal for the operation that raised them;
/// only provider errors are worth retrying, and
/// [`load_with_retry`](crate::load_with_retry) already does that.
#[derive(Debug, thiserror::Error)]
pub enum QuizError {
    /// A game-rule violation (authorization, precondition, replay).
    #[error(transparent)]
    Game(#[from] GameError),

    /// A registry-level failure (unknown code, code space exhausted).
    #[error(transparent)]
    Registry(#[from] RegistryError),

    /// A store-level failure (unknown code, missing player record).
    #[error(transparent)]
    Store(#[from] StoreError),

    /// The question provider failed.
    #[error(transparent)]
    Provider(#[from] ProviderError),
}

#[cfg(test)]
mod tests {
    use super::*;
    use quizwire_model::RoomCode;

    #[test]
    fn test_from_game_error() {
        let err: QuizError = GameError::NotHost.into();
        assert!(matches!(err, QuizError::Game(_)));
        assert!(err.to_string().contains("host"));
    }

    #[test]
    fn test_from_registry_error() {
        let err: QuizError = RegistryError::CodesExhausted(16).into();
        assert!(matches!(err, QuizError::Registry(_)));
        assert!(err.to_string().contains("16"));
    }

    #[test]
    fn test_from_store_error() {
        let code = RoomCode::parse("AB12").unwrap();
        let err: QuizError = StoreError::NotFound(code).into();
        assert!(matches!(err, QuizError::Store(_)));
        assert!(err.to_string().contains("AB12"));
    }

    #[test]
    fn test_from_provider_error() {
        let err: QuizError = ProviderError::Unavailable("timeout".into()).into();
        assert!(matches!(err, QuizError::Provider(_)));
        assert!(err.to_string().contains("timeout"));
    }
}
