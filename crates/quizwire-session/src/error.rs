//! Error types for game-rule violations.

/// Errors raised by session transitions and player operations.
///
/// These are all terminal for the operation that raised them: a caller
/// retrying a `NotHost` or `Precondition` error will get the same answer
/// until the state actually changes. Nothing here is a transport or
/// storage fault.
#[derive(Debug, thiserror::Error)]
pub enum GameError {
    /// A session-wide mutation was attempted by someone other than the
    /// host identity recorded at creation.
    #[error("only the host may drive the session")]
    NotHost,

    /// The host tried to submit an answer. The host drives rounds and is
    /// excluded from the answer quorum and from scoring, so a host answer
    /// could never take effect; it is rejected loudly instead of ignored.
    #[error("the host does not answer questions")]
    HostCannotAnswer,

    /// A transition's guard failed: starting without enough players or
    /// questions, advancing before the reveal, answering outside play.
    #[error("precondition failed: {0}")]
    Precondition(&'static str),

    /// A join was attempted after play started. Players can only join
    /// while the session is in Lobby or Upload.
    #[error("the game is already in progress")]
    GameInProgress,

    /// A second answer was submitted for the same question. The first
    /// write wins; later writes are rejected, never merged.
    #[error("an answer was already submitted for this question")]
    AlreadyAnswered,
}
