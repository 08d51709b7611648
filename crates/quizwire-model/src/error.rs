//! Error types for document validation.

/// Errors raised while constructing or parsing document types.
#[derive(Debug, thiserror::Error)]
pub enum ModelError {
    /// The string is not a valid room code.
    /// Codes are exactly 4 characters from the alphabet `A–Z0–9`.
    #[error("invalid room code {0:?}: expected 4 characters from A-Z0-9")]
    InvalidRoomCode(String),

    /// A question was built with empty question text.
    #[error("question text must not be empty")]
    EmptyQuestionText,

    /// A question was built with an empty correct answer.
    #[error("correct answer must not be empty")]
    EmptyAnswer,

    /// A question was built with more distractors than the option list
    /// can hold (the correct answer plus up to 4 distractors).
    #[error("too many distractors: {0} (maximum 4)")]
    TooManyDistractors(usize),

    /// A distractor is identical to the correct answer, which would make
    /// the correct answer appear more than once among the options.
    #[error("distractor duplicates the correct answer: {0:?}")]
    DuplicateAnswer(String),
}
