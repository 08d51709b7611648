//! Question documents: text, correct answer, and a pre-shuffled option list.

use std::fmt;

use rand::Rng;
use rand::seq::SliceRandom;
use serde::{Deserialize, Serialize};

use crate::ModelError;

/// A unique identifier for a question, assigned by the question provider.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct QuestionId(pub u64);

impl fmt::Display for QuestionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Q-{}", self.0)
    }
}

/// One trivia question.
///
/// The option list holds the correct answer plus up to 4 distractors. Its
/// order is randomized exactly once, at construction, and is immutable for
/// the life of the question; every client sees the same option order, and
/// re-reading the document never reshuffles. The fields are private so no
/// layer above can edit the list after the shuffle.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Question {
    id: QuestionId,
    text: String,
    answer: String,
    options: Vec<String>,
}

impl Question {
    /// Maximum number of distractors next to the correct answer.
    pub const MAX_DISTRACTORS: usize = 4;

    /// Builds a question, validating its shape and shuffling the options.
    ///
    /// Validation guarantees the invariant the scoring engine relies on:
    /// the correct answer appears exactly once among the options.
    ///
    /// # Errors
    /// - [`ModelError::EmptyQuestionText`] / [`ModelError::EmptyAnswer`]
    ///   for blank inputs
    /// - [`ModelError::TooManyDistractors`] beyond [`Self::MAX_DISTRACTORS`]
    /// - [`ModelError::DuplicateAnswer`] if a distractor equals the answer
    pub fn new(
        id: QuestionId,
        text: impl Into<String>,
        answer: impl Into<String>,
        distractors: Vec<String>,
        rng: &mut impl Rng,
    ) -> Result<Self, ModelError> {
        let text = text.into();
        let answer = answer.into();

        if text.trim().is_empty() {
            return Err(ModelError::EmptyQuestionText);
        }
        if answer.trim().is_empty() {
            return Err(ModelError::EmptyAnswer);
        }
        if distractors.len() > Self::MAX_DISTRACTORS {
            return Err(ModelError::TooManyDistractors(distractors.len()));
        }
        if let Some(dup) = distractors.iter().find(|d| **d == answer) {
            return Err(ModelError::DuplicateAnswer(dup.clone()));
        }

        let mut options = Vec::with_capacity(distractors.len() + 1);
        options.push(answer.clone());
        options.extend(distractors);
        options.shuffle(rng);

        Ok(Self {
            id,
            text,
            answer,
            options,
        })
    }

    /// The provider-assigned identifier.
    pub fn id(&self) -> QuestionId {
        self.id
    }

    /// The question text shown to players.
    pub fn text(&self) -> &str {
        &self.text
    }

    /// The correct answer. Presentation layers must not leak this before
    /// the reveal; the engine only compares against it.
    pub fn answer(&self) -> &str {
        &self.answer
    }

    /// The options in their fixed, shuffled order.
    pub fn options(&self) -> &[String] {
        &self.options
    }

    /// Whether a submitted choice matches the correct answer.
    pub fn is_correct(&self, choice: &str) -> bool {
        self.answer == choice
    }
}

// =========================================================================
// Tests
// =========================================================================
