//! Question providers.
//!
//! Quizwire doesn't parse CSV files or prompt a model for questions;
//! that's the question source's job (a file importer, an AI generator, a
//! fixed pack). The engine only defines the [`QuestionBank`] trait: one
//! async method returning a validated, ordered question list. Because the
//! list is made of [`Question`] values, the "correct answer appears
//! exactly once among the options" invariant is already guaranteed by
//! construction; a provider physically cannot return a malformed one.
//!
//! Provider failures are the one retryable error class in the system;
//! [`load_with_retry`] wraps any bank in bounded exponential backoff.

use std::time::Duration;

use tracing::warn;

use quizwire_model::Question;

/// Errors a question provider can raise.
#[derive(Debug, thiserror::Error)]
pub enum ProviderError {
    /// The source could not be reached or timed out. Worth retrying.
    #[error("question source unavailable: {0}")]
    Unavailable(String),

    /// The source answered with data that could not be turned into
    /// questions (bad rows, empty file, generation refusal).
    #[error("question source returned invalid data: {0}")]
    Invalid(String),
}

/// Supplies an ordered, immutable list of questions.
///
/// # Example
///
/// ```rust
/// use quizwire::{ProviderError, Question, QuestionBank};
///
/// /// Serves a fixed pack. Fine for tests and hot-seat play.
/// struct PackOfOne(Question);
///
/// impl QuestionBank for PackOfOne {
///     async fn load(&self) -> Result<Vec<Question>, ProviderError> {
///         Ok(vec![self.0.clone()])
///     }
/// }
/// ```
#[allow(async_fn_in_trait)]
pub trait QuestionBank: Send + Sync + 'static {
    /// Produces the question list, in play order.
    async fn load(&self) -> Result<Vec<Question>, ProviderError>;
}

/// A bank that serves a fixed, pre-built list.
///
/// This is the development/test provider, and also what a caller uses
/// after importing questions through some external pipeline.
#[derive(Debug, Clone)]
pub struct StaticBank(Vec<Question>);

impl StaticBank {
    /// Wraps an already-validated question list.
    pub fn new(questions: Vec<Question>) -> Self {
        Self(questions)
    }
}

impl QuestionBank for StaticBank {
    async fn load(&self) -> Result<Vec<Question>, ProviderError> {
        Ok(self.0.clone())
    }
}

/// Bounded exponential backoff settings for provider retries.
#[derive(Debug, Clone)]
pub struct RetryPolicy {
    /// Total attempts, including the first. Must be at least 1.
    pub attempts: u32,
    /// Delay before the second attempt; doubles each retry.
    pub base_delay: Duration,
    /// Ceiling on the between-attempt delay.
    pub max_delay: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            attempts: 3,
            base_delay: Duration::from_millis(250),
            max_delay: Duration::from_secs(5),
        }
    }
}

/// Loads from a bank, retrying failures with bounded exponential backoff.
///
/// Only provider errors are retried this way; everything the engine itself
/// raises is terminal for its operation and never comes through here.
pub async fn load_with_retry<B: QuestionBank>(
    bank: &B,
    policy: &RetryPolicy,
) -> Result<Vec<Question>, ProviderError> {
    let attempts = policy.attempts.max(1);
    let mut delay = policy.base_delay;
    let mut last_err = None;

    for attempt in 1..=attempts {
        match bank.load().await {
            Ok(questions) => return Ok(questions),
            Err(err) => {
                warn!(attempt, %err, "question bank load failed");
                last_err = Some(err);
                if attempt < attempts {
                    tokio::time::sleep(delay).await;
                    delay = (delay * 2).min(policy.max_delay);
                }
            }
        }
    }
    Err(last_err.expect("at least one attempt ran"))
}

// =========================================================================
// Tests
// =========================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicU32, Ordering};
    use tokio::time::Instant;

    use quizwire_model::QuestionId;

    fn question() -> Question {
        Question::new(
            QuestionId(1),
            "2 + 2?",
            "4",
            vec!["3".into()],
            &mut rand::rng(),
        )
        .unwrap()
    }

    /// Fails `failures` times, then succeeds. Counts calls.
    struct FlakyBank {
        failures: u32,
        calls: AtomicU32,
    }

    impl FlakyBank {
        fn new(failures: u32) -> Self {
            Self {
                failures,
                calls: AtomicU32::new(0),
            }
        }
    }

    impl QuestionBank for FlakyBank {
        async fn load(&self) -> Result<Vec<Question>, ProviderError> {
            let call = self.calls.fetch_add(1, Ordering::SeqCst);
            if call < self.failures {
                Err(ProviderError::Unavailable(format!("outage {call}")))
            } else {
                Ok(vec![question()])
            }
        }
    }

    #[tokio::test]
    async fn test_static_bank_serves_its_list() {
        let bank = StaticBank::new(vec![question(), question()]);
        let questions = bank.load().await.unwrap();
        assert_eq!(questions.len(), 2);
    }

    #[tokio::test(start_paused = true)]
    async fn test_load_with_retry_succeeds_after_transient_failures() {
        let bank = FlakyBank::new(2);
        let questions = load_with_retry(&bank, &RetryPolicy::default())
            .await
            .unwrap();
        assert_eq!(questions.len(), 1);
        assert_eq!(bank.calls.load(Ordering::SeqCst), 3);
    }

    #[tokio::test(start_paused = true)]
    async fn test_load_with_retry_gives_up_after_bounded_attempts() {
        let bank = FlakyBank::new(u32::MAX);
        let result = load_with_retry(&bank, &RetryPolicy::default()).await;
        assert!(matches!(result, Err(ProviderError::Unavailable(_))));
        assert_eq!(bank.calls.load(Ordering::SeqCst), 3, "exactly 3 attempts");
    }

    #[tokio::test(start_paused = true)]
    async fn test_load_with_retry_backoff_doubles_between_attempts() {
        // 250 ms + 500 ms of backoff across 3 attempts = 750 ms total.
        let bank = FlakyBank::new(u32::MAX);
        let before = Instant::now();
        let _ = load_with_retry(&bank, &RetryPolicy::default()).await;
        assert_eq!(before.elapsed(), Duration::from_millis(750));
    }

    #[tokio::test(start_paused = true)]
    async fn test_load_with_retry_caps_delay_at_max() {
        let policy = RetryPolicy {
            attempts: 4,
            base_delay: Duration::from_secs(4),
            max_delay: Duration::from_secs(5),
        };
        // Delays: 4 s, then min(8, 5) = 5 s, then 5 s → 14 s total.
        let bank = FlakyBank::new(u32::MAX);
        let before = Instant::now();
        let _ = load_with_retry(&bank, &policy).await;
        assert_eq!(before.elapsed(), Duration::from_secs(14));
    }

    #[tokio::test]
    async fn test_load_with_retry_zero_attempts_still_tries_once() {
        let bank = FlakyBank::new(0);
        let policy = RetryPolicy {
            attempts: 0,
            ..RetryPolicy::default()
        };
        let questions = load_with_retry(&bank, &policy).await.unwrap();
        assert_eq!(questions.len(), 1);
    }
}
