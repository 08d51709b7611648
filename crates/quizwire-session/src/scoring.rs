//! The time-decay scoring engine.
//!
//! A correct answer is worth between `min_points` and `max_points`,
//! falling linearly with response time over the question duration:
//!
//! ```text
//! score(t) = clamp(MAX − (MAX − MIN) · min(t / D, 1), MIN, MAX)
//! ```
//!
//! Answering instantly earns the full `MAX`; answering at (or beyond) the
//! deadline still earns `MIN`. Incorrect or absent answers earn nothing;
//! that zero is decided by [`award`], not by the curve.

use std::time::Duration;

use quizwire_model::{PlayerAnswer, Question};

/// Scoring parameters for one session.
#[derive(Debug, Clone)]
pub struct ScoringConfig {
    /// Points for an instantaneous correct answer.
    pub max_points: u64,
    /// Floor for any correct answer, however slow.
    pub min_points: u64,
    /// The window the decay is spread over (the round duration).
    pub question_duration: Duration,
}

impl Default for ScoringConfig {
    fn default() -> Self {
        Self {
            max_points: 1_000,
            min_points: 500,
            question_duration: Duration::from_secs(30),
        }
    }
}

/// Points for a correct answer with the given response time.
///
/// `None` means the answer carried no timestamp; it earns the floor.
/// The result is rounded to the nearest point and always lands in
/// `[min_points, max_points]`.
pub fn score_for_response(cfg: &ScoringConfig, response_time: Option<Duration>) -> u64 {
    let Some(rt) = response_time else {
        return cfg.min_points;
    };
    let duration = cfg.question_duration.as_secs_f64();
    if duration <= 0.0 {
        return cfg.min_points;
    }
    let fraction = (rt.as_secs_f64() / duration).min(1.0);
    let span = cfg.max_points.saturating_sub(cfg.min_points) as f64;
    let raw = cfg.max_points as f64 - span * fraction;
    (raw.round() as u64).clamp(cfg.min_points, cfg.max_points)
}

/// Points one submitted answer earns against one question.
///
/// Incorrect choices earn 0. Response time is measured from the persisted
/// question start; an answer timestamped *before* the start (clock skew
/// between writers) saturates to an instantaneous response rather than
/// underflowing.
pub fn award(
    cfg: &ScoringConfig,
    question: &Question,
    question_started_at_ms: Option<u64>,
    answer: &PlayerAnswer,
) -> u64 {
    if !question.is_correct(&answer.choice) {
        return 0;
    }
    let response_time = match (answer.submitted_at_ms, question_started_at_ms) {
        (Some(at), Some(started)) => Some(Duration::from_millis(at.saturating_sub(started))),
        _ => None,
    };
    score_for_response(cfg, response_time)
}

// =========================================================================
// Tests
// =========================================================================
