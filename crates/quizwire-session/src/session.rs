//! The Session aggregate: sole writer of session-wide state.
//!
//! Every session-wide field lives behind this type and changes only through
//! a named transition. Each transition re-checks its guards at the moment it
//! runs, so the aggregate stays correct no matter how callers interleave;
//! the store executes these methods inside atomic update closures, and the
//! guards are the whole concurrency story for session-wide state.

use std::time::Duration;

use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use quizwire_model::{ClientId, Player, PlayerAnswer, Question, RoomCode, Roster};

use crate::{scoring, GameError, ScoringConfig, SessionStatus};

/// What an `advance` transition did.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Advance {
    /// Play moved to the question at this index.
    NextQuestion(usize),
    /// No further question existed; the session is now in Results.
    Finished,
}

/// What a `reveal` trigger did.
///
/// Reveal triggers arrive from two sources (answer quorum, deadline timer)
/// and may be re-delivered by the change feed; the outcome says which of
/// those deliveries actually took effect.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RevealOutcome {
    /// This trigger performed the reveal and scored the question.
    Revealed,
    /// The question was already revealed; nothing happened.
    AlreadyRevealed,
    /// The trigger referred to a question that is no longer (or not yet)
    /// active, from a stale timer or an out-of-date observer. Nothing happened.
    Stale,
}

/// One game session: room state, question list, and round progress.
///
/// Fields are private; the transition methods are the only write surface.
/// The struct serializes as the session document the store holds.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Session {
    code: RoomCode,
    host: ClientId,
    status: SessionStatus,
    questions: Vec<Question>,
    /// `None` until play starts (the wire-level −1).
    current_index: Option<usize>,
    /// When the current question was activated, epoch ms. `None` outside play.
    question_started_at_ms: Option<u64>,
    /// Whether the current question's reveal has happened.
    revealed: bool,
    /// Scoring idempotency marker: the last question index whose scores
    /// were applied. Duplicate reveal deliveries check this before paying.
    last_scored_index: Option<usize>,
    /// Last host-driven mutation, epoch ms. Feeds the idle-room sweep.
    last_activity_at_ms: u64,
}

impl Session {
    /// Minimum number of non-host players required to start.
    pub const MIN_PLAYERS: usize = 2;

    /// A fresh session in Lobby with no questions and play not started.
    pub fn new(code: RoomCode, host: ClientId, now_ms: u64) -> Self {
        Self {
            code,
            host,
            status: SessionStatus::Lobby,
            questions: Vec::new(),
            current_index: None,
            question_started_at_ms: None,
            revealed: false,
            last_scored_index: None,
            last_activity_at_ms: now_ms,
        }
    }

    // -- Read surface -----------------------------------------------------

    /// The room code this session answers to.
    pub fn code(&self) -> &RoomCode {
        &self.code
    }

    /// The host identity fixed at creation.
    pub fn host(&self) -> &ClientId {
        &self.host
    }

    /// Current lifecycle status.
    pub fn status(&self) -> SessionStatus {
        self.status
    }

    /// The loaded question list.
    pub fn questions(&self) -> &[Question] {
        &self.questions
    }

    /// Index of the active question, if play has started.
    pub fn current_index(&self) -> Option<usize> {
        self.current_index
    }

    /// The active question, if play has started.
    pub fn current_question(&self) -> Option<&Question> {
        self.current_index.and_then(|i| self.questions.get(i))
    }

    /// When the active question started, epoch ms.
    pub fn question_started_at_ms(&self) -> Option<u64> {
        self.question_started_at_ms
    }

    /// Whether the active question has been revealed.
    pub fn is_revealed(&self) -> bool {
        self.revealed
    }

    /// Last host-driven mutation, epoch ms.
    pub fn last_activity_at_ms(&self) -> u64 {
        self.last_activity_at_ms
    }

    /// The active question's deadline (start + round duration), epoch ms.
    pub fn deadline_ms(&self, round_duration: Duration) -> Option<u64> {
        self.question_started_at_ms
            .map(|s| s + round_duration.as_millis() as u64)
    }

    /// Checks that `caller` is the host recorded at creation.
    pub fn authorize_host(&self, caller: &ClientId) -> Result<(), GameError> {
        if *caller == self.host {
            Ok(())
        } else {
            Err(GameError::NotHost)
        }
    }

    fn touch(&mut self, now_ms: u64) {
        self.last_activity_at_ms = now_ms;
    }

    // -- Host transitions -------------------------------------------------

    /// Replaces the question list. Lobby/Upload → Upload; may repeat any
    /// number of times before play starts.
    pub fn load_questions(
        &mut self,
        caller: &ClientId,
        questions: Vec<Question>,
        now_ms: u64,
    ) -> Result<(), GameError> {
        self.authorize_host(caller)?;
        if !self.status.accepts_players() {
            return Err(GameError::Precondition(
                "questions can only be loaded before play starts",
            ));
        }
        info!(code = %self.code, count = questions.len(), "question list replaced");
        self.questions = questions;
        self.status = SessionStatus::Upload;
        self.touch(now_ms);
        Ok(())
    }

    /// Discards the question list. Upload → Lobby.
    pub fn clear_questions(&mut self, caller: &ClientId, now_ms: u64) -> Result<(), GameError> {
        self.authorize_host(caller)?;
        if !self.status.accepts_players() {
            return Err(GameError::Precondition(
                "questions can only be cleared before play starts",
            ));
        }
        self.questions.clear();
        self.status = SessionStatus::Lobby;
        self.touch(now_ms);
        Ok(())
    }

    /// Starts the game. Lobby/Upload → Playing.
    ///
    /// Requires at least one question and [`Self::MIN_PLAYERS`] non-host
    /// players. Resets every player's score and answer, activates question
    /// 0, and stamps its start time.
    pub fn start(
        &mut self,
        caller: &ClientId,
        roster: &mut Roster,
        now_ms: u64,
    ) -> Result<(), GameError> {
        self.authorize_host(caller)?;
        if !self.status.accepts_players() {
            return Err(GameError::Precondition("the game has already started"));
        }
        if self.questions.is_empty() {
            return Err(GameError::Precondition("no questions are loaded"));
        }
        if roster.non_host_count() < Self::MIN_PLAYERS {
            return Err(GameError::Precondition(
                "at least 2 players are required to start",
            ));
        }

        roster.reset_for_start();
        self.status = SessionStatus::Playing;
        self.current_index = Some(0);
        self.question_started_at_ms = Some(now_ms);
        self.revealed = false;
        self.last_scored_index = None;
        self.touch(now_ms);

        info!(
            code = %self.code,
            players = roster.non_host_count(),
            questions = self.questions.len(),
            "game started"
        );
        Ok(())
    }

    /// Moves play to the next question, or to Results when none remains.
    ///
    /// Requires the current question's reveal to have completed. Clears
    /// answers tagged with the outgoing index only; an answer a player
    /// races in for a *different* index is left alone.
    pub fn advance(
        &mut self,
        caller: &ClientId,
        roster: &mut Roster,
        now_ms: u64,
    ) -> Result<Advance, GameError> {
        self.authorize_host(caller)?;
        if self.status != SessionStatus::Playing {
            return Err(GameError::Precondition("no game is in progress"));
        }
        let Some(index) = self.current_index else {
            return Err(GameError::Precondition("no question is active"));
        };
        if !self.revealed {
            return Err(GameError::Precondition(
                "the current question has not been revealed",
            ));
        }

        roster.reset_answers(index);
        self.touch(now_ms);

        let next = index + 1;
        if next < self.questions.len() {
            self.current_index = Some(next);
            self.question_started_at_ms = Some(now_ms);
            self.revealed = false;
            info!(code = %self.code, index = next, "advanced to next question");
            Ok(Advance::NextQuestion(next))
        } else {
            self.status = SessionStatus::Results;
            self.current_index = None;
            self.question_started_at_ms = None;
            self.revealed = false;
            info!(code = %self.code, "all questions played, session in results");
            Ok(Advance::Finished)
        }
    }

    // -- Reveal (not host-gated) ------------------------------------------

    /// Reveals the question at `index` and applies scores exactly once.
    ///
    /// Deliberately not host-gated: the trigger may come from the answer
    /// quorum, the deadline timer, or any client re-observing the revealed
    /// state after a reconnect. Safe to call any number of times: the
    /// index guard rejects stale triggers and `last_scored_index` keeps
    /// repeated deliveries from paying twice.
    pub fn reveal(
        &mut self,
        index: usize,
        roster: &mut Roster,
        cfg: &ScoringConfig,
    ) -> RevealOutcome {
        if self.status != SessionStatus::Playing || self.current_index != Some(index) {
            debug!(code = %self.code, index, "stale reveal trigger ignored");
            return RevealOutcome::Stale;
        }
        // `current_index` only ever points inside the list, but a reveal
        // trigger is untrusted input; treat a bad index as stale.
        let Some(question) = self.questions.get(index).cloned() else {
            return RevealOutcome::Stale;
        };
        if self.revealed {
            return RevealOutcome::AlreadyRevealed;
        }
        self.revealed = true;

        if self.last_scored_index == Some(index) {
            return RevealOutcome::Revealed;
        }
        self.last_scored_index = Some(index);
        let started = self.question_started_at_ms;
        let mut scored = 0usize;
        for player in roster.players_mut().filter(|p| !p.is_host) {
            let Some(answer) = player.answer.as_ref().filter(|a| a.question_index == index)
            else {
                continue;
            };
            let points = scoring::award(cfg, &question, started, answer);
            if points > 0 {
                player.score += points;
                scored += 1;
                debug!(
                    code = %self.code,
                    player = %player.id,
                    points,
                    total = player.score,
                    "answer scored"
                );
            }
        }

        info!(code = %self.code, index, scored, "question revealed");
        RevealOutcome::Revealed
    }

    // -- Player operations (session read-only) ----------------------------

    /// Seats a player, or returns their existing record.
    ///
    /// The existing-record path is deliberately checked first: it is also
    /// the reconnect path, and it must keep working after play starts.
    pub fn join(
        &self,
        roster: &mut Roster,
        id: ClientId,
        name: impl Into<String>,
    ) -> Result<Player, GameError> {
        if let Some(existing) = roster.get(&id) {
            return Ok(existing.clone());
        }
        if !self.status.accepts_players() {
            return Err(GameError::GameInProgress);
        }
        let player = Player::new(id, name);
        roster.insert(player.clone());
        info!(code = %self.code, player = %player.id, total = roster.len(), "player joined");
        Ok(player)
    }

    /// Records a player's answer for the current question. First write
    /// wins; a second write for the same question is rejected.
    pub fn submit_answer(
        &self,
        player: &mut Player,
        choice: impl Into<String>,
        now_ms: u64,
    ) -> Result<(), GameError> {
        if player.is_host {
            return Err(GameError::HostCannotAnswer);
        }
        if self.status != SessionStatus::Playing {
            return Err(GameError::Precondition(
                "answers are only accepted during play",
            ));
        }
        let Some(index) = self.current_index else {
            return Err(GameError::Precondition("no question is active"));
        };
        if player.has_answered(index) {
            return Err(GameError::AlreadyAnswered);
        }

        player.answer = Some(PlayerAnswer {
            question_index: index,
            choice: choice.into(),
            submitted_at_ms: Some(now_ms),
        });
        debug!(code = %self.code, player = %player.id, index, "answer recorded");
        Ok(())
    }
}

// =========================================================================
// Tests
// =========================================================================

#[cfg(test)]
mod tests {
    //! Unit tests for the session state machine.
    //!
    //! Time is passed in as literal epoch milliseconds; transitions take
    //! `now_ms` as a parameter, so no clock mocking is needed here.

    use super::*;
    use quizwire_model::QuestionId;

    // -- Helpers ----------------------------------------------------------

    fn cid(s: &str) -> ClientId {
        ClientId::new(s)
    }

    fn code() -> RoomCode {
        RoomCode::parse("AB12").unwrap()
    }

    fn question(id: u64, answer: &str) -> Question {
        Question::new(
            QuestionId(id),
            format!("question {id}"),
            answer,
            vec!["wrong-1".into(), "wrong-2".into()],
            &mut rand::rng(),
        )
        .unwrap()
    }

    fn three_questions() -> Vec<Question> {
        vec![question(1, "a1"), question(2, "a2"), question(3, "a3")]
    }

    /// A session in Playing with host `h`, players `p1`/`p2`, 3 questions,
    /// question 0 started at t=1000.
    fn playing() -> (Session, Roster) {
        let mut session = Session::new(code(), cid("h"), 0);
        let mut roster = Roster::new();
        roster.insert(Player::new_host(cid("h"), "Host"));
        session.join(&mut roster, cid("p1"), "One").unwrap();
        session.join(&mut roster, cid("p2"), "Two").unwrap();
        session
            .load_questions(&cid("h"), three_questions(), 500)
            .unwrap();
        session.start(&cid("h"), &mut roster, 1_000).unwrap();
        (session, roster)
    }

    fn submit(session: &Session, roster: &mut Roster, id: &str, choice: &str, at: u64) {
        let player = roster.get_mut(&cid(id)).unwrap();
        session.submit_answer(player, choice, at).unwrap();
    }

    // =====================================================================
    // new()
    // =====================================================================

    #[test]
    fn test_new_session_is_empty_lobby() {
        let session = Session::new(code(), cid("h"), 42);
        assert_eq!(session.status(), SessionStatus::Lobby);
        assert!(session.questions().is_empty());
        assert_eq!(session.current_index(), None);
        assert_eq!(session.question_started_at_ms(), None);
        assert!(!session.is_revealed());
        assert_eq!(session.last_activity_at_ms(), 42);
    }

    // =====================================================================
    // load_questions() / clear_questions()
    // =====================================================================

    #[test]
    fn test_load_questions_moves_lobby_to_upload() {
        let mut session = Session::new(code(), cid("h"), 0);
        session
            .load_questions(&cid("h"), three_questions(), 10)
            .unwrap();
        assert_eq!(session.status(), SessionStatus::Upload);
        assert_eq!(session.questions().len(), 3);
        assert_eq!(session.last_activity_at_ms(), 10);
    }

    #[test]
    fn test_load_questions_replaces_wholesale_and_repeats() {
        let mut session = Session::new(code(), cid("h"), 0);
        session
            .load_questions(&cid("h"), three_questions(), 10)
            .unwrap();
        session
            .load_questions(&cid("h"), vec![question(9, "x")], 20)
            .unwrap();
        assert_eq!(session.status(), SessionStatus::Upload);
        assert_eq!(session.questions().len(), 1);
        assert_eq!(session.questions()[0].id(), QuestionId(9));
    }

    #[test]
    fn test_load_questions_by_non_host_is_rejected() {
        let mut session = Session::new(code(), cid("h"), 0);
        let result = session.load_questions(&cid("p1"), three_questions(), 10);
        assert!(matches!(result, Err(GameError::NotHost)));
        assert_eq!(session.status(), SessionStatus::Lobby);
    }

    #[test]
    fn test_load_questions_during_play_is_rejected() {
        let (mut session, _) = playing();
        let result = session.load_questions(&cid("h"), three_questions(), 10);
        assert!(matches!(result, Err(GameError::Precondition(_))));
    }

    #[test]
    fn test_clear_questions_returns_to_lobby() {
        let mut session = Session::new(code(), cid("h"), 0);
        session
            .load_questions(&cid("h"), three_questions(), 10)
            .unwrap();
        session.clear_questions(&cid("h"), 20).unwrap();
        assert_eq!(session.status(), SessionStatus::Lobby);
        assert!(session.questions().is_empty());
    }

    // =====================================================================
    // start()
    // =====================================================================

    #[test]
    fn test_start_activates_question_zero() {
        let (session, _) = playing();
        assert_eq!(session.status(), SessionStatus::Playing);
        assert_eq!(session.current_index(), Some(0));
        assert_eq!(session.question_started_at_ms(), Some(1_000));
        assert!(!session.is_revealed());
        assert_eq!(session.current_question().unwrap().id(), QuestionId(1));
    }

    #[test]
    fn test_start_without_questions_fails_precondition() {
        let mut session = Session::new(code(), cid("h"), 0);
        let mut roster = Roster::new();
        roster.insert(Player::new_host(cid("h"), "Host"));
        session.join(&mut roster, cid("p1"), "One").unwrap();
        session.join(&mut roster, cid("p2"), "Two").unwrap();

        let result = session.start(&cid("h"), &mut roster, 1_000);
        assert!(matches!(result, Err(GameError::Precondition(_))));
        assert_eq!(session.status(), SessionStatus::Lobby);
    }

    #[test]
    fn test_start_with_one_player_fails_precondition() {
        let mut session = Session::new(code(), cid("h"), 0);
        let mut roster = Roster::new();
        roster.insert(Player::new_host(cid("h"), "Host"));
        session.join(&mut roster, cid("p1"), "One").unwrap();
        session
            .load_questions(&cid("h"), three_questions(), 10)
            .unwrap();

        let result = session.start(&cid("h"), &mut roster, 1_000);
        assert!(matches!(result, Err(GameError::Precondition(_))));
    }

    #[test]
    fn test_start_host_does_not_count_toward_minimum() {
        // Host + 1 player is still only 1 non-host player.
        let mut session = Session::new(code(), cid("h"), 0);
        let mut roster = Roster::new();
        roster.insert(Player::new_host(cid("h"), "Host"));
        session.join(&mut roster, cid("p1"), "One").unwrap();
        session
            .load_questions(&cid("h"), three_questions(), 10)
            .unwrap();
        assert!(session.start(&cid("h"), &mut roster, 1_000).is_err());
    }

    #[test]
    fn test_start_resets_scores_and_answers() {
        let mut session = Session::new(code(), cid("h"), 0);
        let mut roster = Roster::new();
        roster.insert(Player::new_host(cid("h"), "Host"));
        session.join(&mut roster, cid("p1"), "One").unwrap();
        session.join(&mut roster, cid("p2"), "Two").unwrap();
        roster.get_mut(&cid("p1")).unwrap().score = 777;
        session
            .load_questions(&cid("h"), three_questions(), 10)
            .unwrap();

        session.start(&cid("h"), &mut roster, 1_000).unwrap();

        assert_eq!(roster.get(&cid("p1")).unwrap().score, 0);
    }

    #[test]
    fn test_start_by_non_host_is_rejected() {
        let mut session = Session::new(code(), cid("h"), 0);
        let mut roster = Roster::new();
        roster.insert(Player::new_host(cid("h"), "Host"));
        session.join(&mut roster, cid("p1"), "One").unwrap();
        session.join(&mut roster, cid("p2"), "Two").unwrap();
        session
            .load_questions(&cid("h"), three_questions(), 10)
            .unwrap();

        let result = session.start(&cid("p1"), &mut roster, 1_000);
        assert!(matches!(result, Err(GameError::NotHost)));
    }

    #[test]
    fn test_start_twice_fails_precondition() {
        let (mut session, mut roster) = playing();
        let result = session.start(&cid("h"), &mut roster, 2_000);
        assert!(matches!(result, Err(GameError::Precondition(_))));
    }

    // =====================================================================
    // join()
    // =====================================================================

    #[test]
    fn test_join_is_idempotent_for_same_identity() {
        let session = Session::new(code(), cid("h"), 0);
        let mut roster = Roster::new();
        let first = session.join(&mut roster, cid("p1"), "One").unwrap();
        let second = session.join(&mut roster, cid("p1"), "Renamed").unwrap();
        assert_eq!(first, second, "second join returns the existing record");
        assert_eq!(roster.len(), 1);
    }

    #[test]
    fn test_join_after_start_is_rejected() {
        let (session, mut roster) = playing();
        let result = session.join(&mut roster, cid("late"), "Late");
        assert!(matches!(result, Err(GameError::GameInProgress)));
    }

    #[test]
    fn test_join_of_existing_identity_after_start_reconnects() {
        // The idempotent path doubles as reconnect and must survive Playing.
        let (session, mut roster) = playing();
        let player = session.join(&mut roster, cid("p1"), "One").unwrap();
        assert_eq!(player.id, cid("p1"));
    }

    // =====================================================================
    // submit_answer()
    // =====================================================================

    #[test]
    fn test_submit_answer_records_choice_and_timestamp() {
        let (session, mut roster) = playing();
        submit(&session, &mut roster, "p1", "a1", 5_000);

        let answer = roster.get(&cid("p1")).unwrap().answer.clone().unwrap();
        assert_eq!(answer.question_index, 0);
        assert_eq!(answer.choice, "a1");
        assert_eq!(answer.submitted_at_ms, Some(5_000));
    }

    #[test]
    fn test_submit_answer_second_write_is_rejected_and_ignored() {
        let (session, mut roster) = playing();
        submit(&session, &mut roster, "p1", "a1", 5_000);

        let player = roster.get_mut(&cid("p1")).unwrap();
        let result = session.submit_answer(player, "changed", 6_000);
        assert!(matches!(result, Err(GameError::AlreadyAnswered)));

        let answer = roster.get(&cid("p1")).unwrap().answer.clone().unwrap();
        assert_eq!(answer.choice, "a1", "first write wins");
        assert_eq!(answer.submitted_at_ms, Some(5_000));
    }

    #[test]
    fn test_submit_answer_outside_play_is_rejected() {
        let session = Session::new(code(), cid("h"), 0);
        let mut player = Player::new(cid("p1"), "One");
        let result = session.submit_answer(&mut player, "a1", 5_000);
        assert!(matches!(result, Err(GameError::Precondition(_))));
    }

    #[test]
    fn test_submit_answer_by_host_is_rejected() {
        let (session, mut roster) = playing();
        let host = roster.get_mut(&cid("h")).unwrap();
        let result = session.submit_answer(host, "a1", 5_000);
        assert!(matches!(result, Err(GameError::HostCannotAnswer)));
    }

    // =====================================================================
    // reveal()
    // =====================================================================

    #[test]
    fn test_reveal_scores_correct_answers_once() {
        let (mut session, mut roster) = playing();
        submit(&session, &mut roster, "p1", "a1", 1_000); // instant → 1000
        submit(&session, &mut roster, "p2", "wrong-1", 1_000); // incorrect → 0

        let outcome = session.reveal(0, &mut roster, &ScoringConfig::default());
        assert_eq!(outcome, RevealOutcome::Revealed);
        assert!(session.is_revealed());
        assert_eq!(roster.get(&cid("p1")).unwrap().score, 1_000);
        assert_eq!(roster.get(&cid("p2")).unwrap().score, 0);
    }

    #[test]
    fn test_reveal_decays_with_response_time() {
        let (mut session, mut roster) = playing();
        // Question started at 1 000; answering at 16 000 is a 15 s response.
        submit(&session, &mut roster, "p1", "a1", 16_000);
        submit(&session, &mut roster, "p2", "a1", 31_000); // 30 s → floor

        session.reveal(0, &mut roster, &ScoringConfig::default());
        assert_eq!(roster.get(&cid("p1")).unwrap().score, 750);
        assert_eq!(roster.get(&cid("p2")).unwrap().score, 500);
    }

    #[test]
    fn test_reveal_twice_scores_exactly_once() {
        let (mut session, mut roster) = playing();
        submit(&session, &mut roster, "p1", "a1", 1_000);

        let cfg = ScoringConfig::default();
        assert_eq!(session.reveal(0, &mut roster, &cfg), RevealOutcome::Revealed);
        assert_eq!(
            session.reveal(0, &mut roster, &cfg),
            RevealOutcome::AlreadyRevealed
        );
        assert_eq!(
            roster.get(&cid("p1")).unwrap().score,
            1_000,
            "duplicate reveal delivery must not double-score"
        );
    }

    #[test]
    fn test_reveal_with_stale_index_is_noop() {
        let (mut session, mut roster) = playing();
        let cfg = ScoringConfig::default();

        // A timer for question 2 firing while question 0 is active.
        assert_eq!(session.reveal(2, &mut roster, &cfg), RevealOutcome::Stale);
        assert!(!session.is_revealed());
    }

    #[test]
    fn test_reveal_ignores_host_answer_state() {
        let (mut session, mut roster) = playing();
        // Force an answer-shaped record onto the host to prove reveal
        // never pays hosts, even with corrupt input.
        roster.get_mut(&cid("h")).unwrap().answer = Some(PlayerAnswer {
            question_index: 0,
            choice: "a1".into(),
            submitted_at_ms: Some(1_000),
        });
        submit(&session, &mut roster, "p1", "a1", 1_000);
        submit(&session, &mut roster, "p2", "a1", 1_000);

        session.reveal(0, &mut roster, &ScoringConfig::default());
        assert_eq!(roster.get(&cid("h")).unwrap().score, 0);
    }

    #[test]
    fn test_reveal_unanswered_players_earn_nothing() {
        let (mut session, mut roster) = playing();
        submit(&session, &mut roster, "p1", "a1", 1_000);
        // p2 never answers.

        session.reveal(0, &mut roster, &ScoringConfig::default());
        assert_eq!(roster.get(&cid("p2")).unwrap().score, 0);
    }

    // =====================================================================
    // advance()
    // =====================================================================

    #[test]
    fn test_advance_before_reveal_fails_precondition() {
        let (mut session, mut roster) = playing();
        let result = session.advance(&cid("h"), &mut roster, 2_000);
        assert!(matches!(result, Err(GameError::Precondition(_))));
    }

    #[test]
    fn test_advance_moves_to_next_question_and_resets() {
        let (mut session, mut roster) = playing();
        submit(&session, &mut roster, "p1", "a1", 1_000);
        session.reveal(0, &mut roster, &ScoringConfig::default());

        let outcome = session.advance(&cid("h"), &mut roster, 40_000).unwrap();

        assert_eq!(outcome, Advance::NextQuestion(1));
        assert_eq!(session.current_index(), Some(1));
        assert_eq!(session.question_started_at_ms(), Some(40_000));
        assert!(!session.is_revealed());
        assert!(
            roster.get(&cid("p1")).unwrap().answer.is_none(),
            "answers for the outgoing question are cleared"
        );
        assert_eq!(
            roster.get(&cid("p1")).unwrap().score,
            1_000,
            "scores survive the advance"
        );
    }

    #[test]
    fn test_advance_by_non_host_is_rejected() {
        let (mut session, mut roster) = playing();
        submit(&session, &mut roster, "p1", "a1", 1_000);
        session.reveal(0, &mut roster, &ScoringConfig::default());

        let result = session.advance(&cid("p1"), &mut roster, 2_000);
        assert!(matches!(result, Err(GameError::NotHost)));
    }

    #[test]
    fn test_advance_past_last_question_reaches_results() {
        let (mut session, mut roster) = playing();
        let cfg = ScoringConfig::default();

        for index in 0..3 {
            session.reveal(index, &mut roster, &cfg);
            let outcome = session.advance(&cid("h"), &mut roster, 50_000).unwrap();
            if index < 2 {
                assert_eq!(outcome, Advance::NextQuestion(index + 1));
            } else {
                assert_eq!(outcome, Advance::Finished);
            }
        }

        assert_eq!(session.status(), SessionStatus::Results);
        assert_eq!(session.current_index(), None);
        assert_eq!(session.question_started_at_ms(), None);
    }

    #[test]
    fn test_advance_after_results_fails_precondition() {
        let (mut session, mut roster) = playing();
        let cfg = ScoringConfig::default();
        for index in 0..3 {
            session.reveal(index, &mut roster, &cfg);
            session.advance(&cid("h"), &mut roster, 50_000).unwrap();
        }

        let result = session.advance(&cid("h"), &mut roster, 60_000);
        assert!(matches!(result, Err(GameError::Precondition(_))));
    }

    // =====================================================================
    // deadline_ms() / serialization
    // =====================================================================

    #[test]
    fn test_deadline_is_start_plus_duration() {
        let (session, _) = playing();
        let deadline = session.deadline_ms(Duration::from_secs(30));
        assert_eq!(deadline, Some(1_000 + 30_000));
    }

    #[test]
    fn test_deadline_outside_play_is_none() {
        let session = Session::new(code(), cid("h"), 0);
        assert_eq!(session.deadline_ms(Duration::from_secs(30)), None);
    }

    #[test]
    fn test_session_round_trips_through_json() {
        // The session is a stored document; mid-game state must survive a
        // store round trip bit-for-bit (restart recovery depends on it).
        let (mut session, mut roster) = playing();
        submit(&session, &mut roster, "p1", "a1", 2_000);
        session.reveal(0, &mut roster, &ScoringConfig::default());

        let json = serde_json::to_string(&session).unwrap();
        let decoded: Session = serde_json::from_str(&json).unwrap();
        assert_eq!(decoded, session);
        assert_eq!(decoded.question_started_at_ms(), Some(1_000));
        assert!(decoded.is_revealed());
    }
}
