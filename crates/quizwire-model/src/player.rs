//! Player records and the per-session roster.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::ClientId;

// ---------------------------------------------------------------------------
// PlayerAnswer
// ---------------------------------------------------------------------------

/// One submitted answer, tagged with the question it belongs to.
///
/// The index tag is what makes answer handling race-safe: first-write-wins
/// is checked per question, and the host's between-question reset clears
/// only answers tagged with the outgoing index. An answer can never bleed
/// into the next round, even if a reset and a submission race.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PlayerAnswer {
    /// Which question (by position in the session's list) this answers.
    pub question_index: usize,
    /// The chosen option, verbatim.
    pub choice: String,
    /// Epoch-millisecond submission time, as read from the engine clock.
    /// `None` only for records written without a timestamp; scoring then
    /// falls back to the minimum award.
    pub submitted_at_ms: Option<u64>,
}

// ---------------------------------------------------------------------------
// Player
// ---------------------------------------------------------------------------

/// One participant's record within a session.
///
/// Created on join, deleted with the session. The answer fields are reset
/// every question; the score only ever grows during a game (it is zeroed
/// once, when the game starts).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Player {
    /// The stable identity this record belongs to. Only this client (and
    /// the scoring engine) may mutate the record.
    pub id: ClientId,
    /// Display name chosen at join time.
    pub name: String,
    /// Cumulative score. Monotonically non-decreasing within a game.
    pub score: u64,
    /// Whether this is the session's host. The host drives rounds and is
    /// excluded from answering and scoring.
    pub is_host: bool,
    /// The answer for the current question, if submitted.
    pub answer: Option<PlayerAnswer>,
}

impl Player {
    /// Creates a non-host player with a zero score.
    pub fn new(id: ClientId, name: impl Into<String>) -> Self {
        Self {
            id,
            name: name.into(),
            score: 0,
            is_host: false,
            answer: None,
        }
    }

    /// Creates the host's record (seated first at session creation).
    pub fn new_host(id: ClientId, name: impl Into<String>) -> Self {
        Self {
            is_host: true,
            ..Self::new(id, name)
        }
    }

    /// Whether this player has an answer recorded for the given question.
    pub fn has_answered(&self, question_index: usize) -> bool {
        self.answer
            .as_ref()
            .is_some_and(|a| a.question_index == question_index)
    }
}

// ---------------------------------------------------------------------------
// Roster
// ---------------------------------------------------------------------------

/// The per-session map of players, keyed by identity.
///
/// A `BTreeMap` keeps iteration order deterministic, which keeps score
/// reports and tests stable. The roster only offers the queries the state
/// machine needs; it enforces no rules itself.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Roster(BTreeMap<ClientId, Player>);

impl Roster {
    /// An empty roster.
    pub fn new() -> Self {
        Self::default()
    }

    /// Inserts (or replaces) a player record.
    pub fn insert(&mut self, player: Player) {
        self.0.insert(player.id.clone(), player);
    }

    /// Looks up a player by identity.
    pub fn get(&self, id: &ClientId) -> Option<&Player> {
        self.0.get(id)
    }

    /// Mutable lookup by identity.
    pub fn get_mut(&mut self, id: &ClientId) -> Option<&mut Player> {
        self.0.get_mut(id)
    }

    /// Removes a player record.
    pub fn remove(&mut self, id: &ClientId) -> Option<Player> {
        self.0.remove(id)
    }

    /// All players, in identity order.
    pub fn players(&self) -> impl Iterator<Item = &Player> {
        self.0.values()
    }

    /// Mutable iteration over all players.
    pub fn players_mut(&mut self) -> impl Iterator<Item = &mut Player> {
        self.0.values_mut()
    }

    /// Non-host players, in identity order.
    pub fn non_hosts(&self) -> impl Iterator<Item = &Player> {
        self.0.values().filter(|p| !p.is_host)
    }

    /// Number of non-host players.
    pub fn non_host_count(&self) -> usize {
        self.non_hosts().count()
    }

    /// Total number of records, host included.
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// Whether the roster holds no records at all.
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Whether every non-host player has answered the given question.
    ///
    /// False when there are no non-host players; an empty quorum must not
    /// trigger a reveal.
    pub fn all_non_hosts_answered(&self, question_index: usize) -> bool {
        let mut any = false;
        for p in self.non_hosts() {
            if !p.has_answered(question_index) {
                return false;
            }
            any = true;
        }
        any
    }

    /// Clears answers belonging to the given question, leaving any answer
    /// tagged with a different index untouched. This is the conditional
    /// form of the host's between-question reset.
    pub fn reset_answers(&mut self, question_index: usize) {
        for p in self.players_mut() {
            if p.has_answered(question_index) {
                p.answer = None;
            }
        }
    }

    /// Zeroes every score and clears every answer, the game-start reset.
    pub fn reset_for_start(&mut self) {
        for p in self.players_mut() {
            p.score = 0;
            p.answer = None;
        }
    }
}

// =========================================================================
// Tests
// =========================================================================

#[cfg(test)]
mod tests {
    use super::*;

    fn cid(s: &str) -> ClientId {
        ClientId::new(s)
    }

    fn answered(mut p: Player, index: usize) -> Player {
        p.answer = Some(PlayerAnswer {
            question_index: index,
            choice: "x".into(),
            submitted_at_ms: Some(0),
        });
        p
    }

    #[test]
    fn test_new_host_sets_host_flag_and_zero_score() {
        let host = Player::new_host(cid("h"), "Hosty");
        assert!(host.is_host);
        assert_eq!(host.score, 0);
        assert!(host.answer.is_none());
    }

    #[test]
    fn test_has_answered_checks_question_index() {
        let p = answered(Player::new(cid("a"), "A"), 2);
        assert!(p.has_answered(2));
        assert!(!p.has_answered(3), "answer for q2 is not an answer for q3");
    }

    #[test]
    fn test_non_host_count_excludes_host() {
        let mut roster = Roster::new();
        roster.insert(Player::new_host(cid("h"), "H"));
        roster.insert(Player::new(cid("a"), "A"));
        roster.insert(Player::new(cid("b"), "B"));
        assert_eq!(roster.len(), 3);
        assert_eq!(roster.non_host_count(), 2);
    }

    #[test]
    fn test_all_non_hosts_answered_requires_every_player() {
        let mut roster = Roster::new();
        roster.insert(Player::new_host(cid("h"), "H"));
        roster.insert(answered(Player::new(cid("a"), "A"), 0));
        roster.insert(Player::new(cid("b"), "B"));
        assert!(!roster.all_non_hosts_answered(0));

        roster.insert(answered(Player::new(cid("b"), "B"), 0));
        assert!(roster.all_non_hosts_answered(0));
    }

    #[test]
    fn test_all_non_hosts_answered_ignores_host_answer_state() {
        // The host never answers; the quorum must not wait for them.
        let mut roster = Roster::new();
        roster.insert(Player::new_host(cid("h"), "H"));
        roster.insert(answered(Player::new(cid("a"), "A"), 1));
        roster.insert(answered(Player::new(cid("b"), "B"), 1));
        assert!(roster.all_non_hosts_answered(1));
    }

    #[test]
    fn test_all_non_hosts_answered_false_for_empty_quorum() {
        let mut roster = Roster::new();
        roster.insert(Player::new_host(cid("h"), "H"));
        assert!(!roster.all_non_hosts_answered(0));
    }

    #[test]
    fn test_reset_answers_clears_only_matching_index() {
        let mut roster = Roster::new();
        roster.insert(answered(Player::new(cid("a"), "A"), 0));
        roster.insert(answered(Player::new(cid("b"), "B"), 1));

        roster.reset_answers(0);

        assert!(roster.get(&cid("a")).unwrap().answer.is_none());
        assert!(
            roster.get(&cid("b")).unwrap().answer.is_some(),
            "answer tagged with another index must survive the reset"
        );
    }

    #[test]
    fn test_reset_for_start_zeroes_scores_and_answers() {
        let mut roster = Roster::new();
        let mut a = answered(Player::new(cid("a"), "A"), 0);
        a.score = 900;
        roster.insert(a);

        roster.reset_for_start();

        let a = roster.get(&cid("a")).unwrap();
        assert_eq!(a.score, 0);
        assert!(a.answer.is_none());
    }

    #[test]
    fn test_roster_serializes_as_plain_map() {
        // `#[serde(transparent)]` keeps the stored form a map of
        // identity → player record, the shape the document store holds.
        let mut roster = Roster::new();
        roster.insert(Player::new(cid("a"), "A"));
        let json: serde_json::Value = serde_json::to_value(&roster).unwrap();
        assert!(json.is_object());
        assert_eq!(json["a"]["name"], "A");
    }
}
