//! The session lifecycle state machine.

use serde::{Deserialize, Serialize};

/// The lifecycle state of a session.
///
/// Status only ever advances, with one exception: before play starts the
/// session may bounce between Lobby and Upload as the host replaces (or
/// clears) the question list any number of times.
///
/// ```text
/// Lobby ⇄ Upload
///   └──────┴────→ Playing ──(per question)──→ Playing ──→ Results
/// ```
///
/// - **Lobby**: session exists, players may join, no questions loaded.
/// - **Upload**: a question list is loaded; players may still join and the
///   host may replace the list again.
/// - **Playing**: rounds are running. Joining is closed; answers are open.
/// - **Results**: all questions played; final scores stand. The session is
///   deleted by the host's explicit "end" (or the idle sweep).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum SessionStatus {
    Lobby,
    Upload,
    Playing,
    Results,
}

impl SessionStatus {
    /// Returns `true` while new players may join (Lobby and Upload).
    pub fn accepts_players(&self) -> bool {
        matches!(self, Self::Lobby | Self::Upload)
    }

    /// Returns `true` if transitioning to `target` is legal at the status
    /// level. The aggregate layers richer guards (player counts, reveal
    /// completion) on top; this is only the shape of the machine.
    pub fn can_transition_to(self, target: Self) -> bool {
        use SessionStatus::*;
        matches!(
            (self, target),
            (Lobby, Upload)
                | (Upload, Upload)
                | (Upload, Lobby)
                | (Lobby, Playing)
                | (Upload, Playing)
                | (Playing, Playing)
                | (Playing, Results)
        )
    }
}

impl std::fmt::Display for SessionStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Lobby => write!(f, "Lobby"),
            Self::Upload => write!(f, "Upload"),
            Self::Playing => write!(f, "Playing"),
            Self::Results => write!(f, "Results"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_forward_transitions_are_legal() {
        assert!(SessionStatus::Lobby.can_transition_to(SessionStatus::Upload));
        assert!(SessionStatus::Lobby.can_transition_to(SessionStatus::Playing));
        assert!(SessionStatus::Upload.can_transition_to(SessionStatus::Playing));
        assert!(SessionStatus::Playing.can_transition_to(SessionStatus::Playing));
        assert!(SessionStatus::Playing.can_transition_to(SessionStatus::Results));
    }

    #[test]
    fn test_status_upload_may_repeat_and_return_to_lobby() {
        assert!(SessionStatus::Upload.can_transition_to(SessionStatus::Upload));
        assert!(SessionStatus::Upload.can_transition_to(SessionStatus::Lobby));
    }

    #[test]
    fn test_status_never_moves_backward_from_play() {
        assert!(!SessionStatus::Playing.can_transition_to(SessionStatus::Lobby));
        assert!(!SessionStatus::Playing.can_transition_to(SessionStatus::Upload));
        assert!(!SessionStatus::Results.can_transition_to(SessionStatus::Playing));
        assert!(!SessionStatus::Results.can_transition_to(SessionStatus::Lobby));
        assert!(!SessionStatus::Results.can_transition_to(SessionStatus::Upload));
    }

    #[test]
    fn test_status_accepts_players_before_play_only() {
        assert!(SessionStatus::Lobby.accepts_players());
        assert!(SessionStatus::Upload.accepts_players());
        assert!(!SessionStatus::Playing.accepts_players());
        assert!(!SessionStatus::Results.accepts_players());
    }

    #[test]
    fn test_status_display() {
        assert_eq!(SessionStatus::Lobby.to_string(), "Lobby");
        assert_eq!(SessionStatus::Results.to_string(), "Results");
    }
}
