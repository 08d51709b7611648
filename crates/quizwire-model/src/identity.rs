//! Identity types: who a client is, and which room they are talking about.

use std::fmt;

use rand::Rng;
use serde::{Deserialize, Serialize};

use crate::ModelError;

// ---------------------------------------------------------------------------
// ClientId
// ---------------------------------------------------------------------------

/// A stable, opaque identity token for one client.
///
/// The identity provider hands each client exactly one of these for the
/// lifetime of a session; the engine treats it as unforgeable and never
/// inspects its contents. Host authority works by comparing the caller's
/// `ClientId` against the one recorded at session creation: a capability
/// check, not trust in whatever the client claims to be.
///
/// `#[serde(transparent)]` keeps the stored form a plain string, so a
/// `ClientId("k3j9…")` is just `"k3j9…"` in the session document.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ClientId(pub String);

impl ClientId {
    /// Wraps a provider-issued token.
    pub fn new(token: impl Into<String>) -> Self {
        Self(token.into())
    }

    /// The raw token string.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ClientId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<&str> for ClientId {
    fn from(token: &str) -> Self {
        Self(token.to_owned())
    }
}

// ---------------------------------------------------------------------------
// RoomCode
// ---------------------------------------------------------------------------

/// The fixed alphabet room codes are drawn from.
pub const CODE_ALPHABET: &[u8] = b"ABCDEFGHIJKLMNOPQRSTUVWXYZ0123456789";

/// Room codes are always exactly this many characters.
pub const CODE_LEN: usize = 4;

/// A short human-typeable code identifying one live session.
///
/// Exactly 4 characters from `A–Z0–9`, unique among live sessions (the
/// store's atomic insert enforces uniqueness; the registry regenerates on
/// collision). The code is the only thing players need to type to join.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RoomCode(String);

impl RoomCode {
    /// Generates a fresh random code.
    ///
    /// Collisions with live sessions are possible (36^4 ≈ 1.7 M codes) and
    /// are the caller's problem; the registry retries a bounded number of
    /// times against the store's atomic insert.
    pub fn random(rng: &mut impl Rng) -> Self {
        let code = (0..CODE_LEN)
            .map(|_| CODE_ALPHABET[rng.random_range(0..CODE_ALPHABET.len())] as char)
            .collect();
        Self(code)
    }

    /// Parses a code typed by a client.
    ///
    /// Rejects anything that is not exactly 4 characters from the alphabet.
    /// Uppercasing sloppy input is the caller's concern; this is strict.
    pub fn parse(s: &str) -> Result<Self, ModelError> {
        if s.len() == CODE_LEN && s.bytes().all(|b| CODE_ALPHABET.contains(&b)) {
            Ok(Self(s.to_owned()))
        } else {
            Err(ModelError::InvalidRoomCode(s.to_owned()))
        }
    }

    /// The code as a string slice.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for RoomCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

// =========================================================================
// Tests
// =========================================================================
