//! Shared-state store contract for Quizwire.
//!
//! The engine does not own the storage technology; it programs against
//! [`SessionStore`], a narrow contract over any transactional document
//! store with change subscription. The contract encodes the ownership
//! model directly in its method shapes:
//!
//! - [`SessionStore::with_session`] — the **host scope**: atomic
//!   read-modify-write over the session record and the roster. Session
//!   transitions run inside this closure.
//! - [`SessionStore::with_roster`] — the **join scope**: read the session,
//!   create your own player record.
//! - [`SessionStore::with_player`] — the **player scope**: read the
//!   session, write exactly one player record. A player physically cannot
//!   reach another player's record through this API, so "player mutating
//!   another player's record" is unrepresentable rather than checked.
//!
//! # Change feed
//!
//! Every committed mutation broadcasts a [`ChangeEvent::Updated`] carrying
//! a full [`SessionView`] snapshot. Full snapshots make "no reordering of
//! a single record's versions" trivial and match the document-store model.
//! Delivery is **at-least-once**: a lagged subscriber loses intermediate
//! versions (never their order) and must resync via
//! [`SessionStore::snapshot`]. Consumers must tolerate duplicates; the
//! engine's reveal and scoring paths are idempotent for exactly this
//! reason.

mod error;
mod memory;

pub use error::StoreError;
pub use memory::MemoryStore;

use std::future::Future;

use serde::{Deserialize, Serialize};
use tokio::sync::broadcast;

use quizwire_model::{ClientId, Player, RoomCode, Roster};
use quizwire_session::Session;

/// A consistent snapshot of one session and its players.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SessionView {
    /// The session record.
    pub session: Session,
    /// Every player record, host included.
    pub roster: Roster,
}

/// One committed mutation, as delivered to subscribers.
#[derive(Debug, Clone)]
pub enum ChangeEvent {
    /// The session (or any of its player records) changed; here is the
    /// new version of the whole document.
    Updated(SessionView),
    /// The session was deleted. Terminal for this subscription.
    Removed(RoomCode),
}

/// The shared-state provider contract.
///
/// Implementations must make each method atomic with respect to the other
/// methods on the same room code; operations on different codes are
/// independent. [`MemoryStore`] is the in-process reference implementation;
/// a networked document store adapter satisfies the same contract.
pub trait SessionStore: Send + Sync + 'static {
    /// Atomically creates a session with its host's player record.
    ///
    /// # Errors
    /// [`StoreError::CodeTaken`] if a live session already owns the code;
    /// this is the uniqueness guarantee the room registry retries against.
    fn insert(
        &self,
        session: Session,
        host: Player,
    ) -> impl Future<Output = Result<(), StoreError>> + Send;

    /// Reads a consistent snapshot of a session and its players.
    fn snapshot(
        &self,
        code: &RoomCode,
    ) -> impl Future<Output = Result<SessionView, StoreError>> + Send;

    /// Host scope: runs `f` atomically over the session and roster.
    fn with_session<T, F>(
        &self,
        code: &RoomCode,
        f: F,
    ) -> impl Future<Output = Result<T, StoreError>> + Send
    where
        F: FnOnce(&mut Session, &mut Roster) -> T + Send,
        T: Send;

    /// Join scope: runs `f` atomically with the session read-only and the
    /// roster writable (for inserting the caller's own record).
    fn with_roster<T, F>(
        &self,
        code: &RoomCode,
        f: F,
    ) -> impl Future<Output = Result<T, StoreError>> + Send
    where
        F: FnOnce(&Session, &mut Roster) -> T + Send,
        T: Send;

    /// Player scope: runs `f` atomically with the session read-only and
    /// exactly one player record writable.
    ///
    /// # Errors
    /// [`StoreError::PlayerNotFound`] if the identity has no record.
    fn with_player<T, F>(
        &self,
        code: &RoomCode,
        id: &ClientId,
        f: F,
    ) -> impl Future<Output = Result<T, StoreError>> + Send
    where
        F: FnOnce(&Session, &mut Player) -> T + Send,
        T: Send;

    /// Deletes a session and all its player records, notifying
    /// subscribers with [`ChangeEvent::Removed`].
    fn remove(&self, code: &RoomCode) -> impl Future<Output = Result<(), StoreError>> + Send;

    /// Subscribes to the session's change feed.
    fn subscribe(
        &self,
        code: &RoomCode,
    ) -> impl Future<Output = Result<broadcast::Receiver<ChangeEvent>, StoreError>> + Send;

    /// Every live room code. Drives the idle-room sweep.
    fn codes(&self) -> impl Future<Output = Vec<RoomCode>> + Send;
}
