//! In-process store: the reference implementation of [`SessionStore`].
//!
//! Layout: an outer `RwLock` map of room code → entry, and one `Mutex`
//! per entry guarding that session's record pair. The per-entry mutex
//! serializes *all* scopes of one session (a strict superset of the
//! contract's atomicity) while sessions stay fully independent of each
//! other. No global lock is ever held across a document mutation.

use std::collections::HashMap;
use std::sync::Arc;

use tokio::sync::{broadcast, Mutex, RwLock};
use tracing::{debug, info};

use quizwire_model::{ClientId, Player, RoomCode, Roster};
use quizwire_session::Session;

use crate::{ChangeEvent, SessionStore, SessionView, StoreError};

/// Per-subscriber buffer of undelivered change events. A subscriber that
/// falls further behind sees `Lagged` and must resync from a snapshot.
const FEED_CAPACITY: usize = 64;

struct Record {
    session: Session,
    roster: Roster,
}

struct Entry {
    record: Mutex<Record>,
    feed: broadcast::Sender<ChangeEvent>,
}

impl Entry {
    fn publish(&self, record: &Record) {
        // A send error only means nobody is subscribed right now.
        let _ = self.feed.send(ChangeEvent::Updated(SessionView {
            session: record.session.clone(),
            roster: record.roster.clone(),
        }));
    }
}

/// An in-process [`SessionStore`] backed by tokio synchronization.
///
/// This is what tests and single-host deployments run on. It is cheap to
/// clone (shared internals) so the engine, registry, and background tasks
/// can all hold it.
#[derive(Clone, Default)]
pub struct MemoryStore {
    rooms: Arc<RwLock<HashMap<RoomCode, Arc<Entry>>>>,
}

impl MemoryStore {
    /// Creates an empty store.
    pub fn new() -> Self {
        Self::default()
    }

    async fn entry(&self, code: &RoomCode) -> Result<Arc<Entry>, StoreError> {
        self.rooms
            .read()
            .await
            .get(code)
            .cloned()
            .ok_or_else(|| StoreError::NotFound(code.clone()))
    }
}

impl SessionStore for MemoryStore {
    async fn insert(&self, session: Session, host: Player) -> Result<(), StoreError> {
        let code = session.code().clone();
        let mut rooms = self.rooms.write().await;
        if rooms.contains_key(&code) {
            return Err(StoreError::CodeTaken(code));
        }

        let mut roster = Roster::new();
        roster.insert(host);
        let (feed, _) = broadcast::channel(FEED_CAPACITY);
        rooms.insert(
            code.clone(),
            Arc::new(Entry {
                record: Mutex::new(Record { session, roster }),
                feed,
            }),
        );
        info!(%code, "session stored");
        Ok(())
    }

    async fn snapshot(&self, code: &RoomCode) -> Result<SessionView, StoreError> {
        let entry = self.entry(code).await?;
        let record = entry.record.lock().await;
        Ok(SessionView {
            session: record.session.clone(),
            roster: record.roster.clone(),
        })
    }

    async fn with_session<T, F>(&self, code: &RoomCode, f: F) -> Result<T, StoreError>
    where
        F: FnOnce(&mut Session, &mut Roster) -> T + Send,
        T: Send,
    {
        let entry = self.entry(code).await?;
        let mut record = entry.record.lock().await;
        let Record { session, roster } = &mut *record;
        let out = f(session, roster);
        entry.publish(&record);
        Ok(out)
    }

    async fn with_roster<T, F>(&self, code: &RoomCode, f: F) -> Result<T, StoreError>
    where
        F: FnOnce(&Session, &mut Roster) -> T + Send,
        T: Send,
    {
        let entry = self.entry(code).await?;
        let mut record = entry.record.lock().await;
        let Record { session, roster } = &mut *record;
        let out = f(session, roster);
        entry.publish(&record);
        Ok(out)
    }

    async fn with_player<T, F>(
        &self,
        code: &RoomCode,
        id: &ClientId,
        f: F,
    ) -> Result<T, StoreError>
    where
        F: FnOnce(&Session, &mut Player) -> T + Send,
        T: Send,
    {
        let entry = self.entry(code).await?;
        let mut record = entry.record.lock().await;
        let Record { session, roster } = &mut *record;
        let player = roster
            .get_mut(id)
            .ok_or_else(|| StoreError::PlayerNotFound(code.clone(), id.clone()))?;
        let out = f(session, player);
        entry.publish(&record);
        Ok(out)
    }

    async fn remove(&self, code: &RoomCode) -> Result<(), StoreError> {
        let entry = self
            .rooms
            .write()
            .await
            .remove(code)
            .ok_or_else(|| StoreError::NotFound(code.clone()))?;
        let _ = entry.feed.send(ChangeEvent::Removed(code.clone()));
        debug!(%code, "session removed");
        Ok(())
    }

    async fn subscribe(
        &self,
        code: &RoomCode,
    ) -> Result<broadcast::Receiver<ChangeEvent>, StoreError> {
        Ok(self.entry(code).await?.feed.subscribe())
    }

    async fn codes(&self) -> Vec<RoomCode> {
        self.rooms.read().await.keys().cloned().collect()
    }
}

// =========================================================================
// Tests
// =========================================================================
