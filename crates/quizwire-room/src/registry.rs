//! The room registry: creates, finds, and expires sessions.

use std::sync::Arc;
use std::time::Duration;

use tracing::{info, warn};

use quizwire_model::{ClientId, Player, RoomCode};
use quizwire_session::{Clock, Session};
use quizwire_store::{SessionStore, SessionView, StoreError};

use crate::RegistryError;

/// Registry settings.
#[derive(Debug, Clone)]
pub struct RegistryConfig {
    /// How many fresh codes to try before giving up on creation.
    pub code_attempts: usize,

    /// How long a session may sit without a host-driven mutation before
    /// the idle sweep deletes it.
    pub idle_timeout: Duration,
}

impl Default for RegistryConfig {
    fn default() -> Self {
        Self {
            code_attempts: 16,
            idle_timeout: Duration::from_secs(2 * 60 * 60),
        }
    }
}

/// Allocates room codes and tracks live sessions through the store.
///
/// Cheap to clone; clones share the store and clock.
pub struct RoomRegistry<S> {
    store: Arc<S>,
    clock: Arc<dyn Clock>,
    config: RegistryConfig,
}

// Manual impl: `derive(Clone)` would demand `S: Clone`, but only the
// `Arc` is cloned.
impl<S> Clone for RoomRegistry<S> {
    fn clone(&self) -> Self {
        Self {
            store: Arc::clone(&self.store),
            clock: Arc::clone(&self.clock),
            config: self.config.clone(),
        }
    }
}

impl<S: SessionStore> RoomRegistry<S> {
    /// Creates a registry over the given store and clock.
    pub fn new(store: Arc<S>, clock: Arc<dyn Clock>, config: RegistryConfig) -> Self {
        Self {
            store,
            clock,
            config,
        }
    }

    /// Creates a session: generates a code, seats the host as the first
    /// player (score 0, host flag set), and stores both atomically.
    ///
    /// Collisions with live codes regenerate, up to `code_attempts` times.
    ///
    /// # Errors
    /// [`RegistryError::CodesExhausted`] when every attempt collided.
    pub async fn create(
        &self,
        host: ClientId,
        host_name: &str,
    ) -> Result<RoomCode, RegistryError> {
        let now = self.clock.now_ms();
        for attempt in 1..=self.config.code_attempts {
            // ThreadRng is not Send; keep it scoped away from the await.
            let code = RoomCode::random(&mut rand::rng());
            let session = Session::new(code.clone(), host.clone(), now);
            let host_player = Player::new_host(host.clone(), host_name);

            match self.store.insert(session, host_player).await {
                Ok(()) => {
                    info!(%code, host = %host, "session created");
                    return Ok(code);
                }
                Err(StoreError::CodeTaken(_)) => {
                    warn!(%code, attempt, "room code collision, regenerating");
                }
                Err(other) => return Err(other.into()),
            }
        }
        Err(RegistryError::CodesExhausted(self.config.code_attempts))
    }

    /// Looks up a live session by code.
    pub async fn lookup(&self, code: &RoomCode) -> Result<SessionView, RegistryError> {
        Ok(self.store.snapshot(code).await?)
    }

    /// Deletes a session and all its player records.
    pub async fn remove(&self, code: &RoomCode) -> Result<(), RegistryError> {
        self.store.remove(code).await?;
        info!(%code, "session ended");
        Ok(())
    }

    /// Deletes every session idle for longer than the configured timeout.
    /// Returns the codes that were expired.
    ///
    /// Call this periodically; it is a policy sweep, not a correctness
    /// requirement. A session deleted out from under a concurrent lookup
    /// surfaces as `NotFound` to that caller, which is the truth.
    pub async fn expire_idle(&self) -> Vec<RoomCode> {
        let now = self.clock.now_ms();
        let cutoff_ms = self.config.idle_timeout.as_millis() as u64;
        let mut expired = Vec::new();

        for code in self.store.codes().await {
            let Ok(view) = self.store.snapshot(&code).await else {
                continue; // removed between listing and snapshot
            };
            let idle = now.saturating_sub(view.session.last_activity_at_ms());
            if idle >= cutoff_ms {
                if self.store.remove(&code).await.is_ok() {
                    info!(%code, idle_ms = idle, "idle session expired");
                    expired.push(code);
                }
            }
        }
        expired
    }
}

// =========================================================================
// Tests
// =========================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use quizwire_model::CODE_LEN;
    use quizwire_session::ManualClock;
    use quizwire_store::MemoryStore;

    fn cid(s: &str) -> ClientId {
        ClientId::new(s)
    }

    fn registry(clock: Arc<ManualClock>) -> RoomRegistry<MemoryStore> {
        RoomRegistry::new(
            Arc::new(MemoryStore::new()),
            clock,
            RegistryConfig::default(),
        )
    }

    #[tokio::test]
    async fn test_create_returns_wellformed_code_and_seats_host() {
        let reg = registry(Arc::new(ManualClock::new(1_000)));
        let code = reg.create(cid("h"), "Hosty").await.unwrap();

        assert_eq!(code.as_str().len(), CODE_LEN);
        let view = reg.lookup(&code).await.unwrap();
        assert_eq!(view.session.host(), &cid("h"));
        assert_eq!(view.session.last_activity_at_ms(), 1_000);
        let host = view.roster.get(&cid("h")).unwrap();
        assert!(host.is_host);
        assert_eq!(host.score, 0);
        assert_eq!(host.name, "Hosty");
    }

    #[tokio::test]
    async fn test_create_many_sessions_all_codes_unique() {
        let reg = registry(Arc::new(ManualClock::new(0)));
        let mut codes = Vec::new();
        for i in 0..50 {
            codes.push(reg.create(cid(&format!("h{i}")), "H").await.unwrap());
        }
        let mut deduped = codes.clone();
        deduped.sort();
        deduped.dedup();
        assert_eq!(deduped.len(), codes.len(), "live codes must be unique");
    }

    #[tokio::test]
    async fn test_lookup_unknown_code_is_not_found() {
        let reg = registry(Arc::new(ManualClock::new(0)));
        let result = reg.lookup(&RoomCode::parse("ZZ99").unwrap()).await;
        assert!(matches!(result, Err(RegistryError::NotFound(_))));
    }

    #[tokio::test]
    async fn test_remove_then_lookup_is_not_found() {
        let reg = registry(Arc::new(ManualClock::new(0)));
        let code = reg.create(cid("h"), "H").await.unwrap();
        reg.remove(&code).await.unwrap();
        assert!(matches!(
            reg.lookup(&code).await,
            Err(RegistryError::NotFound(_))
        ));
    }

    #[tokio::test]
    async fn test_expire_idle_removes_only_stale_sessions() {
        let clock = Arc::new(ManualClock::new(0));
        let reg = registry(Arc::clone(&clock));

        let stale = reg.create(cid("h1"), "H1").await.unwrap();
        // Two hours pass; a second session is created fresh.
        clock.advance(2 * 60 * 60 * 1_000);
        let fresh = reg.create(cid("h2"), "H2").await.unwrap();

        let expired = reg.expire_idle().await;

        assert_eq!(expired, vec![stale.clone()]);
        assert!(matches!(
            reg.lookup(&stale).await,
            Err(RegistryError::NotFound(_))
        ));
        assert!(reg.lookup(&fresh).await.is_ok());
    }

    #[tokio::test]
    async fn test_expire_idle_with_nothing_stale_returns_empty() {
        let clock = Arc::new(ManualClock::new(0));
        let reg = registry(Arc::clone(&clock));
        reg.create(cid("h"), "H").await.unwrap();

        assert!(reg.expire_idle().await.is_empty());
    }
}
