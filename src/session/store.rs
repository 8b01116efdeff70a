//! Shared registry of sessions with optimistic, version-checked mutation.
//!
//! The store owns the canonical copy of every [`ThinkingSession`]. Readers get
//! deep copies under a shared lock; writers go through [`SessionStore::update`],
//! which runs the mutation closure with no lock held and commits only if the
//! session version is unchanged since the copy was taken. Sessions with
//! different ids never contend with each other.

use std::collections::HashMap;
use std::sync::{PoisonError, RwLock};

use crate::session::{SessionError, ThinkingSession};

/// Concurrency-safe map from session id to the authoritative session value.
pub struct SessionStore {
    sessions: RwLock<HashMap<String, ThinkingSession>>,
    max_retries: u32,
}

impl SessionStore {
    /// Create an empty store with the given cap on compare-and-swap attempts.
    pub fn new(max_retries: u32) -> Self {
        Self {
            sessions: RwLock::new(HashMap::new()),
            max_retries: max_retries.max(1),
        }
    }

    /// Create a store configured from the process environment.
    pub fn from_config() -> Self {
        Self::new(crate::config::get_config().cas_max_retries)
    }

    /// Return a deep copy of the session, or `None` when the id is unknown.
    pub fn get(&self, id: &str) -> Option<ThinkingSession> {
        let sessions = self.sessions.read().unwrap_or_else(PoisonError::into_inner);
        sessions.get(id).cloned()
    }

    /// Insert or unconditionally overwrite the entry for `session.id`.
    ///
    /// Only used for initial registration and for inserting a freshly minted
    /// branch session; every other write goes through [`Self::update`].
    pub fn put(&self, session: ThinkingSession) {
        let mut sessions = self
            .sessions
            .write()
            .unwrap_or_else(PoisonError::into_inner);
        sessions.insert(session.id.clone(), session);
    }

    /// Apply `mutate` to the session under the compare-and-swap protocol.
    ///
    /// The cycle: copy the session under a shared lock and remember its
    /// version, run `mutate` on the copy with no lock held, then re-check the
    /// live version under an exclusive lock before committing with the version
    /// bumped by one. A version mismatch means another writer won; the cycle
    /// restarts with a fresh copy, up to the configured attempt cap, after
    /// which the contention surfaces as [`SessionError::Conflict`]. Failures
    /// returned by `mutate` propagate immediately and leave the store
    /// untouched.
    pub fn update<F>(&self, id: &str, mut mutate: F) -> Result<ThinkingSession, SessionError>
    where
        F: FnMut(ThinkingSession) -> Result<ThinkingSession, SessionError>,
    {
        let mut attempts = 0u32;
        loop {
            let baseline = {
                let sessions = self.sessions.read().unwrap_or_else(PoisonError::into_inner);
                sessions
                    .get(id)
                    .cloned()
                    .ok_or_else(|| SessionError::NotFound(id.to_string()))?
            };
            let base_version = baseline.version;

            // Business logic runs lock-free; only the commit below re-enters the lock.
            let mut updated = mutate(baseline)?;

            {
                let mut sessions = self
                    .sessions
                    .write()
                    .unwrap_or_else(PoisonError::into_inner);
                match sessions.get(id) {
                    None => return Err(SessionError::NotFound(id.to_string())),
                    Some(live) if live.version == base_version => {
                        updated.version = base_version + 1;
                        sessions.insert(id.to_string(), updated.clone());
                        return Ok(updated);
                    }
                    Some(_) => {}
                }
            }

            attempts += 1;
            if attempts >= self.max_retries {
                return Err(SessionError::Conflict {
                    id: id.to_string(),
                    attempts,
                });
            }
            tracing::trace!(session_id = id, attempts, "Version conflict; retrying update");
            std::thread::yield_now();
        }
    }

    /// Deep-copy snapshot of one session for read-only projection.
    pub fn snapshot(&self, id: &str) -> Result<ThinkingSession, SessionError> {
        self.get(id)
            .ok_or_else(|| SessionError::NotFound(id.to_string()))
    }

    /// Deep-copy snapshots of every session, ordered by creation time then id.
    pub fn list_snapshots(&self) -> Vec<ThinkingSession> {
        let sessions = self.sessions.read().unwrap_or_else(PoisonError::into_inner);
        let mut snapshots: Vec<ThinkingSession> = sessions.values().cloned().collect();
        snapshots.sort_by(|a, b| {
            a.created_at
                .cmp(&b.created_at)
                .then_with(|| a.id.cmp(&b.id))
        });
        snapshots
    }

    /// Number of registered sessions.
    pub fn len(&self) -> usize {
        let sessions = self.sessions.read().unwrap_or_else(PoisonError::into_inner);
        sessions.len()
    }

    /// Whether the store holds no sessions.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl Default for SessionStore {
    fn default() -> Self {
        Self::from_config()
    }
}
