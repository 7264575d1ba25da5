//! Shared application state: the registry and the per-client sessions.

use std::collections::HashMap;
use std::sync::{Arc, RwLock, RwLockWriteGuard};
use std::time::{Duration, Instant};

use uuid::Uuid;

use realty_identity::{Identity, Session};
use realty_ledger::EstateRegistry;

/// Sessions idle for longer than this are dropped.
pub const DEFAULT_IDLE_TIMEOUT: Duration = Duration::from_secs(30 * 60);
/// Upper bound on live sessions; the least recently used one is evicted.
pub const DEFAULT_MAX_SESSIONS: usize = 10_000;

#[derive(Debug)]
struct Entry {
    session: Arc<Session>,
    last_seen: Instant,
}

/// Sessions keyed by the bearer token handed out at login.
///
/// A session expires after `idle_timeout` without use. Opening one past
/// `max_sessions` evicts the least recently used.
#[derive(Debug)]
pub struct SessionStore {
    sessions: RwLock<HashMap<Uuid, Entry>>,
    idle_timeout: Duration,
    max_sessions: usize,
}

impl Default for SessionStore {
    fn default() -> Self {
        Self::with_limits(DEFAULT_IDLE_TIMEOUT, DEFAULT_MAX_SESSIONS)
    }
}

impl SessionStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_limits(idle_timeout: Duration, max_sessions: usize) -> Self {
        Self {
            sessions: RwLock::new(HashMap::new()),
            idle_timeout,
            max_sessions: max_sessions.max(1),
        }
    }

    fn entries(&self) -> RwLockWriteGuard<'_, HashMap<Uuid, Entry>> {
        self.sessions
            .write()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    /// Open a session holding `identity`; returns its token.
    pub fn open(&self, identity: Identity) -> (Uuid, Arc<Session>) {
        let now = Instant::now();
        let mut entries = self.entries();

        let idle_timeout = self.idle_timeout;
        entries.retain(|_, entry| now.duration_since(entry.last_seen) <= idle_timeout);

        while entries.len() >= self.max_sessions {
            let Some(oldest) = entries
                .iter()
                .min_by_key(|(_, entry)| entry.last_seen)
                .map(|(token, _)| *token)
            else {
                break;
            };
            entries.remove(&oldest);
            tracing::info!(%oldest, "session evicted");
        }

        let token = Uuid::now_v7();
        let session = Arc::new(Session::with_identity(identity));
        entries.insert(
            token,
            Entry {
                session: session.clone(),
                last_seen: now,
            },
        );
        (token, session)
    }

    /// Live session for `token`; using it resets its idle clock.
    pub fn get(&self, token: &Uuid) -> Option<Arc<Session>> {
        let now = Instant::now();
        let mut entries = self.entries();

        let entry = entries.get_mut(token)?;
        if now.duration_since(entry.last_seen) <= self.idle_timeout {
            entry.last_seen = now;
            return Some(entry.session.clone());
        }

        entries.remove(token);
        tracing::debug!(%token, "session expired");
        None
    }

    pub fn close(&self, token: &Uuid) -> Option<Arc<Session>> {
        self.entries().remove(token).map(|entry| entry.session)
    }

    pub fn len(&self) -> usize {
        self.sessions
            .read()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

pub struct AppServices {
    pub registry: EstateRegistry,
    pub sessions: SessionStore,
}

impl AppServices {
    pub fn new(registry: EstateRegistry) -> Self {
        Self::with_sessions(registry, SessionStore::new())
    }

    pub fn with_sessions(registry: EstateRegistry, sessions: SessionStore) -> Self {
        Self { registry, sessions }
    }
}
