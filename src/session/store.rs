//! Session storage and management.

use std::collections::HashMap;
use std::sync::{Arc, RwLock};
use std::time::{Duration, Instant};

use tokio::sync::Mutex;

use super::{SessionController, SessionId};
use crate::engine::EngineFactory;
use crate::error::SiteChatError;
use crate::Result;

/// A chat session.
pub struct Session {
    /// Unique identifier.
    pub id: SessionId,
    /// Credential, transcript and engine.
    pub controller: SessionController,
    /// Time when session was created.
    pub created_at: Instant,
    /// Time of last activity.
    pub last_activity: Instant,
}

impl Session {
    /// Create a new session with the given ID and controller.
    pub fn new(id: SessionId, controller: SessionController) -> Self {
        let now = Instant::now();
        Self {
            id,
            controller,
            created_at: now,
            last_activity: now,
        }
    }

    /// Update the last activity timestamp.
    pub fn touch(&mut self) {
        self.last_activity = Instant::now();
    }

    /// Time since the session was created.
    pub fn age(&self) -> Duration {
        self.created_at.elapsed()
    }

    /// Get the idle duration since last activity.
    pub fn idle_duration(&self) -> Duration {
        self.last_activity.elapsed()
    }
}

/// Shared handle to one session.
///
/// The async mutex serializes handlers within a session, including across
/// the awaited engine call.
pub type SessionHandle = Arc<Mutex<Session>>;

/// Thread-safe storage for sessions.
///
/// Sessions never share state: each one owns its controller, and the map
/// lock is only held for lookups, never across an engine call.
pub struct SessionStore {
    factory: Arc<dyn EngineFactory>,
    sessions: RwLock<HashMap<SessionId, SessionHandle>>,
}

impl SessionStore {
    /// Create a new empty session store whose sessions build engines with
    /// `factory`.
    pub fn new(factory: Arc<dyn EngineFactory>) -> Self {
        Self {
            factory,
            sessions: RwLock::new(HashMap::new()),
        }
    }

    /// Create a new session, seeded with `default_credential` if non-empty.
    ///
    /// Returns the newly assigned session ID.
    pub fn create(&self, default_credential: Option<&str>) -> Result<SessionId> {
        let id = SessionId::new();
        let controller = SessionController::new(Arc::clone(&self.factory), default_credential);
        let session = Arc::new(Mutex::new(Session::new(id, controller)));

        let mut sessions = self
            .sessions
            .write()
            .map_err(|_| SiteChatError::LockPoisoned)?;

        sessions.insert(id, session);
        Ok(id)
    }

    /// Get a handle to the session with the given ID.
    pub fn get(&self, id: &SessionId) -> Result<Option<SessionHandle>> {
        let sessions = self
            .sessions
            .read()
            .map_err(|_| SiteChatError::LockPoisoned)?;
        Ok(sessions.get(id).cloned())
    }

    /// Get a handle, failing with `SessionNotFound` if absent.
    pub fn require(&self, id: &SessionId) -> Result<SessionHandle> {
        self.get(id)?
            .ok_or_else(|| SiteChatError::SessionNotFound(id.to_string()))
    }

    /// Check if a session exists.
    pub fn contains(&self, id: &SessionId) -> Result<bool> {
        let sessions = self
            .sessions
            .read()
            .map_err(|_| SiteChatError::LockPoisoned)?;
        Ok(sessions.contains_key(id))
    }

    /// Remove a session from the store.
    ///
    /// Returns the removed handle, or None if it didn't exist. An in-flight
    /// request keeps its handle alive until it finishes.
    pub fn remove(&self, id: &SessionId) -> Result<Option<SessionHandle>> {
        let mut sessions = self
            .sessions
            .write()
            .map_err(|_| SiteChatError::LockPoisoned)?;
        Ok(sessions.remove(id))
    }

    /// Get the number of sessions in the store.
    pub fn count(&self) -> usize {
        self.sessions.read().map(|s| s.len()).unwrap_or(0)
    }

    /// Remove all sessions matching a predicate.
    ///
    /// Sessions busy handling a request are skipped.
    /// Returns the number of sessions removed.
    pub fn remove_matching<F>(&self, predicate: F) -> Result<usize>
    where
        F: Fn(&Session) -> bool,
    {
        let mut sessions = self
            .sessions
            .write()
            .map_err(|_| SiteChatError::LockPoisoned)?;

        let before = sessions.len();
        sessions.retain(|_, handle| match handle.try_lock() {
            Ok(session) => !predicate(&session),
            Err(_) => true,
        });
        Ok(before - sessions.len())
    }

    /// Remove sessions idle for longer than `max_idle`.
    pub fn reap_idle(&self, max_idle: Duration) -> Result<usize> {
        self.remove_matching(|s| s.idle_duration() > max_idle)
    }
}

/// Periodically reap idle sessions until the task is aborted.
pub fn spawn_reaper(
    store: Arc<SessionStore>,
    max_idle: Duration,
    every: Duration,
) -> tokio::task::JoinHandle<()> {
    tokio::spawn(async move {
        let mut ticker = tokio::time::interval(every);
        ticker.tick().await;
        loop {
            ticker.tick().await;
            match store.reap_idle(max_idle) {
                Ok(0) => {}
                Ok(n) => tracing::info!(
                    removed = n,
                    remaining = store.count(),
                    "reaped idle sessions"
                ),
                Err(e) => tracing::warn!(error = %e, "session reaper failed"),
            }
        }
    })
}
