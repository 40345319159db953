#[cfg(test)]
#[path = "sessions_test.rs"]
mod tests;

use std::sync::Arc;

use dashmap::DashMap;
use tokio::sync::Mutex;
use tokio::sync::OwnedMutexGuard;

use crate::domain::models::Session;

/// In-memory sessions keyed by correspondent. Every session sits behind its
/// own mutex, so turns for one user run one after another while different
/// users never wait on each other.
#[derive(Default)]
pub struct Sessions {
    sessions: DashMap<String, Arc<Mutex<Session>>>,
}

impl Sessions {
    /// Returns the handle for `user_id`, creating an empty session on first
    /// contact.
    pub fn get_or_create(&self, user_id: &str) -> Arc<Mutex<Session>> {
        if let Some(session) = self.sessions.get(user_id) {
            return session.clone();
        }

        let session = self
            .sessions
            .entry(user_id.to_string())
            .or_insert_with(|| {
                tracing::debug!(user_id, "creating session");
                return Arc::new(Mutex::new(Session::default()));
            })
            .clone();

        return session;
    }

    /// Snapshot of the session, `None` for unknown users.
    pub async fn read(&self, user_id: &str) -> Option<Session> {
        let session = self.sessions.get(user_id).map(|e| return e.clone())?;
        let guard = session.lock().await;

        return Some(guard.clone());
    }

    /// Applies `f` to the session while holding its lock.
    pub async fn update<T, F>(&self, user_id: &str, f: F) -> T
    where
        F: FnOnce(&mut Session) -> T,
    {
        let mut guard = self.get_or_create(user_id).lock_owned().await;
        return f(&mut *guard);
    }

    /// Locks the session for a whole turn, including any awaits in between.
    pub async fn lock(&self, user_id: &str) -> OwnedMutexGuard<Session> {
        return self.get_or_create(user_id).lock_owned().await;
    }

    pub fn len(&self) -> usize {
        return self.sessions.len();
    }

    pub fn is_empty(&self) -> bool {
        return self.sessions.is_empty();
    }
}
