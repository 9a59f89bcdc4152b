//! In-memory SessionRepository for tests and demos.
//!
//! Backed by a `tokio::sync::Mutex` over plain vectors; not intended
//! for production use, where the SQLite repository in charla-infra
//! applies.

use charla_types::error::RepositoryError;
use charla_types::identity::UserId;
use charla_types::session::Session;
use charla_types::turn::Turn;
use tokio::sync::Mutex;
use uuid::Uuid;

use crate::session::repository::SessionRepository;

#[derive(Default)]
struct Store {
    sessions: Vec<Session>,
    turns: Vec<Turn>,
}

/// In-memory implementation of [`SessionRepository`].
#[derive(Default)]
pub struct InMemorySessionRepository {
    store: Mutex<Store>,
}

impl InMemorySessionRepository {
    pub fn new() -> Self {
        Self::default()
    }
}

impl SessionRepository for InMemorySessionRepository {
    async fn create_session(&self, session: &Session) -> Result<Session, RepositoryError> {
        let mut store = self.store.lock().await;
        store.sessions.push(session.clone());
        Ok(session.clone())
    }

    async fn active_sessions(&self, user_id: &UserId) -> Result<Vec<Session>, RepositoryError> {
        let store = self.store.lock().await;
        let mut sessions: Vec<Session> = store
            .sessions
            .iter()
            .filter(|s| s.user_id == *user_id && s.active)
            .cloned()
            .collect();
        sessions.sort_by(|a, b| b.started_at.cmp(&a.started_at));
        Ok(sessions)
    }

    async fn update_session(&self, session: &Session) -> Result<(), RepositoryError> {
        let mut store = self.store.lock().await;
        match store.sessions.iter_mut().find(|s| s.id == session.id) {
            Some(existing) => {
                *existing = session.clone();
                Ok(())
            }
            None => Err(RepositoryError::NotFound),
        }
    }

    async fn delete_sessions(&self, user_id: &UserId) -> Result<u64, RepositoryError> {
        let mut store = self.store.lock().await;
        let before = store.sessions.len();
        store.sessions.retain(|s| s.user_id != *user_id);
        Ok((before - store.sessions.len()) as u64)
    }

    async fn save_turn(&self, turn: &Turn) -> Result<(), RepositoryError> {
        let mut store = self.store.lock().await;
        store.turns.push(turn.clone());
        Ok(())
    }

    async fn recent_turns(
        &self,
        session_id: &Uuid,
        limit: u32,
    ) -> Result<Vec<Turn>, RepositoryError> {
        let store = self.store.lock().await;
        let mut turns: Vec<Turn> = store
            .turns
            .iter()
            .filter(|t| t.session_id == *session_id)
            .cloned()
            .collect();
        turns.sort_by(|a, b| a.created_at.cmp(&b.created_at).then(a.id.cmp(&b.id)));
        let skip = turns.len().saturating_sub(limit as usize);
        Ok(turns.split_off(skip))
    }

    async fn count_turns(&self, session_id: &Uuid) -> Result<u64, RepositoryError> {
        let store = self.store.lock().await;
        Ok(store
            .turns
            .iter()
            .filter(|t| t.session_id == *session_id)
            .count() as u64)
    }
}
