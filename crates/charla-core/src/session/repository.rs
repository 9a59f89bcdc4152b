//! SessionRepository trait definition.
//!
//! CRUD operations for conversation sessions and turns. Uses native
//! async fn in traits (RPITIT, Rust 2024 edition); the SQLite
//! implementation lives in charla-infra.

use charla_types::error::RepositoryError;
use charla_types::identity::UserId;
use charla_types::session::Session;
use charla_types::turn::Turn;
use uuid::Uuid;

/// Repository trait for session and turn persistence.
pub trait SessionRepository: Send + Sync {
    /// Persist a new session.
    fn create_session(
        &self,
        session: &Session,
    ) -> impl std::future::Future<Output = Result<Session, RepositoryError>> + Send;

    /// All active sessions for a user, most recently started first.
    fn active_sessions(
        &self,
        user_id: &UserId,
    ) -> impl std::future::Future<Output = Result<Vec<Session>, RepositoryError>> + Send;

    /// Update an existing session (language mode switches).
    fn update_session(
        &self,
        session: &Session,
    ) -> impl std::future::Future<Output = Result<(), RepositoryError>> + Send;

    /// Hard-delete every session owned by the user, active or not.
    ///
    /// Turns are deliberately retained; returns the number of sessions
    /// removed.
    fn delete_sessions(
        &self,
        user_id: &UserId,
    ) -> impl std::future::Future<Output = Result<u64, RepositoryError>> + Send;

    /// Append a turn. Turns are append-only and never updated.
    fn save_turn(
        &self,
        turn: &Turn,
    ) -> impl std::future::Future<Output = Result<(), RepositoryError>> + Send;

    /// The last `limit` turns of a session in chronological order.
    fn recent_turns(
        &self,
        session_id: &Uuid,
        limit: u32,
    ) -> impl std::future::Future<Output = Result<Vec<Turn>, RepositoryError>> + Send;

    /// Total number of turns stored for a session.
    fn count_turns(
        &self,
        session_id: &Uuid,
    ) -> impl std::future::Future<Output = Result<u64, RepositoryError>> + Send;
}
