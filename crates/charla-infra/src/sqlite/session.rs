//! SQLite session repository implementation.
//!
//! Implements `SessionRepository` from `charla-core` using sqlx with
//! the split read/write pools: raw queries, private Row structs,
//! reads on the reader pool, writes on the writer pool.

use charla_core::session::SessionRepository;
use charla_types::error::RepositoryError;
use charla_types::identity::UserId;
use charla_types::session::{LanguageMode, Session};
use charla_types::turn::{SenderRole, Turn};
use chrono::{DateTime, Utc};
use sqlx::Row;
use uuid::Uuid;

use super::pool::DatabasePool;

/// SQLite-backed implementation of `SessionRepository`.
pub struct SqliteSessionRepository {
    pool: DatabasePool,
}

impl SqliteSessionRepository {
    pub fn new(pool: DatabasePool) -> Self {
        Self { pool }
    }
}

// ---------------------------------------------------------------------------
// Private Row types for SQLite-to-domain mapping
// ---------------------------------------------------------------------------

struct SessionRow {
    id: String,
    user_id: String,
    character_id: String,
    language_mode: String,
    active: i64,
    started_at: String,
}

impl SessionRow {
    fn from_row(row: &sqlx::sqlite::SqliteRow) -> Result<Self, sqlx::Error> {
        Ok(Self {
            id: row.try_get("id")?,
            user_id: row.try_get("user_id")?,
            character_id: row.try_get("character_id")?,
            language_mode: row.try_get("language_mode")?,
            active: row.try_get("active")?,
            started_at: row.try_get("started_at")?,
        })
    }

    fn into_session(self) -> Result<Session, RepositoryError> {
        let id = Uuid::parse_str(&self.id)
            .map_err(|e| RepositoryError::Query(format!("invalid session id: {e}")))?;
        let user_id = Uuid::parse_str(&self.user_id)
            .map_err(|e| RepositoryError::Query(format!("invalid user_id: {e}")))?;
        let language_mode: LanguageMode = self
            .language_mode
            .parse()
            .map_err(|e: String| RepositoryError::Query(e))?;
        let started_at = parse_datetime(&self.started_at)?;

        Ok(Session {
            id,
            user_id: UserId::from(user_id),
            character_id: self.character_id,
            language_mode,
            active: self.active != 0,
            started_at,
        })
    }
}

struct TurnRow {
    id: String,
    session_id: String,
    role: String,
    text: String,
    created_at: String,
    detected_language: Option<String>,
    emotion: Option<String>,
    audio_ref: Option<String>,
}

impl TurnRow {
    fn from_row(row: &sqlx::sqlite::SqliteRow) -> Result<Self, sqlx::Error> {
        Ok(Self {
            id: row.try_get("id")?,
            session_id: row.try_get("session_id")?,
            role: row.try_get("role")?,
            text: row.try_get("text")?,
            created_at: row.try_get("created_at")?,
            detected_language: row.try_get("detected_language")?,
            emotion: row.try_get("emotion")?,
            audio_ref: row.try_get("audio_ref")?,
        })
    }

    fn into_turn(self) -> Result<Turn, RepositoryError> {
        let id = Uuid::parse_str(&self.id)
            .map_err(|e| RepositoryError::Query(format!("invalid turn id: {e}")))?;
        let session_id = Uuid::parse_str(&self.session_id)
            .map_err(|e| RepositoryError::Query(format!("invalid session_id: {e}")))?;
        let role: SenderRole = self
            .role
            .parse()
            .map_err(|e: String| RepositoryError::Query(e))?;
        let created_at = parse_datetime(&self.created_at)?;

        Ok(Turn {
            id,
            session_id,
            role,
            text: self.text,
            created_at,
            detected_language: self.detected_language,
            emotion: self.emotion,
            audio_ref: self.audio_ref,
        })
    }
}

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

fn parse_datetime(s: &str) -> Result<DateTime<Utc>, RepositoryError> {
    DateTime::parse_from_rfc3339(s)
        .map(|dt| dt.with_timezone(&Utc))
        .map_err(|e| RepositoryError::Query(format!("invalid datetime: {e}")))
}

fn format_datetime(dt: &DateTime<Utc>) -> String {
    dt.to_rfc3339()
}

fn map_sqlx(e: sqlx::Error) -> RepositoryError {
    match e {
        sqlx::Error::RowNotFound => RepositoryError::NotFound,
        sqlx::Error::PoolTimedOut | sqlx::Error::PoolClosed | sqlx::Error::Io(_) => {
            RepositoryError::Connection
        }
        other => RepositoryError::Query(other.to_string()),
    }
}

// ---------------------------------------------------------------------------
// SessionRepository implementation
// ---------------------------------------------------------------------------

impl SessionRepository for SqliteSessionRepository {
    async fn create_session(&self, session: &Session) -> Result<Session, RepositoryError> {
        sqlx::query(
            r#"INSERT INTO conversation_sessions (id, user_id, character_id, language_mode, active, started_at)
               VALUES (?, ?, ?, ?, ?, ?)"#,
        )
        .bind(session.id.to_string())
        .bind(session.user_id.to_string())
        .bind(&session.character_id)
        .bind(session.language_mode.to_string())
        .bind(session.active as i64)
        .bind(format_datetime(&session.started_at))
        .execute(&self.pool.writer)
        .await
        .map_err(map_sqlx)?;

        Ok(session.clone())
    }

    async fn active_sessions(&self, user_id: &UserId) -> Result<Vec<Session>, RepositoryError> {
        let rows = sqlx::query(
            r#"SELECT id, user_id, character_id, language_mode, active, started_at
               FROM conversation_sessions
               WHERE user_id = ? AND active = 1
               ORDER BY started_at DESC"#,
        )
        .bind(user_id.to_string())
        .fetch_all(&self.pool.reader)
        .await
        .map_err(map_sqlx)?;

        rows.iter()
            .map(|row| SessionRow::from_row(row).map_err(map_sqlx)?.into_session())
            .collect()
    }

    async fn update_session(&self, session: &Session) -> Result<(), RepositoryError> {
        let result = sqlx::query(
            r#"UPDATE conversation_sessions
               SET character_id = ?, language_mode = ?, active = ?
               WHERE id = ?"#,
        )
        .bind(&session.character_id)
        .bind(session.language_mode.to_string())
        .bind(session.active as i64)
        .bind(session.id.to_string())
        .execute(&self.pool.writer)
        .await
        .map_err(map_sqlx)?;

        if result.rows_affected() == 0 {
            return Err(RepositoryError::NotFound);
        }
        Ok(())
    }

    async fn delete_sessions(&self, user_id: &UserId) -> Result<u64, RepositoryError> {
        // Turns are retained on purpose; only session rows go.
        let result = sqlx::query("DELETE FROM conversation_sessions WHERE user_id = ?")
            .bind(user_id.to_string())
            .execute(&self.pool.writer)
            .await
            .map_err(map_sqlx)?;

        Ok(result.rows_affected())
    }

    async fn save_turn(&self, turn: &Turn) -> Result<(), RepositoryError> {
        sqlx::query(
            r#"INSERT INTO conversation_turns (id, session_id, role, text, created_at, detected_language, emotion, audio_ref)
               VALUES (?, ?, ?, ?, ?, ?, ?, ?)"#,
        )
        .bind(turn.id.to_string())
        .bind(turn.session_id.to_string())
        .bind(turn.role.to_string())
        .bind(&turn.text)
        .bind(format_datetime(&turn.created_at))
        .bind(&turn.detected_language)
        .bind(&turn.emotion)
        .bind(&turn.audio_ref)
        .execute(&self.pool.writer)
        .await
        .map_err(map_sqlx)?;

        Ok(())
    }

    async fn recent_turns(
        &self,
        session_id: &Uuid,
        limit: u32,
    ) -> Result<Vec<Turn>, RepositoryError> {
        // Newest-first fetch bounded by limit, then reversed so the
        // caller sees chronological order.
        let rows = sqlx::query(
            r#"SELECT id, session_id, role, text, created_at, detected_language, emotion, audio_ref
               FROM conversation_turns
               WHERE session_id = ?
               ORDER BY created_at DESC, id DESC
               LIMIT ?"#,
        )
        .bind(session_id.to_string())
        .bind(limit as i64)
        .fetch_all(&self.pool.reader)
        .await
        .map_err(map_sqlx)?;

        let mut turns: Vec<Turn> = rows
            .iter()
            .map(|row| TurnRow::from_row(row).map_err(map_sqlx)?.into_turn())
            .collect::<Result<_, _>>()?;
        turns.reverse();
        Ok(turns)
    }

    async fn count_turns(&self, session_id: &Uuid) -> Result<u64, RepositoryError> {
        let row: (i64,) =
            sqlx::query_as("SELECT COUNT(*) FROM conversation_turns WHERE session_id = ?")
                .bind(session_id.to_string())
                .fetch_one(&self.pool.reader)
                .await
                .map_err(map_sqlx)?;

        Ok(row.0 as u64)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use charla_types::turn::TurnAnnotations;

    async fn test_repo() -> (tempfile::TempDir, SqliteSessionRepository) {
        let dir = tempfile::tempdir().unwrap();
        let url = format!("sqlite://{}?mode=rwc", dir.path().join("test.db").display());
        let pool = DatabasePool::new(&url).await.unwrap();
        (dir, SqliteSessionRepository::new(pool))
    }

    fn session(user_id: UserId) -> Session {
        Session {
            id: Uuid::now_v7(),
            user_id,
            character_id: "sofia".to_string(),
            language_mode: LanguageMode::Primary,
            active: true,
            started_at: Utc::now(),
        }
    }

    fn turn(session_id: Uuid, role: SenderRole, text: &str) -> Turn {
        let annotations = TurnAnnotations::default();
        Turn {
            id: Uuid::now_v7(),
            session_id,
            role,
            text: text.to_string(),
            created_at: Utc::now(),
            detected_language: annotations.detected_language,
            emotion: annotations.emotion,
            audio_ref: annotations.audio_ref,
        }
    }

    #[tokio::test]
    async fn create_and_list_active_sessions_newest_first() {
        let (_dir, repo) = test_repo().await;
        let user = UserId::new();

        let mut older = session(user);
        older.started_at = Utc::now() - chrono::Duration::minutes(5);
        repo.create_session(&older).await.unwrap();

        let newer = session(user);
        repo.create_session(&newer).await.unwrap();

        let sessions = repo.active_sessions(&user).await.unwrap();
        assert_eq!(sessions.len(), 2);
        assert_eq!(sessions[0].id, newer.id);
        assert_eq!(sessions[1].id, older.id);
    }

    #[tokio::test]
    async fn update_session_persists_language_mode() {
        let (_dir, repo) = test_repo().await;
        let user = UserId::new();
        let mut s = session(user);
        repo.create_session(&s).await.unwrap();

        s.language_mode = LanguageMode::Mixed;
        repo.update_session(&s).await.unwrap();

        let sessions = repo.active_sessions(&user).await.unwrap();
        assert_eq!(sessions[0].language_mode, LanguageMode::Mixed);
    }

    #[tokio::test]
    async fn update_missing_session_is_not_found() {
        let (_dir, repo) = test_repo().await;
        let s = session(UserId::new());
        let err = repo.update_session(&s).await.unwrap_err();
        assert!(matches!(err, RepositoryError::NotFound));
    }

    #[tokio::test]
    async fn delete_sessions_removes_all_but_keeps_turns() {
        let (_dir, repo) = test_repo().await;
        let user = UserId::new();
        let s = session(user);
        repo.create_session(&s).await.unwrap();
        repo.save_turn(&turn(s.id, SenderRole::User, "Hola"))
            .await
            .unwrap();

        let removed = repo.delete_sessions(&user).await.unwrap();
        assert_eq!(removed, 1);
        assert!(repo.active_sessions(&user).await.unwrap().is_empty());
        assert_eq!(repo.count_turns(&s.id).await.unwrap(), 1);
    }

    #[tokio::test]
    async fn recent_turns_bounded_and_chronological() {
        let (_dir, repo) = test_repo().await;
        let user = UserId::new();
        let s = session(user);
        repo.create_session(&s).await.unwrap();

        for i in 0..6 {
            let mut t = turn(s.id, SenderRole::User, &format!("turn {i}"));
            t.created_at = Utc::now() + chrono::Duration::seconds(i);
            repo.save_turn(&t).await.unwrap();
        }

        let turns = repo.recent_turns(&s.id, 4).await.unwrap();
        assert_eq!(turns.len(), 4);
        assert_eq!(turns[0].text, "turn 2");
        assert_eq!(turns[3].text, "turn 5");
    }

    #[tokio::test]
    async fn turn_annotations_roundtrip() {
        let (_dir, repo) = test_repo().await;
        let s = session(UserId::new());
        repo.create_session(&s).await.unwrap();

        let mut t = turn(s.id, SenderRole::Character, "¡Muy bien!");
        t.detected_language = Some("es".to_string());
        t.emotion = Some("happy".to_string());
        repo.save_turn(&t).await.unwrap();

        let turns = repo.recent_turns(&s.id, 10).await.unwrap();
        assert_eq!(turns[0].detected_language.as_deref(), Some("es"));
        assert_eq!(turns[0].emotion.as_deref(), Some("happy"));
    }
}
