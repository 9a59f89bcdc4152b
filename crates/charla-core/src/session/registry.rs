//! Session registry orchestrating session lifecycle and turn persistence.
//!
//! The registry creates sessions lazily on the first turn append,
//! selects the "current" session as the most recently started active
//! one, and hard-deletes every session for an identity on disconnect.

use charla_types::error::SessionError;
use charla_types::identity::UserId;
use charla_types::session::{LanguageMode, Session};
use charla_types::turn::{HistoryEntry, SenderRole, Turn, TurnAnnotations};
use chrono::Utc;
use tracing::{debug, info};
use uuid::Uuid;

use crate::session::repository::SessionRepository;

/// Maximum number of user/character turn-pairs included in the
/// history window passed to generation. Older turns stay in storage
/// but are excluded from context.
pub const HISTORY_WINDOW_PAIRS: usize = 20;

/// Orchestrates session lifecycle and turn persistence.
///
/// Generic over `SessionRepository` so core stays free of storage
/// concerns; charla-infra provides the SQLite implementation.
pub struct SessionRegistry<R: SessionRepository> {
    repo: R,
    window_pairs: usize,
}

impl<R: SessionRepository> SessionRegistry<R> {
    pub fn new(repo: R) -> Self {
        Self {
            repo,
            window_pairs: HISTORY_WINDOW_PAIRS,
        }
    }

    /// Override the history window size (tests, constrained backends).
    pub fn with_window(repo: R, window_pairs: usize) -> Self {
        Self { repo, window_pairs }
    }

    /// Access the underlying repository.
    pub fn repo(&self) -> &R {
        &self.repo
    }

    /// The most recently started active session for the user, if any.
    pub async fn current_session(&self, user_id: &UserId) -> Result<Option<Session>, SessionError> {
        Ok(self.repo.active_sessions(user_id).await?.into_iter().next())
    }

    /// Store a user turn, creating a session if none exists.
    ///
    /// Returns the session and the windowed history as it stood
    /// *before* this turn, so a first message reaches generation with
    /// empty history and the in-flight message is never duplicated
    /// into its own context.
    pub async fn append_user_turn(
        &self,
        user_id: &UserId,
        character_id: &str,
        text: &str,
    ) -> Result<(Session, Vec<HistoryEntry>), SessionError> {
        let session = self.ensure_session(user_id, character_id).await?;
        let history = self.windowed_history(&session.id).await?;

        let turn = Turn {
            id: Uuid::now_v7(),
            session_id: session.id,
            role: SenderRole::User,
            text: text.to_string(),
            created_at: Utc::now(),
            detected_language: None,
            emotion: None,
            audio_ref: None,
        };
        self.repo.save_turn(&turn).await?;

        Ok((session, history))
    }

    /// Store a character turn against the user's current session.
    ///
    /// Creates a session if none exists, which is only reachable when
    /// a reply lands after the owning session was torn down.
    pub async fn append_character_turn(
        &self,
        user_id: &UserId,
        character_id: &str,
        text: &str,
        annotations: TurnAnnotations,
    ) -> Result<Turn, SessionError> {
        let session = self.ensure_session(user_id, character_id).await?;

        let turn = Turn {
            id: Uuid::now_v7(),
            session_id: session.id,
            role: SenderRole::Character,
            text: text.to_string(),
            created_at: Utc::now(),
            detected_language: annotations.detected_language,
            emotion: annotations.emotion,
            audio_ref: annotations.audio_ref,
        };
        self.repo.save_turn(&turn).await?;
        Ok(turn)
    }

    /// Switch the current session's language mode.
    ///
    /// Fails with `InvalidMode` when `mode` is not in the enumerated
    /// set. With no current session the validated mode is returned
    /// without persistence; sessions are only ever created on append.
    pub async fn switch_language(
        &self,
        user_id: &UserId,
        mode: &str,
    ) -> Result<LanguageMode, SessionError> {
        let mode: LanguageMode = mode
            .parse()
            .map_err(|_| SessionError::InvalidMode(mode.to_string()))?;

        if let Some(mut session) = self.current_session(user_id).await? {
            session.language_mode = mode;
            self.repo.update_session(&session).await?;
            info!(user_id = %user_id, mode = %mode, "Language mode switched");
        } else {
            debug!(user_id = %user_id, mode = %mode, "Language switch with no session, nothing persisted");
        }
        Ok(mode)
    }

    /// Delete all of the user's sessions (hard termination).
    ///
    /// Turns are retained. Returns the number of sessions removed.
    pub async fn end_session(&self, user_id: &UserId) -> Result<u64, SessionError> {
        let removed = self.repo.delete_sessions(user_id).await?;
        if removed > 0 {
            info!(user_id = %user_id, removed, "Sessions terminated");
        }
        Ok(removed)
    }

    /// The last N turn-pairs of a session as role-tagged entries in
    /// chronological order.
    pub async fn windowed_history(
        &self,
        session_id: &Uuid,
    ) -> Result<Vec<HistoryEntry>, SessionError> {
        let limit = (self.window_pairs * 2) as u32;
        let turns = self.repo.recent_turns(session_id, limit).await?;
        Ok(turns.iter().map(HistoryEntry::from).collect())
    }

    async fn ensure_session(
        &self,
        user_id: &UserId,
        character_id: &str,
    ) -> Result<Session, SessionError> {
        if let Some(session) = self.current_session(user_id).await? {
            return Ok(session);
        }

        let session = Session {
            id: Uuid::now_v7(),
            user_id: *user_id,
            character_id: character_id.to_string(),
            language_mode: LanguageMode::default(),
            active: true,
            started_at: Utc::now(),
        };
        let created = self.repo.create_session(&session).await?;
        info!(user_id = %user_id, session_id = %created.id, character = character_id, "Session created");
        Ok(created)
    }
}
