//! Conversation session and language mode types.
//!
//! A session binds one user to one character and a language mode.
//! Sessions are created lazily on the first turn append and deleted
//! entirely on disconnect -- there is no pause/resume lifecycle.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use std::fmt;
use std::str::FromStr;

use crate::identity::UserId;

/// Language mode for a conversation session.
///
/// `Primary` is the language being practiced, `Secondary` the user's
/// native language, `Mixed` lets the character code-switch.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LanguageMode {
    Primary,
    Secondary,
    Mixed,
}

impl fmt::Display for LanguageMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            LanguageMode::Primary => write!(f, "primary"),
            LanguageMode::Secondary => write!(f, "secondary"),
            LanguageMode::Mixed => write!(f, "mixed"),
        }
    }
}

impl FromStr for LanguageMode {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "primary" => Ok(LanguageMode::Primary),
            "secondary" => Ok(LanguageMode::Secondary),
            "mixed" => Ok(LanguageMode::Mixed),
            other => Err(format!("invalid language mode: '{other}'")),
        }
    }
}

impl Default for LanguageMode {
    fn default() -> Self {
        LanguageMode::Primary
    }
}

/// A live conversation session between a user and a character.
///
/// The "current" session for a user is the most recently started
/// active one; the registry does not itself prevent duplicates.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Session {
    pub id: Uuid,
    pub user_id: UserId,
    pub character_id: String,
    pub language_mode: LanguageMode,
    pub active: bool,
    pub started_at: DateTime<Utc>,
}
