//! Turn types: a single stored message within a session.
//!
//! Turns are append-only; they are never mutated after creation and
//! deliberately survive session deletion.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use std::fmt;
use std::str::FromStr;

/// Who authored a turn.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SenderRole {
    User,
    Character,
}

impl fmt::Display for SenderRole {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SenderRole::User => write!(f, "user"),
            SenderRole::Character => write!(f, "character"),
        }
    }
}

impl FromStr for SenderRole {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "user" => Ok(SenderRole::User),
            "character" => Ok(SenderRole::Character),
            other => Err(format!("invalid sender role: '{other}'")),
        }
    }
}

/// One stored message in a session.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Turn {
    pub id: Uuid,
    pub session_id: Uuid,
    pub role: SenderRole,
    pub text: String,
    pub created_at: DateTime<Utc>,
    /// Detected language annotation, when the generator reported one.
    pub detected_language: Option<String>,
    /// Emotion annotation, when classification ran for this turn.
    pub emotion: Option<String>,
    /// Reference to a stored audio clip for voice turns.
    pub audio_ref: Option<String>,
}

/// Optional annotations attached to a turn at append time.
#[derive(Debug, Clone, Default)]
pub struct TurnAnnotations {
    pub detected_language: Option<String>,
    pub emotion: Option<String>,
    pub audio_ref: Option<String>,
}

/// A role-tagged entry in the windowed history passed to generation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HistoryEntry {
    pub role: SenderRole,
    pub text: String,
}

impl From<&Turn> for HistoryEntry {
    fn from(turn: &Turn) -> Self {
        Self {
            role: turn.role,
            text: turn.text.clone(),
        }
    }
}
