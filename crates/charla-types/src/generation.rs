//! Generation-boundary request/response types.
//!
//! These model the contract with the external response-generation
//! backend: a direct request/response shape, an incremental fragment
//! shape for streaming, and an opaque error type. Failures are not
//! typed domain errors -- the recovery engine classifies them
//! downstream by inspecting the message.

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::identity::UserId;
use crate::turn::HistoryEntry;

/// Request to the generation backend.
///
/// `history` is the windowed conversation context and excludes the
/// message being answered, which travels in `message`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GenerationRequest {
    pub character_id: String,
    pub user_id: UserId,
    pub session_id: Uuid,
    pub message: String,
    pub history: Vec<HistoryEntry>,
}

/// A grammar correction attached to a finished reply.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Correction {
    pub original: String,
    pub corrected: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub explanation: Option<String>,
}

/// A vocabulary item surfaced by the character.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct VocabularyItem {
    pub term: String,
    pub translation: String,
}

/// A complete, non-streamed reply from the generation backend.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GenerationResponse {
    pub text: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub emotion: Option<String>,
    #[serde(default)]
    pub corrections: Vec<Correction>,
    #[serde(default)]
    pub vocabulary: Vec<VocabularyItem>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub teaching_moment: Option<String>,
}

/// One incremental piece of a streamed reply.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Fragment {
    pub text_delta: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub emotion: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub detected_language: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub animation: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub cultural_note: Option<String>,
}

/// Opaque failure from the generation boundary.
///
/// The variants exist for sensible `Display` messages, not for
/// matching: the recovery engine substring-matches the rendered
/// message to produce an [`crate::error::ErrorCategory`].
#[derive(Debug, thiserror::Error)]
pub enum GenerationError {
    #[error("backend error: {message}")]
    Backend { message: String },

    #[error("request timed out after {0}ms")]
    Timeout(u64),

    #[error("stream error: {0}")]
    Stream(String),

    #[error("deserialization error: {0}")]
    Deserialization(String),

    #[error("invalid request: {0}")]
    InvalidRequest(String),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_generation_response_defaults_on_sparse_json() {
        let json = r#"{"text":"Hola, ¿cómo estás?"}"#;
        let resp: GenerationResponse = serde_json::from_str(json).unwrap();
        assert_eq!(resp.text, "Hola, ¿cómo estás?");
        assert!(resp.corrections.is_empty());
        assert!(resp.vocabulary.is_empty());
        assert!(resp.teaching_moment.is_none());
    }

    #[test]
    fn test_fragment_skips_empty_optionals() {
        let frag = Fragment {
            text_delta: "Hola".to_string(),
            ..Default::default()
        };
        let json = serde_json::to_string(&frag).unwrap();
        assert!(!json.contains("emotion"));
        assert!(!json.contains("cultural_note"));
    }

    #[test]
    fn test_generation_error_display_carries_message() {
        let err = GenerationError::Backend {
            message: "network timeout contacting model".to_string(),
        };
        assert!(err.to_string().contains("network timeout"));
    }
}
