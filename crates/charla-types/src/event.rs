//! WebSocket event vocabulary, one enum pair per namespace.
//!
//! The conversation, emotion, and animation namespaces are logically
//! independent channels; each has an inbound command enum (client to
//! server) and an outbound event enum (server to client). All frames
//! are JSON objects tagged with `type` in snake_case. Unknown inbound
//! frames are logged and ignored by the handlers.

use serde::{Deserialize, Serialize};

use crate::emotion::Emotion;
use crate::session::LanguageMode;

// ---------------------------------------------------------------------------
// Conversation namespace
// ---------------------------------------------------------------------------

/// Inbound command on the conversation channel.
#[derive(Debug, Clone, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ConversationCommand {
    /// A user message to be answered by the character.
    UserMessage { text: String },
    /// Request to switch the session's language mode.
    SwitchLanguage { language: String },
}

/// Outbound event on the conversation channel.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ConversationEvent {
    /// Content-free liveness heartbeat during generation gaps.
    CharacterThinking,

    /// An incremental chunk of the character's reply.
    CharacterStream {
        chunk: String,
        #[serde(skip_serializing_if = "Option::is_none")]
        emotion: Option<String>,
        #[serde(skip_serializing_if = "Option::is_none")]
        language_detected: Option<String>,
    },

    /// Renderer command for the character avatar.
    VrmAnimation { animation: String },

    /// Cultural context note surfaced alongside the reply.
    CulturalContext { note: String },

    /// A finished character reply (direct mode, or fallback).
    CharacterResponse {
        text: String,
        #[serde(default, skip_serializing_if = "std::ops::Not::not")]
        is_error: bool,
        #[serde(default, skip_serializing_if = "std::ops::Not::not")]
        fallback: bool,
    },

    /// Round-trip latency report for the last exchange.
    PerformanceMetrics {
        response_time_ms: u64,
        is_slow_response: bool,
    },

    /// One-time warning for an abnormally long-running stream.
    StreamWarning { message: String, duration_ms: u64 },

    /// Acknowledges a successful language switch.
    LanguageSwitched { mode: LanguageMode },

    /// Raw error signal; the only persona-neutral failure path.
    Error { message: String },
}

// ---------------------------------------------------------------------------
// Emotion namespace
// ---------------------------------------------------------------------------

/// Inbound command on the emotion channel.
#[derive(Debug, Clone, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum EmotionCommand {
    /// Raw user text to classify.
    UserEmotion { text: String },
}

/// Outbound event on the emotion channel.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum EmotionEvent {
    CharacterEmotionChange { emotion: Emotion, intensity: f32 },
}

// ---------------------------------------------------------------------------
// Animation namespace
// ---------------------------------------------------------------------------

/// Inbound command on the animation channel.
#[derive(Debug, Clone, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum AnimationCommand {
    CharacterEmotionChange {
        emotion: Emotion,
        #[serde(default)]
        intensity: f32,
    },
    LipSyncData {
        viseme: String,
    },
    GestureRequest {
        gesture: String,
    },
}

/// Outbound event on the animation channel.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum AnimationEvent {
    VrmAnimation { animation: String },
}
