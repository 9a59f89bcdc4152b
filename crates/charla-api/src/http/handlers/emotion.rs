//! Emotion WebSocket handler.
//!
//! A secondary, best-effort channel: raw user text comes in, a
//! classified emotion signal goes back, and the matching renderer
//! expression is relayed to the user's animation channel when one is
//! connected. Nothing on this path ever surfaces a failure to the
//! user; problems are logged and the classification degrades to
//! neutral.

use axum::extract::ws::{Message, WebSocket, WebSocketUpgrade};
use axum::extract::State;
use axum::response::IntoResponse;
use charla_core::emotion::classify;
use charla_types::emotion::expression_for;
use charla_types::event::{AnimationEvent, EmotionCommand, EmotionEvent};
use charla_types::identity::UserId;
use futures_util::StreamExt;

use crate::http::extractors::auth::AuthenticatedUser;
use crate::state::AppState;

/// Upgrade an HTTP request to the emotion channel.
pub async fn emotion_ws(
    ws: WebSocketUpgrade,
    AuthenticatedUser(user_id): AuthenticatedUser,
    State(state): State<AppState>,
) -> impl IntoResponse {
    ws.on_upgrade(move |socket| handle_emotion(socket, state, user_id))
}

async fn handle_emotion(mut socket: WebSocket, state: AppState, user_id: UserId) {
    tracing::debug!(user_id = %user_id, "Emotion channel opened");

    while let Some(msg) = socket.next().await {
        match msg {
            Ok(Message::Text(text)) => {
                let command: EmotionCommand = match serde_json::from_str(&text) {
                    Ok(command) => command,
                    Err(err) => {
                        tracing::debug!(raw = %text, error = %err, "Ignoring malformed emotion command");
                        continue;
                    }
                };

                let EmotionCommand::UserEmotion { text } = command;
                let signal = classify(&text);

                let event = EmotionEvent::CharacterEmotionChange {
                    emotion: signal.emotion,
                    intensity: signal.intensity,
                };
                match serde_json::to_string(&event) {
                    Ok(json) => {
                        if socket.send(Message::Text(json.into())).await.is_err() {
                            break;
                        }
                    }
                    Err(err) => {
                        tracing::debug!(error = %err, "Failed to serialize emotion event");
                    }
                }

                relay_to_animation(&state, &user_id, signal.emotion).await;
            }
            Ok(Message::Close(_)) => break,
            Err(err) => {
                tracing::debug!(user_id = %user_id, error = %err, "Emotion receive error");
                break;
            }
            Ok(_) => {}
        }
    }

    tracing::debug!(user_id = %user_id, "Emotion channel closed");
}

/// Best-effort relay of the classified emotion to the user's animation
/// channel. A missing or full channel is logged, never surfaced.
async fn relay_to_animation(state: &AppState, user_id: &UserId, emotion: charla_types::emotion::Emotion) {
    let Some(tx) = state
        .animation_channels
        .get(user_id)
        .map(|entry| entry.value().clone())
    else {
        tracing::debug!(user_id = %user_id, "No animation channel connected, skipping relay");
        return;
    };

    let event = AnimationEvent::VrmAnimation {
        animation: expression_for(emotion).to_string(),
    };
    if let Err(err) = tx.try_send(event) {
        tracing::debug!(user_id = %user_id, error = %err, "Animation relay dropped");
    }
}
