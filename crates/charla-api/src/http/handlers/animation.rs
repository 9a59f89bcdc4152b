//! Animation WebSocket handler.
//!
//! The renderer's channel. On connect it registers an outbound sender
//! in the cross-connection registry so the emotion channel can relay
//! expression changes to it; inbound commands (emotion changes, lip
//! sync visemes, gesture requests) are mapped to `vrm_animation`
//! renderer commands on the same socket.

use axum::extract::ws::{Message, WebSocket, WebSocketUpgrade};
use axum::extract::State;
use axum::response::IntoResponse;
use charla_types::emotion::expression_for;
use charla_types::event::{AnimationCommand, AnimationEvent};
use charla_types::identity::UserId;
use futures_util::{SinkExt, StreamExt};
use tokio::sync::mpsc;

use crate::http::extractors::auth::AuthenticatedUser;
use crate::state::AppState;

const OUTBOUND_QUEUE: usize = 32;

/// Upgrade an HTTP request to the animation channel.
pub async fn animation_ws(
    ws: WebSocketUpgrade,
    AuthenticatedUser(user_id): AuthenticatedUser,
    State(state): State<AppState>,
) -> impl IntoResponse {
    ws.on_upgrade(move |socket| handle_animation(socket, state, user_id))
}

async fn handle_animation(socket: WebSocket, state: AppState, user_id: UserId) {
    tracing::debug!(user_id = %user_id, "Animation channel opened");

    let (mut ws_sender, mut ws_receiver) = socket.split();
    let (tx, mut rx) = mpsc::channel::<AnimationEvent>(OUTBOUND_QUEUE);

    // Register for relays from the emotion channel. A reconnect
    // replaces any stale sender for this identity.
    state.animation_channels.insert(user_id, tx.clone());

    let writer = tokio::spawn(async move {
        while let Some(event) = rx.recv().await {
            match serde_json::to_string(&event) {
                Ok(json) => {
                    if ws_sender.send(Message::Text(json.into())).await.is_err() {
                        break;
                    }
                }
                Err(err) => {
                    tracing::debug!(error = %err, "Failed to serialize animation event");
                }
            }
        }
    });

    while let Some(msg) = ws_receiver.next().await {
        match msg {
            Ok(Message::Text(text)) => {
                let command: AnimationCommand = match serde_json::from_str(&text) {
                    Ok(command) => command,
                    Err(err) => {
                        tracing::debug!(raw = %text, error = %err, "Ignoring malformed animation command");
                        continue;
                    }
                };

                let animation = match command {
                    AnimationCommand::CharacterEmotionChange { emotion, .. } => {
                        expression_for(emotion).to_string()
                    }
                    AnimationCommand::LipSyncData { viseme } => format!("viseme_{viseme}"),
                    AnimationCommand::GestureRequest { gesture } => gesture,
                };

                if tx
                    .send(AnimationEvent::VrmAnimation { animation })
                    .await
                    .is_err()
                {
                    break;
                }
            }
            Ok(Message::Close(_)) => break,
            Err(err) => {
                tracing::debug!(user_id = %user_id, error = %err, "Animation receive error");
                break;
            }
            Ok(_) => {}
        }
    }

    // Deregister only if the registry still points at this connection.
    state
        .animation_channels
        .remove_if(&user_id, |_, sender| sender.same_channel(&tx));
    drop(tx);
    let _ = writer.await;
    tracing::debug!(user_id = %user_id, "Animation channel closed");
}
