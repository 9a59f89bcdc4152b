//! Conversation WebSocket handler.
//!
//! `/api/v1/ws/conversation?character=<id>` upgrades to the main chat
//! channel. Outbound events are drained from a bounded mpsc queue by a
//! writer task; inbound commands are processed sequentially in arrival
//! order, so one connection never has two generations in flight.
//!
//! Disconnect is hard termination: the connection's cancellation token
//! fires (aborting any in-flight generation) and every session owned
//! by the identity is deleted. Turns are retained.

use axum::extract::ws::{Message, WebSocket, WebSocketUpgrade};
use axum::extract::{Query, State};
use axum::response::IntoResponse;
use charla_core::event::ChannelSink;
use charla_core::monitor::PerformanceMonitor;
use charla_types::event::{ConversationCommand, ConversationEvent};
use charla_types::identity::UserId;
use futures_util::{SinkExt, StreamExt};
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;

use crate::http::extractors::auth::AuthenticatedUser;
use crate::state::AppState;

/// Bound for the outbound event queue; a slow client applies
/// backpressure to the pipeline instead of growing memory.
const OUTBOUND_QUEUE: usize = 64;

#[derive(Debug, serde::Deserialize)]
pub struct ConversationQuery {
    /// Character persona to converse with.
    #[serde(default = "default_character")]
    pub character: String,
}

fn default_character() -> String {
    "sofia".to_string()
}

/// Upgrade an HTTP request to the conversation channel.
pub async fn conversation_ws(
    ws: WebSocketUpgrade,
    Query(query): Query<ConversationQuery>,
    AuthenticatedUser(user_id): AuthenticatedUser,
    State(state): State<AppState>,
) -> impl IntoResponse {
    ws.on_upgrade(move |socket| handle_conversation(socket, state, user_id, query.character))
}

async fn handle_conversation(
    socket: WebSocket,
    state: AppState,
    user_id: UserId,
    character_id: String,
) {
    tracing::info!(user_id = %user_id, character = %character_id, "Conversation channel opened");

    let (mut ws_sender, mut ws_receiver) = socket.split();
    let (tx, mut rx) = mpsc::channel::<ConversationEvent>(OUTBOUND_QUEUE);
    let sink = ChannelSink::new(tx);

    // Writer task: drain the event queue onto the socket.
    let writer = tokio::spawn(async move {
        while let Some(event) = rx.recv().await {
            match serde_json::to_string(&event) {
                Ok(json) => {
                    if ws_sender.send(Message::Text(json.into())).await.is_err() {
                        break;
                    }
                }
                Err(err) => {
                    tracing::warn!(error = %err, "Failed to serialize conversation event");
                }
            }
        }
    });

    let cancel = CancellationToken::new();
    let mut monitor = PerformanceMonitor::new(user_id);

    while let Some(msg) = ws_receiver.next().await {
        match msg {
            Ok(Message::Text(text)) => {
                let command: ConversationCommand = match serde_json::from_str(&text) {
                    Ok(command) => command,
                    Err(err) => {
                        tracing::warn!(raw = %text, error = %err, "Ignoring malformed conversation command");
                        continue;
                    }
                };

                let result = match command {
                    ConversationCommand::UserMessage { text } => {
                        state
                            .orchestrator
                            .handle_user_message(
                                &mut monitor,
                                &sink,
                                &user_id,
                                &character_id,
                                &text,
                                &cancel,
                            )
                            .await
                    }
                    ConversationCommand::SwitchLanguage { language } => {
                        state
                            .orchestrator
                            .handle_switch_language(&sink, &user_id, &language)
                            .await
                    }
                };

                if result.is_err() {
                    // Outbound channel gone; the client is disconnecting.
                    break;
                }
            }
            Ok(Message::Close(_)) => break,
            Err(err) => {
                tracing::debug!(user_id = %user_id, error = %err, "Conversation receive error");
                break;
            }
            // Binary, ping, pong protocol frames are handled by axum.
            Ok(_) => {}
        }
    }

    // Hard termination: abort in-flight work, delete the sessions.
    cancel.cancel();
    if let Err(err) = state.orchestrator.registry().end_session(&user_id).await {
        tracing::error!(user_id = %user_id, error = %err, "Failed to delete sessions on disconnect");
    }

    drop(sink);
    let _ = writer.await;
    tracing::info!(user_id = %user_id, "Conversation channel closed");
}
