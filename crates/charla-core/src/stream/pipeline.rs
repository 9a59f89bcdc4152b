//! Fragment relay with heartbeats, watchdog polling, and cancellation.
//!
//! The pipeline sits between a [`ResponseStream`] and an [`EventSink`]
//! and multiplexes three concerns with `tokio::select!`:
//!
//! - forward each fragment to the transport the moment it arrives
//! - emit a content-free `character_thinking` heartbeat when a
//!   fragment gap exceeds the heartbeat interval (at most one per gap)
//! - fire the stream watchdog's one-time warning when the stream runs
//!   past its limit, without altering the stream
//!
//! Generator errors are not caught here; they propagate to the caller
//! inside [`PipelineError`]. Cancelling the connection's token aborts
//! the relay before any further persistence can happen.

use std::time::Duration;

use charla_types::event::ConversationEvent;
use charla_types::generation::GenerationError;
use thiserror::Error;
use tokio_util::sync::CancellationToken;

use crate::event::{EventSink, SinkError};
use crate::generation::ResponseStream;
use crate::monitor::StreamWatchdog;

/// Maximum quiet period between outbound emissions before a heartbeat.
pub const HEARTBEAT_INTERVAL_MS: u64 = 2_000;

/// Failure while relaying a fragment stream.
#[derive(Debug, Error)]
pub enum PipelineError {
    #[error(transparent)]
    Generation(#[from] GenerationError),

    #[error(transparent)]
    Sink(#[from] SinkError),

    /// The stream exhausted without producing a consolidated text.
    #[error("stream ended without a final text")]
    MissingFinalText,

    /// The connection was torn down mid-stream.
    #[error("stream cancelled")]
    Cancelled,
}

/// What a completed relay produced.
#[derive(Debug, Clone)]
pub struct RelayOutcome {
    /// The canonical character reply, from the stream's final-text accessor.
    pub final_text: String,
    /// Last emotion annotation seen on a fragment, if any.
    pub last_emotion: Option<String>,
    /// Last detected-language annotation seen on a fragment, if any.
    pub last_language: Option<String>,
    pub fragment_count: usize,
}

/// Relays fragments from a generation stream to an event sink.
pub struct StreamingPipeline {
    heartbeat: Duration,
}

impl StreamingPipeline {
    pub fn new() -> Self {
        Self {
            heartbeat: Duration::from_millis(HEARTBEAT_INTERVAL_MS),
        }
    }

    /// Override the heartbeat interval (tests only need shorter gaps).
    pub fn with_heartbeat(heartbeat: Duration) -> Self {
        Self { heartbeat }
    }

    /// Drive the stream to exhaustion, relaying every fragment.
    pub async fn relay<S, E>(
        &self,
        stream: &mut S,
        sink: &E,
        watchdog: &mut StreamWatchdog,
        cancel: &CancellationToken,
    ) -> Result<RelayOutcome, PipelineError>
    where
        S: ResponseStream,
        E: EventSink,
    {
        let mut last_emotion: Option<String> = None;
        let mut last_language: Option<String> = None;
        let mut fragment_count = 0usize;
        let mut heartbeat_due = tokio::time::Instant::now() + self.heartbeat;
        let mut heartbeat_sent_in_gap = false;

        loop {
            tokio::select! {
                () = cancel.cancelled() => {
                    return Err(PipelineError::Cancelled);
                }

                fragment = stream.next_fragment() => {
                    match fragment {
                        None => break,
                        Some(Err(err)) => return Err(err.into()),
                        Some(Ok(fragment)) => {
                            if fragment.emotion.is_some() {
                                last_emotion = fragment.emotion.clone();
                            }
                            if fragment.detected_language.is_some() {
                                last_language = fragment.detected_language.clone();
                            }

                            let mut emitted = false;
                            if !fragment.text_delta.is_empty() {
                                sink.send(ConversationEvent::CharacterStream {
                                    chunk: fragment.text_delta,
                                    emotion: fragment.emotion,
                                    language_detected: fragment.detected_language,
                                })
                                .await?;
                                emitted = true;
                            }
                            if let Some(animation) = fragment.animation {
                                sink.send(ConversationEvent::VrmAnimation { animation }).await?;
                                emitted = true;
                            }
                            if let Some(note) = fragment.cultural_note {
                                sink.send(ConversationEvent::CulturalContext { note }).await?;
                                emitted = true;
                            }

                            fragment_count += 1;
                            // The heartbeat clock measures quiet time on
                            // the wire; an annotation-only fragment that
                            // emits nothing must not push it back.
                            if emitted {
                                heartbeat_due = tokio::time::Instant::now() + self.heartbeat;
                                heartbeat_sent_in_gap = false;
                            }
                        }
                    }
                }

                _ = tokio::time::sleep_until(heartbeat_due), if !heartbeat_sent_in_gap => {
                    sink.send(ConversationEvent::CharacterThinking).await?;
                    heartbeat_sent_in_gap = true;
                }

                _ = tokio::time::sleep_until(watchdog.deadline()), if !watchdog.warned() => {
                    let elapsed = watchdog.trip();
                    sink.send(ConversationEvent::StreamWarning {
                        message: "The response is taking longer than usual".to_string(),
                        duration_ms: elapsed.as_millis() as u64,
                    })
                    .await?;
                }
            }
        }

        let final_text = stream
            .final_text()
            .ok_or(PipelineError::MissingFinalText)?
            .to_string();

        Ok(RelayOutcome {
            final_text,
            last_emotion,
            last_language,
            fragment_count,
        })
    }
}

impl Default for StreamingPipeline {
    fn default() -> Self {
        Self::new()
    }
}
