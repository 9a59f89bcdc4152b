//! Event sink port and its mpsc-backed implementation.
//!
//! The orchestrator and pipeline never talk to a socket directly;
//! they push [`ConversationEvent`]s into an [`EventSink`]. The API
//! layer backs each connection with a [`ChannelSink`] whose receiver
//! is drained by a writer task.

use charla_types::event::ConversationEvent;
use thiserror::Error;
use tokio::sync::mpsc;

/// Failure to deliver an outbound event.
#[derive(Debug, Error)]
pub enum SinkError {
    /// The connection's outbound channel is gone (client disconnected).
    #[error("event channel closed")]
    Closed,
}

/// Outbound transport for conversation events.
pub trait EventSink: Send + Sync {
    /// Deliver one event; fails only when the connection is gone.
    fn send(
        &self,
        event: ConversationEvent,
    ) -> impl std::future::Future<Output = Result<(), SinkError>> + Send;

    /// Whether the sink can still accept events. Used as the
    /// best-effort health probe.
    fn is_open(&self) -> bool;
}

/// [`EventSink`] backed by a bounded tokio mpsc channel.
///
/// The bound gives the generator-to-transport path backpressure: a
/// slow consumer suspends the pipeline instead of growing an
/// unbounded queue.
#[derive(Clone)]
pub struct ChannelSink {
    tx: mpsc::Sender<ConversationEvent>,
}

impl ChannelSink {
    pub fn new(tx: mpsc::Sender<ConversationEvent>) -> Self {
        Self { tx }
    }
}

impl EventSink for ChannelSink {
    async fn send(&self, event: ConversationEvent) -> Result<(), SinkError> {
        self.tx.send(event).await.map_err(|_| SinkError::Closed)
    }

    fn is_open(&self) -> bool {
        !self.tx.is_closed()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn send_delivers_event() {
        let (tx, mut rx) = mpsc::channel(4);
        let sink = ChannelSink::new(tx);

        sink.send(ConversationEvent::CharacterThinking).await.unwrap();

        let event = rx.recv().await.unwrap();
        assert!(matches!(event, ConversationEvent::CharacterThinking));
    }

    #[tokio::test]
    async fn send_fails_once_receiver_dropped() {
        let (tx, rx) = mpsc::channel(4);
        let sink = ChannelSink::new(tx);
        assert!(sink.is_open());

        drop(rx);
        assert!(!sink.is_open());
        let err = sink.send(ConversationEvent::CharacterThinking).await;
        assert!(matches!(err, Err(SinkError::Closed)));
    }
}
