//! Conversation orchestration.
//!
//! `ChatOrchestrator` drives one user message end to end: validation,
//! turn persistence, generation (streaming or direct), fallback
//! recovery, and latency reporting. It owns the session registry and
//! the generator; the per-connection pieces (monitor, sink,
//! cancellation token) are passed in by the transport layer so the
//! orchestrator itself can be shared across connections.

use charla_types::config::StreamMode;
use charla_types::error::ErrorCategory;
use charla_types::event::ConversationEvent;
use charla_types::generation::GenerationRequest;
use charla_types::identity::UserId;
use charla_types::turn::TurnAnnotations;
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, warn};

use crate::event::{EventSink, SinkError};
use crate::generation::ResponseGenerator;
use crate::monitor::PerformanceMonitor;
use crate::recovery::{categorize, fallback_reply, scripted_message, validate_input, InputVerdict};
use crate::session::{SessionRegistry, SessionRepository};
use crate::stream::{PipelineError, StreamingPipeline};

/// What one generation attempt produced, before persistence.
struct TurnOutcome {
    text: String,
    emotion: Option<String>,
    detected_language: Option<String>,
}

/// Why one generation attempt produced nothing.
enum ExchangeFailure {
    /// Classified generator failure; goes through the fallback path.
    Generation(ErrorCategory),
    /// The connection is gone; nothing more can be delivered.
    Sink(SinkError),
    /// The connection's token fired mid-exchange.
    Cancelled,
}

/// Orchestrates the live conversation flow for every connection.
pub struct ChatOrchestrator<R: SessionRepository, G: ResponseGenerator> {
    registry: SessionRegistry<R>,
    generator: G,
    pipeline: StreamingPipeline,
    stream_mode: StreamMode,
}

impl<R: SessionRepository, G: ResponseGenerator> ChatOrchestrator<R, G> {
    pub fn new(registry: SessionRegistry<R>, generator: G, stream_mode: StreamMode) -> Self {
        Self {
            registry,
            generator,
            pipeline: StreamingPipeline::new(),
            stream_mode,
        }
    }

    pub fn registry(&self) -> &SessionRegistry<R> {
        &self.registry
    }

    /// Handle one inbound user message.
    ///
    /// Returns `Err` only when the outbound channel is gone; every
    /// other failure is converted into a persona-safe reply on the
    /// sink. Cancellation mid-exchange returns `Ok` quietly.
    pub async fn handle_user_message<E: EventSink>(
        &self,
        monitor: &mut PerformanceMonitor,
        sink: &E,
        user_id: &UserId,
        character_id: &str,
        text: &str,
        cancel: &CancellationToken,
    ) -> Result<(), SinkError> {
        if let InputVerdict::Rejected(category) = validate_input(text) {
            debug!(user_id = %user_id, category = %category, "Input rejected before generation");
            sink.send(ConversationEvent::CharacterResponse {
                text: scripted_message(character_id, category).to_string(),
                is_error: true,
                fallback: true,
            })
            .await?;
            return Ok(());
        }

        let (session, history) = match self.registry.append_user_turn(user_id, character_id, text).await {
            Ok(pair) => pair,
            Err(err) => {
                error!(user_id = %user_id, error = %err, "Failed to persist user turn");
                monitor.start_timer();
                return self
                    .emit_fallback(monitor, sink, character_id, text, ErrorCategory::GenerationFailure)
                    .await;
            }
        };

        monitor.start_timer();
        let request = GenerationRequest {
            character_id: character_id.to_string(),
            user_id: *user_id,
            session_id: session.id,
            message: text.to_string(),
            history,
        };

        let attempt = match self.stream_mode {
            StreamMode::Direct => self.run_direct(sink, &request).await,
            StreamMode::Incremental | StreamMode::Chunked => {
                self.run_streaming(monitor, sink, request, cancel).await
            }
        };

        match attempt {
            Ok(outcome) => {
                let annotations = TurnAnnotations {
                    detected_language: outcome.detected_language,
                    emotion: outcome.emotion,
                    audio_ref: None,
                };
                if let Err(err) = self
                    .registry
                    .append_character_turn(user_id, character_id, &outcome.text, annotations)
                    .await
                {
                    // The reply already reached the client; losing the
                    // stored turn only degrades future context.
                    error!(user_id = %user_id, error = %err, "Failed to persist character turn");
                }

                let timing = monitor.end_timer();
                sink.send(ConversationEvent::PerformanceMetrics {
                    response_time_ms: timing.elapsed_ms,
                    is_slow_response: timing.is_slow,
                })
                .await?;
                Ok(())
            }
            Err(ExchangeFailure::Cancelled) => {
                debug!(user_id = %user_id, "Exchange cancelled by connection teardown");
                monitor.end_timer();
                Ok(())
            }
            Err(ExchangeFailure::Sink(err)) => Err(err),
            Err(ExchangeFailure::Generation(category)) => {
                self.emit_fallback(monitor, sink, character_id, text, category).await
            }
        }
    }

    /// Handle a language-switch request.
    pub async fn handle_switch_language<E: EventSink>(
        &self,
        sink: &E,
        user_id: &UserId,
        language: &str,
    ) -> Result<(), SinkError> {
        match self.registry.switch_language(user_id, language).await {
            Ok(mode) => {
                sink.send(ConversationEvent::LanguageSwitched { mode }).await?;
            }
            Err(err) => {
                warn!(user_id = %user_id, language, error = %err, "Language switch rejected");
                sink.send(ConversationEvent::Error {
                    message: err.to_string(),
                })
                .await?;
            }
        }
        Ok(())
    }

    async fn run_streaming<E: EventSink>(
        &self,
        monitor: &PerformanceMonitor,
        sink: &E,
        request: GenerationRequest,
        cancel: &CancellationToken,
    ) -> Result<TurnOutcome, ExchangeFailure> {
        let mut stream = match self.generator.generate_stream(request).await {
            Ok(stream) => stream,
            Err(err) => {
                warn!(error = %err, "Failed to open generation stream");
                return Err(ExchangeFailure::Generation(categorize(&err)));
            }
        };

        let mut watchdog = monitor.watch_stream();
        match self.pipeline.relay(&mut stream, sink, &mut watchdog, cancel).await {
            Ok(outcome) => {
                sink.send(ConversationEvent::CharacterResponse {
                    text: outcome.final_text.clone(),
                    is_error: false,
                    fallback: false,
                })
                .await
                .map_err(ExchangeFailure::Sink)?;
                Ok(TurnOutcome {
                    text: outcome.final_text,
                    emotion: outcome.last_emotion,
                    detected_language: outcome.last_language,
                })
            }
            Err(PipelineError::Cancelled) => Err(ExchangeFailure::Cancelled),
            Err(PipelineError::Sink(err)) => Err(ExchangeFailure::Sink(err)),
            Err(PipelineError::Generation(err)) => {
                warn!(error = %err, "Generation failed mid-stream");
                Err(ExchangeFailure::Generation(categorize(&err)))
            }
            Err(PipelineError::MissingFinalText) => {
                warn!("Stream exhausted without a final text");
                Err(ExchangeFailure::Generation(ErrorCategory::GenerationFailure))
            }
        }
    }

    async fn run_direct<E: EventSink>(
        &self,
        sink: &E,
        request: &GenerationRequest,
    ) -> Result<TurnOutcome, ExchangeFailure> {
        let response = match self.generator.generate(request).await {
            Ok(response) => response,
            Err(err) => {
                warn!(error = %err, "Direct generation failed");
                return Err(ExchangeFailure::Generation(categorize(&err)));
            }
        };

        sink.send(ConversationEvent::CharacterResponse {
            text: response.text.clone(),
            is_error: false,
            fallback: false,
        })
        .await
        .map_err(ExchangeFailure::Sink)?;

        Ok(TurnOutcome {
            text: response.text,
            emotion: response.emotion,
            detected_language: None,
        })
    }

    /// Convert a classified failure into a persona-safe reply.
    ///
    /// The timer closes first so latency is reported even for failed
    /// exchanges. If the fallback cannot be delivered, one raw error
    /// signal is attempted and the sink failure propagates. That is
    /// the only path where a non-persona message reaches the client.
    async fn emit_fallback<E: EventSink>(
        &self,
        monitor: &mut PerformanceMonitor,
        sink: &E,
        character_id: &str,
        last_user_text: &str,
        category: ErrorCategory,
    ) -> Result<(), SinkError> {
        let timing = monitor.end_timer();
        monitor.track_error(category);

        let reply = fallback_reply(character_id, last_user_text);
        let delivered = async {
            sink.send(ConversationEvent::CharacterResponse {
                text: reply.text.clone(),
                is_error: true,
                fallback: true,
            })
            .await?;
            sink.send(ConversationEvent::VrmAnimation {
                animation: reply.animation.clone(),
            })
            .await
        }
        .await;

        if let Err(err) = delivered {
            let _ = sink
                .send(ConversationEvent::Error {
                    message: "Unable to deliver a reply. Please try again.".to_string(),
                })
                .await;
            return Err(err);
        }

        sink.send(ConversationEvent::PerformanceMetrics {
            response_time_ms: timing.elapsed_ms,
            is_slow_response: timing.is_slow,
        })
        .await?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::{Arc, Mutex};

    use charla_types::generation::{Fragment, GenerationError, GenerationResponse};
    use tokio::sync::mpsc;

    use crate::event::ChannelSink;
    use crate::generation::ResponseStream;
    use crate::session::memory::InMemorySessionRepository;

    enum Script {
        Fragments(Vec<Fragment>),
        FailMidStream { fragments: Vec<Fragment>, message: String },
        Direct(GenerationResponse),
    }

    struct MockGenerator {
        script: Script,
        requests: Arc<Mutex<Vec<GenerationRequest>>>,
    }

    impl MockGenerator {
        fn new(script: Script) -> (Self, Arc<Mutex<Vec<GenerationRequest>>>) {
            let requests = Arc::new(Mutex::new(Vec::new()));
            (
                Self {
                    script,
                    requests: requests.clone(),
                },
                requests,
            )
        }
    }

    struct VecStream {
        items: std::vec::IntoIter<Result<Fragment, GenerationError>>,
        collected: String,
        done: bool,
    }

    impl ResponseStream for VecStream {
        async fn next_fragment(&mut self) -> Option<Result<Fragment, GenerationError>> {
            match self.items.next() {
                Some(Ok(fragment)) => {
                    self.collected.push_str(&fragment.text_delta);
                    Some(Ok(fragment))
                }
                Some(Err(err)) => Some(Err(err)),
                None => {
                    self.done = true;
                    None
                }
            }
        }

        fn final_text(&self) -> Option<&str> {
            self.done.then_some(self.collected.as_str())
        }
    }

    impl ResponseGenerator for MockGenerator {
        type Stream = VecStream;

        async fn generate(
            &self,
            request: &GenerationRequest,
        ) -> Result<GenerationResponse, GenerationError> {
            self.requests.lock().unwrap().push(request.clone());
            match &self.script {
                Script::Direct(response) => Ok(response.clone()),
                _ => Err(GenerationError::InvalidRequest(
                    "direct mode not scripted".to_string(),
                )),
            }
        }

        async fn generate_stream(
            &self,
            request: GenerationRequest,
        ) -> Result<Self::Stream, GenerationError> {
            self.requests.lock().unwrap().push(request);
            let items: Vec<Result<Fragment, GenerationError>> = match &self.script {
                Script::Fragments(fragments) => fragments.iter().cloned().map(Ok).collect(),
                Script::FailMidStream { fragments, message } => fragments
                    .iter()
                    .cloned()
                    .map(Ok)
                    .chain(std::iter::once(Err(GenerationError::Backend {
                        message: message.clone(),
                    })))
                    .collect(),
                Script::Direct(_) => Vec::new(),
            };
            Ok(VecStream {
                items: items.into_iter(),
                collected: String::new(),
                done: false,
            })
        }
    }

    fn text_fragment(text: &str) -> Fragment {
        Fragment {
            text_delta: text.to_string(),
            ..Default::default()
        }
    }

    fn orchestrator(
        script: Script,
        mode: StreamMode,
    ) -> (
        ChatOrchestrator<InMemorySessionRepository, MockGenerator>,
        Arc<Mutex<Vec<GenerationRequest>>>,
    ) {
        let (generator, requests) = MockGenerator::new(script);
        let registry = SessionRegistry::new(InMemorySessionRepository::new());
        (ChatOrchestrator::new(registry, generator, mode), requests)
    }

    fn harness() -> (ChannelSink, mpsc::Receiver<ConversationEvent>) {
        let (tx, rx) = mpsc::channel(64);
        (ChannelSink::new(tx), rx)
    }

    fn drain(rx: &mut mpsc::Receiver<ConversationEvent>) -> Vec<ConversationEvent> {
        let mut events = Vec::new();
        while let Ok(event) = rx.try_recv() {
            events.push(event);
        }
        events
    }

    #[tokio::test]
    async fn first_message_creates_session_streams_reply_and_persists_both_turns() {
        let (orchestrator, requests) = orchestrator(
            Script::Fragments(vec![text_fragment("¡Hola! "), text_fragment("¿Cómo estás?")]),
            StreamMode::Incremental,
        );
        let user = UserId::new();
        let mut monitor = PerformanceMonitor::new(user);
        let (sink, mut rx) = harness();

        orchestrator
            .handle_user_message(&mut monitor, &sink, &user, "sofia", "Hola", &CancellationToken::new())
            .await
            .unwrap();

        // Generator saw the message with empty history.
        let seen = requests.lock().unwrap();
        assert_eq!(seen.len(), 1);
        assert_eq!(seen[0].message, "Hola");
        assert!(seen[0].history.is_empty());
        drop(seen);

        // One session, two turns (user + character).
        let session = orchestrator.registry().current_session(&user).await.unwrap().unwrap();
        assert_eq!(
            orchestrator.registry().repo().count_turns(&session.id).await.unwrap(),
            2
        );

        let events = drain(&mut rx);
        let chunks = events
            .iter()
            .filter(|e| matches!(e, ConversationEvent::CharacterStream { .. }))
            .count();
        assert_eq!(chunks, 2);
        assert!(events.iter().any(|e| matches!(
            e,
            ConversationEvent::CharacterResponse { text, is_error: false, .. }
                if text == "¡Hola! ¿Cómo estás?"
        )));
        assert!(events
            .iter()
            .any(|e| matches!(e, ConversationEvent::PerformanceMetrics { .. })));
    }

    #[tokio::test]
    async fn empty_input_gets_scripted_reply_without_touching_generator_or_storage() {
        let (orchestrator, requests) =
            orchestrator(Script::Fragments(vec![]), StreamMode::Incremental);
        let user = UserId::new();
        let mut monitor = PerformanceMonitor::new(user);
        let (sink, mut rx) = harness();

        orchestrator
            .handle_user_message(&mut monitor, &sink, &user, "sofia", "", &CancellationToken::new())
            .await
            .unwrap();

        assert!(requests.lock().unwrap().is_empty());
        assert!(orchestrator.registry().current_session(&user).await.unwrap().is_none());

        let events = drain(&mut rx);
        assert_eq!(events.len(), 1);
        match &events[0] {
            ConversationEvent::CharacterResponse { text, is_error, fallback } => {
                assert!(*is_error);
                assert!(*fallback);
                assert_eq!(
                    text,
                    scripted_message("sofia", ErrorCategory::UnclearInput)
                );
            }
            other => panic!("unexpected event: {other:?}"),
        }
    }

    #[tokio::test]
    async fn mid_stream_network_failure_falls_back_in_character() {
        let (orchestrator, _) = orchestrator(
            Script::FailMidStream {
                fragments: vec![text_fragment("Déjame pens")],
                message: "network timeout contacting model".to_string(),
            },
            StreamMode::Incremental,
        );
        let user = UserId::new();
        let mut monitor = PerformanceMonitor::new(user);
        let (sink, mut rx) = harness();

        orchestrator
            .handle_user_message(
                &mut monitor,
                &sink,
                &user,
                "sofia",
                "¿Qué opinas?",
                &CancellationToken::new(),
            )
            .await
            .unwrap();

        assert_eq!(monitor.error_count(ErrorCategory::ConnectivityIssue), 1);

        // Only the user turn was stored; the fallback is not persisted.
        let session = orchestrator.registry().current_session(&user).await.unwrap().unwrap();
        assert_eq!(
            orchestrator.registry().repo().count_turns(&session.id).await.unwrap(),
            1
        );

        let events = drain(&mut rx);
        let response = events
            .iter()
            .find_map(|e| match e {
                ConversationEvent::CharacterResponse { text, is_error, fallback } => {
                    Some((text.clone(), *is_error, *fallback))
                }
                _ => None,
            })
            .expect("fallback response expected");
        assert!(response.1);
        assert!(response.2);
        // Persona reply, never the raw error.
        assert!(!response.0.to_lowercase().contains("network"));
        assert!(events
            .iter()
            .any(|e| matches!(e, ConversationEvent::VrmAnimation { animation } if animation == "gesture_nod")));
        assert!(events
            .iter()
            .any(|e| matches!(e, ConversationEvent::PerformanceMetrics { .. })));
    }

    #[tokio::test]
    async fn cancellation_mid_exchange_is_quiet_and_skips_character_turn() {
        let (orchestrator, _) = orchestrator(
            Script::Fragments(vec![text_fragment("nunca llega")]),
            StreamMode::Incremental,
        );
        let user = UserId::new();
        let mut monitor = PerformanceMonitor::new(user);
        let (sink, mut rx) = harness();
        let cancel = CancellationToken::new();
        cancel.cancel();

        orchestrator
            .handle_user_message(&mut monitor, &sink, &user, "sofia", "Hola otra vez", &cancel)
            .await
            .unwrap();

        let session = orchestrator.registry().current_session(&user).await.unwrap().unwrap();
        assert_eq!(
            orchestrator.registry().repo().count_turns(&session.id).await.unwrap(),
            1
        );
        let events = drain(&mut rx);
        assert!(!events
            .iter()
            .any(|e| matches!(e, ConversationEvent::CharacterResponse { .. })));
    }

    #[tokio::test]
    async fn direct_mode_sends_one_finished_reply() {
        let (orchestrator, _) = orchestrator(
            Script::Direct(GenerationResponse {
                text: "¡Muy bien dicho!".to_string(),
                emotion: Some("happy".to_string()),
                corrections: vec![],
                vocabulary: vec![],
                teaching_moment: None,
            }),
            StreamMode::Direct,
        );
        let user = UserId::new();
        let mut monitor = PerformanceMonitor::new(user);
        let (sink, mut rx) = harness();

        orchestrator
            .handle_user_message(
                &mut monitor,
                &sink,
                &user,
                "diego",
                "Fui al mercado",
                &CancellationToken::new(),
            )
            .await
            .unwrap();

        let session = orchestrator.registry().current_session(&user).await.unwrap().unwrap();
        assert_eq!(
            orchestrator.registry().repo().count_turns(&session.id).await.unwrap(),
            2
        );

        let events = drain(&mut rx);
        assert!(events.iter().any(|e| matches!(
            e,
            ConversationEvent::CharacterResponse { text, is_error: false, .. }
                if text == "¡Muy bien dicho!"
        )));
        assert!(!events
            .iter()
            .any(|e| matches!(e, ConversationEvent::CharacterStream { .. })));
    }

    #[tokio::test]
    async fn invalid_language_switch_reports_error_event() {
        let (orchestrator, _) =
            orchestrator(Script::Fragments(vec![]), StreamMode::Incremental);
        let user = UserId::new();
        let (sink, mut rx) = harness();

        orchestrator
            .handle_switch_language(&sink, &user, "klingon")
            .await
            .unwrap();

        let events = drain(&mut rx);
        assert!(events
            .iter()
            .any(|e| matches!(e, ConversationEvent::Error { message } if message.contains("klingon"))));
    }

    #[tokio::test]
    async fn valid_language_switch_acknowledged() {
        let (orchestrator, _) =
            orchestrator(Script::Fragments(vec![]), StreamMode::Incremental);
        let user = UserId::new();
        let (sink, mut rx) = harness();

        orchestrator
            .handle_switch_language(&sink, &user, "mixed")
            .await
            .unwrap();

        let events = drain(&mut rx);
        assert!(events
            .iter()
            .any(|e| matches!(e, ConversationEvent::LanguageSwitched { .. })));
    }
}
