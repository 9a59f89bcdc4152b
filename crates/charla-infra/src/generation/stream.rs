//! Fragment stream implementations for the HTTP backend.

use std::pin::Pin;

use charla_core::generation::ResponseStream;
use charla_types::generation::{Fragment, GenerationError, GenerationResponse};
use futures_util::{Stream, StreamExt};

/// Boxed SSE fragment source.
pub type FragmentSource = Pin<Box<dyn Stream<Item = Result<Fragment, GenerationError>> + Send>>;

/// A true incremental stream backed by the backend's SSE endpoint.
///
/// The consolidated final text is accumulated from the deltas as they
/// pass through and becomes available once the source is exhausted.
pub struct SseStream {
    source: FragmentSource,
    collected: String,
    done: bool,
}

impl SseStream {
    pub fn new(source: FragmentSource) -> Self {
        Self {
            source,
            collected: String::new(),
            done: false,
        }
    }
}

impl ResponseStream for SseStream {
    async fn next_fragment(&mut self) -> Option<Result<Fragment, GenerationError>> {
        match self.source.next().await {
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

/// Simulated streaming: a finished response replayed as fixed-size
/// chunks. The first chunk carries the response's emotion annotation;
/// the teaching moment, when present, follows as a cultural note.
pub struct ChunkedStream {
    fragments: std::vec::IntoIter<Fragment>,
    full_text: String,
    done: bool,
}

impl ChunkedStream {
    pub fn new(response: GenerationResponse, chunk_chars: usize) -> Self {
        let mut fragments: Vec<Fragment> = chunk_text(&response.text, chunk_chars)
            .into_iter()
            .map(|chunk| Fragment {
                text_delta: chunk,
                ..Default::default()
            })
            .collect();
        if let Some(first) = fragments.first_mut() {
            first.emotion = response.emotion.clone();
        }
        if let Some(note) = response.teaching_moment {
            fragments.push(Fragment {
                cultural_note: Some(note),
                ..Default::default()
            });
        }

        Self {
            fragments: fragments.into_iter(),
            full_text: response.text,
            done: false,
        }
    }
}

impl ResponseStream for ChunkedStream {
    async fn next_fragment(&mut self) -> Option<Result<Fragment, GenerationError>> {
        match self.fragments.next() {
            Some(fragment) => Some(Ok(fragment)),
            None => {
                self.done = true;
                None
            }
        }
    }

    fn final_text(&self) -> Option<&str> {
        self.done.then_some(self.full_text.as_str())
    }
}

/// The single stream type the generator exposes, covering both modes.
pub enum BackendStream {
    Sse(SseStream),
    Chunked(ChunkedStream),
}

impl ResponseStream for BackendStream {
    async fn next_fragment(&mut self) -> Option<Result<Fragment, GenerationError>> {
        match self {
            BackendStream::Sse(stream) => stream.next_fragment().await,
            BackendStream::Chunked(stream) => stream.next_fragment().await,
        }
    }

    fn final_text(&self) -> Option<&str> {
        match self {
            BackendStream::Sse(stream) => stream.final_text(),
            BackendStream::Chunked(stream) => stream.final_text(),
        }
    }
}

/// Split text into chunks of at most `chunk_chars` characters,
/// respecting char boundaries.
pub fn chunk_text(text: &str, chunk_chars: usize) -> Vec<String> {
    let chunk_chars = chunk_chars.max(1);
    let chars: Vec<char> = text.chars().collect();
    chars
        .chunks(chunk_chars)
        .map(|chunk| chunk.iter().collect())
        .collect()
}
