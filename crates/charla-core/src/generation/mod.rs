//! Generation boundary traits.
//!
//! The external response-generation backend is consumed through two
//! explicit operations rather than an ad-hoc iterate-then-accessor
//! convention: [`ResponseGenerator`] for starting work and
//! [`ResponseStream`] for walking fragments and retrieving the
//! consolidated final text. Adapters for different backends live in
//! charla-infra.

use charla_types::generation::{Fragment, GenerationError, GenerationRequest, GenerationResponse};

/// A stream of incremental reply fragments.
///
/// `next_fragment` futures must be cancel-safe: the streaming pipeline
/// polls them concurrently with its heartbeat and watchdog timers and
/// may drop an in-flight poll without losing a fragment.
pub trait ResponseStream: Send {
    /// The next fragment, or `None` once the sequence is exhausted.
    fn next_fragment(
        &mut self,
    ) -> impl std::future::Future<Output = Option<Result<Fragment, GenerationError>>> + Send;

    /// The accumulated final text; valid only after the fragment
    /// sequence is exhausted, `None` before then.
    fn final_text(&self) -> Option<&str>;
}

/// The response-generation backend contract.
///
/// Failures are opaque [`GenerationError`]s -- classification into
/// user-facing categories happens in the recovery engine, never here.
pub trait ResponseGenerator: Send + Sync {
    type Stream: ResponseStream;

    /// Produce a single finished reply.
    fn generate(
        &self,
        request: &GenerationRequest,
    ) -> impl std::future::Future<Output = Result<GenerationResponse, GenerationError>> + Send;

    /// Open an incremental fragment stream for the request.
    fn generate_stream(
        &self,
        request: GenerationRequest,
    ) -> impl std::future::Future<Output = Result<Self::Stream, GenerationError>> + Send;
}
