//! Streaming pipeline: fragment relay with liveness heartbeats.

pub mod pipeline;

pub use pipeline::{PipelineError, RelayOutcome, StreamingPipeline, HEARTBEAT_INTERVAL_MS};
