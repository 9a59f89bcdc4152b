//! Observability setup for Charla.

pub mod tracing_setup;
