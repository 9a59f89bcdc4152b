//! Generation backend adapters.
//!
//! `HttpResponseGenerator` drives the external backend over HTTP:
//! direct JSON request/response, a true SSE fragment stream, or a
//! locally chunked simulation of streaming, selected by
//! [`StreamMode`](charla_types::config::StreamMode).

pub mod http;
pub mod stream;

pub use http::HttpResponseGenerator;
pub use stream::{BackendStream, ChunkedStream, SseStream};
