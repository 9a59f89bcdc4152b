//! Error recovery engine.
//!
//! Three stages around the generation boundary:
//!
//! - pre-generation input validation (invalid input never reaches the
//!   generator, and no user turn is persisted for it)
//! - post-generation classification of opaque generator failures into
//!   an [`ErrorCategory`](charla_types::error::ErrorCategory)
//! - persona-safe scripted and synthesized fallback replies
//!
//! Raw error detail stays server-side. The only path where an
//! unrecovered failure reaches the client is a failure while emitting
//! the fallback itself.

pub mod classify;
pub mod fallback;
pub mod persona;
pub mod validation;

pub use classify::categorize;
pub use fallback::{fallback_reply, FallbackReply};
pub use persona::{persona_for, scripted_message, Persona};
pub use validation::{validate_input, InputVerdict, MIN_INPUT_CHARS};
