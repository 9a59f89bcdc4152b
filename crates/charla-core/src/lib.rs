//! Conversation orchestration logic and repository trait definitions for Charla.
//!
//! This crate defines the "ports" (the session repository and the
//! generation boundary) that the infrastructure layer implements. It
//! depends only on `charla-types` -- never on `charla-infra` or any
//! database/HTTP crate.

pub mod conversation;
pub mod emotion;
pub mod event;
pub mod generation;
pub mod monitor;
pub mod recovery;
pub mod session;
pub mod stream;
