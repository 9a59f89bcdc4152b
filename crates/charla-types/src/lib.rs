//! Shared domain types for Charla.
//!
//! Every crate in the workspace depends on this one and nothing else
//! in the workspace, so the types here carry no IO, no async, and no
//! framework dependencies -- just data shapes, enums, and error types.

pub mod config;
pub mod emotion;
pub mod error;
pub mod event;
pub mod generation;
pub mod identity;
pub mod session;
pub mod turn;
