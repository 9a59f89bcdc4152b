//! Infrastructure implementations for Charla.
//!
//! Provides the concrete adapters behind the ports defined in
//! `charla-core`: SQLite persistence and the HTTP generation-backend
//! client, plus the configuration loader.

pub mod config;
pub mod generation;
pub mod sqlite;
