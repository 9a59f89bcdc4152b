//! Session registry: lifecycle, turn persistence, and history windowing.

pub mod memory;
pub mod registry;
pub mod repository;

pub use registry::{SessionRegistry, HISTORY_WINDOW_PAIRS};
pub use repository::SessionRepository;
