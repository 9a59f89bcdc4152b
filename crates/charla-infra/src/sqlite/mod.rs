//! SQLite persistence: split read/write pool and repositories.

pub mod pool;
pub mod session;

pub use pool::DatabasePool;
pub use session::SqliteSessionRepository;
