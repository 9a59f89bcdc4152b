//! Application state wiring all services together.
//!
//! The orchestrator is generic over repository and generator traits;
//! AppState pins it to the concrete infra implementations and holds
//! the cross-connection animation channel registry.

use std::path::PathBuf;
use std::sync::Arc;

use charla_core::conversation::ChatOrchestrator;
use charla_core::session::SessionRegistry;
use charla_infra::config::{data_dir, load_config};
use charla_infra::generation::HttpResponseGenerator;
use charla_infra::sqlite::{DatabasePool, SqliteSessionRepository};
use charla_types::config::CharlaConfig;
use charla_types::event::AnimationEvent;
use charla_types::identity::UserId;
use dashmap::DashMap;
use tokio::sync::mpsc;

/// The orchestrator pinned to SQLite persistence and the HTTP backend.
pub type ConcreteOrchestrator = ChatOrchestrator<SqliteSessionRepository, HttpResponseGenerator>;

/// Shared application state behind every WebSocket route.
#[derive(Clone)]
pub struct AppState {
    pub orchestrator: Arc<ConcreteOrchestrator>,
    pub config: CharlaConfig,
    pub data_dir: PathBuf,
    pub db_pool: DatabasePool,
    /// Outbound senders for connected animation channels, keyed by
    /// identity. The emotion handler relays renderer commands through
    /// these; a missing entry means the user has no animation channel
    /// open and the relay is silently skipped.
    pub animation_channels: Arc<DashMap<UserId, mpsc::Sender<AnimationEvent>>>,
}

impl AppState {
    /// Initialize the application state: config, DB, orchestrator.
    pub async fn init() -> anyhow::Result<Self> {
        let data_dir = data_dir();
        tokio::fs::create_dir_all(&data_dir).await?;

        let config = load_config(&data_dir).await;

        let db_url = format!("sqlite://{}?mode=rwc", data_dir.join("charla.db").display());
        let db_pool = DatabasePool::new(&db_url).await?;

        let registry = SessionRegistry::new(SqliteSessionRepository::new(db_pool.clone()));
        let generator = HttpResponseGenerator::new(&config.generation)
            .map_err(|e| anyhow::anyhow!("generation backend setup failed: {e}"))?;
        let orchestrator =
            ChatOrchestrator::new(registry, generator, config.generation.stream_mode);

        Ok(Self {
            orchestrator: Arc::new(orchestrator),
            config,
            data_dir,
            db_pool,
            animation_channels: Arc::new(DashMap::new()),
        })
    }
}
