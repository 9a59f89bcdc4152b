//! Charla server entry point.
//!
//! Binary name: `charla`
//!
//! Parses CLI arguments, initializes database and services, then
//! either starts the WebSocket server or runs a management command.

mod http;
mod state;

use clap::{Parser, Subcommand};

use state::AppState;

#[derive(Parser)]
#[command(name = "charla", about = "Live persona-driven conversation server")]
struct Cli {
    /// Bridge tracing spans to OpenTelemetry (stdout exporter).
    #[arg(long)]
    otel: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Start the WebSocket server.
    Serve {
        /// Bind address; overrides config.toml's `server.bind_addr`.
        #[arg(long, env = "CHARLA_BIND_ADDR")]
        bind: Option<String>,
    },
    /// Create an API key bound to a new user identity.
    ApiKey {
        /// Label stored alongside the key.
        #[arg(long, default_value = "default")]
        name: String,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    charla_observe::tracing_setup::init_tracing(cli.otel)
        .map_err(|e| anyhow::anyhow!("tracing setup failed: {e}"))?;

    let state = AppState::init().await?;

    match cli.command {
        Commands::Serve { bind } => {
            let addr = bind.unwrap_or_else(|| state.config.server.bind_addr.clone());
            let listener = tokio::net::TcpListener::bind(&addr).await?;

            println!("Charla listening on ws://{addr}/api/v1/ws/conversation");
            println!("Press Ctrl+C to stop");

            let router = http::router::build_router(state);
            axum::serve(listener, router)
                .with_graceful_shutdown(shutdown_signal())
                .await?;

            println!("Server stopped.");
        }

        Commands::ApiKey { name } => {
            let (key, user_id) = http::extractors::auth::create_api_key(&state, &name).await?;
            println!("API key created (save this -- it won't be shown again):");
            println!();
            println!("  {key}");
            println!();
            println!("Identity: {user_id}");
        }
    }

    charla_observe::tracing_setup::shutdown_tracing();
    Ok(())
}

/// Wait for Ctrl+C or SIGTERM for graceful shutdown.
async fn shutdown_signal() {
    let ctrl_c = async {
        tokio::signal::ctrl_c()
            .await
            .expect("failed to install Ctrl+C handler");
    };

    #[cfg(unix)]
    let terminate = async {
        tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate())
            .expect("failed to install SIGTERM handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }
}
