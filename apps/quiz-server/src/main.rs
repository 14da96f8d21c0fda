//! Quiz Server - HTTP endpoints for vocabulary quizzes.
//!
//! Routes:
//! - `GET  /quiz/{term_id}[/{question_type}]` shows the quiz, generating it on first access
//! - `POST /quiz/{term_id}[/{question_type}]` records an answer and redirects back
//!
//! The acting user comes from a header set by the fronting auth layer.

mod error;
mod routes;
mod state;
mod user;

use std::env;

use anyhow::Context;
use tokio::{net::TcpListener, signal};
use tracing::info;
use tracing_subscriber::{fmt, EnvFilter};
use vocab_quiz::{Config, Database};

use state::AppState;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let config = Config::try_load()
        .context("refusing to start with a broken config")?
        .unwrap_or_default();

    let db_path = config.db_path();
    if let Some(parent) = db_path.parent() {
        std::fs::create_dir_all(parent)?;
    }
    info!("Opening database at {}", db_path.display());
    let db = Database::open(&db_path)
        .with_context(|| format!("failed to open {}", db_path.display()))?;

    let state = AppState::new(db, &config)?;
    let app = routes::router(state);

    let address = env::var("VOCAB_QUIZ_BIND").unwrap_or_else(|_| config.server.bind.clone());
    let listener = TcpListener::bind(&address)
        .await
        .with_context(|| format!("failed to bind {address}"))?;
    info!("Server running on {address}");

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    info!("Server shut down");
    Ok(())
}

async fn shutdown_signal() {
    let ctrl_c = async {
        match signal::ctrl_c().await {
            Ok(()) => info!("Received Ctrl+C, shutting down"),
            Err(_) => std::future::pending::<()>().await,
        }
    };

    #[cfg(unix)]
    let terminate = async {
        use tokio::signal::unix::{signal, SignalKind};

        match signal(SignalKind::terminate()) {
            Ok(mut stream) => {
                stream.recv().await;
                info!("Received terminate signal, shutting down");
            }
            Err(_) => std::future::pending::<()>().await,
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }
}
