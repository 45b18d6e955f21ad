mod config;
mod db;
mod routes;
mod services;
mod state;

use tracing_subscriber::EnvFilter;

#[derive(Debug, thiserror::Error)]
enum StartupError {
    #[error(transparent)]
    Config(#[from] config::ConfigError),
    #[error("database init failed: {0}")]
    Database(#[from] sqlx::Error),
    #[error("network error: {0}")]
    Io(#[from] std::io::Error),
}

#[tokio::main]
async fn main() -> Result<(), StartupError> {
    let dotenv = dotenvy::dotenv();
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();
    if let Err(e) = dotenv {
        if !e.not_found() {
            tracing::warn!(error = %e, "ignoring unreadable .env");
        }
    }

    let cfg = config::ServerConfig::from_env()?;
    let state = match &cfg.database_url {
        Some(url) => state::AppState::postgres(db::init_pool(url, cfg.db_max_connections).await?, cfg.http),
        None => {
            tracing::warn!("MEMORY_STORE enabled: maps and sessions are not persisted");
            state::AppState::memory(cfg.http)
        }
    };

    let app = routes::app(state);
    let listener = tokio::net::TcpListener::bind(("0.0.0.0", cfg.port)).await?;

    tracing::info!(port = cfg.port, "mapsketch server listening");
    axum::serve(listener, app).await?;
    Ok(())
}
