//! revtrack server
//!
//! Records phonehome reports and answers each client with the revision its
//! hostname rules assign to it.

use std::sync::Arc;

use color_eyre::Result;
use revtrack_store::SqliteStore;
use tracing::info;
use tracing_subscriber::EnvFilter;

mod api;
mod config;
mod router;
mod state;

use config::Config;
use state::AppState;

#[tokio::main]
async fn main() -> Result<()> {
    color_eyre::install()?;

    let config = Config::load_default()?;

    let filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(&config.daemon.log_level))
        .unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt().with_env_filter(filter).init();

    let store = SqliteStore::open(&config.store.path, config.store.tables())?;
    let bind = config.daemon.bind.clone();
    let state = Arc::new(AppState::new(Arc::new(store), config));
    let app = router::create_router(state);

    let listener = tokio::net::TcpListener::bind(&bind).await?;
    info!(bind = %bind, "revtrack server listening");

    axum::serve(listener, app)
        .with_graceful_shutdown(async {
            if let Err(e) = tokio::signal::ctrl_c().await {
                tracing::error!(error = %e, "failed to listen for shutdown signal");
            }
        })
        .await?;

    info!("revtrack server stopped");
    Ok(())
}
