//! ChemDeck Web Server
//!
//! Run with: cargo run -p chemdeck-web

use chemdeck_config::Config;
use chemdeck_molecules::build_default_registry;
use std::sync::Arc;
use tracing::info;
use tracing_subscriber::EnvFilter;

use chemdeck_web::{router::build_router, session::spawn_sweeper, state::AppState};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new("chemdeck=debug,info")),
        )
        .init();

    info!("Starting ChemDeck Web Server...");

    let config = Config::load()?;
    config.validate()?;
    info!(backend = ?config.jobs.backend, delay_scale = config.jobs.delay_scale, "Job backend configured");

    let state = Arc::new(AppState::new(config, build_default_registry()));
    let sweeper = spawn_sweeper(Arc::clone(&state));
    let addr = state.config.server.bind_addr();
    let app = build_router(state);

    let listener = tokio::net::TcpListener::bind(&addr).await?;
    info!("Server listening on http://{}", addr);

    axum::serve(listener, app).await?;
    sweeper.abort();
    Ok(())
}
