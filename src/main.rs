pub mod backend;
pub mod config;
pub mod db;
pub mod error;
pub mod gate;
pub mod models;
pub mod routes;
pub mod views;

use std::sync::Arc;

use anyhow::{Context, Result};
use backend::SupabaseClient;
use chrono::{Duration, Utc};
use config::Config;
use db::SessionStore;
use routes::AppState;
use tokio::net::TcpListener;
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> Result<()> {
    // initialize tracing, `RUST_LOG` overrides the default level
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    let config = Config::load()?;

    let sessions = SessionStore::open(&config.session.db_path).with_context(|| {
        format!(
            "opening session store at {}",
            config.session.db_path.display()
        )
    })?;
    let purged = sessions.purge_expired(Utc::now(), Duration::days(config.session.max_age_days))?;
    if purged > 0 {
        tracing::info!("purged {} expired sessions", purged);
    }

    let backend = Arc::new(SupabaseClient::new(&config.supabase));
    let state = AppState::new(backend, sessions, config.session.cookie_secure);
    let app = routes::router(state);

    let listener = TcpListener::bind(&config.bind)
        .await
        .with_context(|| format!("binding {}", config.bind))?;
    tracing::info!("listening on http://{}", listener.local_addr()?);
    axum::serve(listener, app).await?;
    Ok(())
}
