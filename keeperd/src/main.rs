//! Keeper server daemon.
//!
//! # Usage
//!
//! ```bash
//! keeperd
//! KEEPER_HOST=0.0.0.0 KEEPER_PORT=9000 DATABASE_URL=postgres://... keeperd
//! ```
//!
//! # Environment variables
//!
//! - `DATABASE_URL`: PostgreSQL connection string. With the `postgres`
//!   feature compiled in and this unset, the daemon refuses to start;
//!   without the feature, an in-memory store is used instead (development
//!   only -- state does not survive a restart).
//! - `KEEPER_HOST` / `KEEPER_PORT`: bind address, default `0.0.0.0:8888`.
//! - `KEEPER_SERVER_KEY`: base64 (raw, unpadded) 16-byte AES-128 key used
//!   to mint tokens. Defaults to a fixed development key if unset.

mod config;
mod error;

use std::sync::Arc;

use config::Config;
use keeper_server::{AppState, TokenMinter};
use tracing::info;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::registry()
        .with(fmt::layer())
        .with(EnvFilter::from_default_env().add_directive("keeperd=info".parse()?))
        .init();

    let config = Config::from_env()?;

    info!(
        version = env!("CARGO_PKG_VERSION"),
        host = %config.host,
        port = config.port,
        "starting keeperd"
    );

    let token_minter = TokenMinter::new(&config.server_key)?;

    let app = build_router(&config, token_minter).await?;

    let listener = tokio::net::TcpListener::bind((config.host.as_str(), config.port)).await?;
    info!(addr = %listener.local_addr()?, "listening");
    axum::serve(listener, app).await?;

    Ok(())
}

#[cfg(feature = "postgres")]
async fn build_router(config: &Config, token_minter: TokenMinter) -> anyhow::Result<axum::Router> {
    let database_url = config
        .database_url
        .clone()
        .ok_or_else(|| anyhow::anyhow!("DATABASE_URL is required"))?;

    let pool = sqlx::PgPool::connect(&database_url).await?;
    info!("running migrations");
    sqlx::migrate!("../migrations").run(&pool).await?;

    let store = Arc::new(keeper_store::PgRemoteStore::new(pool));
    let state = Arc::new(AppState::new(store, token_minter));
    Ok(keeper_server::router(state))
}

#[cfg(not(feature = "postgres"))]
async fn build_router(_config: &Config, token_minter: TokenMinter) -> anyhow::Result<axum::Router> {
    info!("postgres feature disabled, running against an in-memory store");
    let store = Arc::new(keeper_store::MemoryRemoteStore::new());
    let state = Arc::new(AppState::new(store, token_minter));
    Ok(keeper_server::router(state))
}
