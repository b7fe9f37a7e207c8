//! # bisace-api: Binary Entry Point
//!
//! Loads the service configuration and tenant table, picks the access
//! engine, and serves the API.
//!
//! Environment:
//! - `BISACE_CONFIG`: service configuration file (default `bisace.yaml`)
//! - `PORT`: listen port override
//! - `BISACE_ENGINE=memory`: use the in-memory engine instead of the gateway,
//!   with the account from `BISACE_MEMORY_USER` / `BISACE_MEMORY_PASSWORD`
//! - `LOG_FORMAT=json`: JSON log lines
//! - `RUST_LOG`: log filter (default `info`)

use std::net::SocketAddr;
use std::sync::Arc;

use bisace_api::config::ServiceConfig;
use bisace_api::state::{AppConfig, AppState, APPLICATION_NAME};
use bisace_api::tenants::Tenants;
use bisace_engine::{AccessEngine, EngineConfig, HttpAccessEngine, InMemoryAccessEngine};
use tracing_subscriber::EnvFilter;

fn init_tracing() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    let json = std::env::var("LOG_FORMAT").is_ok_and(|f| f.eq_ignore_ascii_case("json"));

    if json {
        tracing_subscriber::fmt()
            .json()
            .with_env_filter(filter)
            .init();
    } else {
        tracing_subscriber::fmt().with_env_filter(filter).init();
    }
}

fn select_engine(config: &ServiceConfig) -> Result<Arc<dyn AccessEngine>, Box<dyn std::error::Error>> {
    if std::env::var("BISACE_ENGINE").is_ok_and(|e| e.eq_ignore_ascii_case("memory")) {
        let mut engine = InMemoryAccessEngine::new();
        if let (Ok(user), Ok(password)) = (
            std::env::var("BISACE_MEMORY_USER"),
            std::env::var("BISACE_MEMORY_PASSWORD"),
        ) {
            engine = engine.with_account(&user, &password);
        }
        tracing::warn!("using the in-memory access engine; data is not persisted");
        return Ok(Arc::new(engine));
    }

    let engine_config = match &config.engine {
        Some(engine) => engine.clone(),
        None => EngineConfig::from_env()?,
    };
    tracing::info!(base_url = %engine_config.base_url, "access engine gateway configured");
    Ok(Arc::new(HttpAccessEngine::new(engine_config)?))
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    init_tracing();

    let config = ServiceConfig::from_env().map_err(|e| {
        tracing::error!("Service configuration failed: {e}");
        e
    })?;
    tracing::debug!(?config, "service configuration loaded");

    let tenants = Tenants::load(&config).map_err(|e| {
        tracing::error!("Tenant configuration failed: {e}");
        e
    })?;
    if tenants.is_empty() {
        tracing::warn!("no tenants configured; every /api call will fail");
    } else {
        tracing::info!(tenants = ?tenants.ids().collect::<Vec<_>>(), "tenants loaded");
    }

    let engine = select_engine(&config).map_err(|e| {
        tracing::error!("Access engine setup failed: {e}");
        e
    })?;

    let port = config.port;
    let state = AppState::with_config(
        engine,
        tenants,
        AppConfig {
            port,
            application: APPLICATION_NAME.to_string(),
        },
    );
    let app = bisace_api::app(state);

    let addr = SocketAddr::from(([0, 0, 0, 0], port));
    tracing::info!("BIS ACE API listening on {}", addr);

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(
        listener,
        app.into_make_service_with_connect_info::<SocketAddr>(),
    )
    .await?;

    Ok(())
}
