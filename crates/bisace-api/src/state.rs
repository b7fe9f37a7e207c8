//! # Application State
//!
//! Shared by all handlers through the `State` extractor. Cheap to clone:
//! the engine and tenant table sit behind `Arc`s.

use std::sync::Arc;

use bisace_engine::AccessEngine;

use crate::tenants::Tenants;

/// Name reported in API log entries.
pub const APPLICATION_NAME: &str = "bisace-api";

/// Runtime settings that are not per tenant.
#[derive(Debug, Clone)]
pub struct AppConfig {
    pub port: u16,
    /// Application name written to API log entries.
    pub application: String,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            port: 8080,
            application: APPLICATION_NAME.to_string(),
        }
    }
}

#[derive(Clone)]
pub struct AppState {
    pub engine: Arc<dyn AccessEngine>,
    pub tenants: Arc<Tenants>,
    pub config: AppConfig,
}

impl AppState {
    pub fn new(engine: Arc<dyn AccessEngine>, tenants: Tenants) -> Self {
        Self::with_config(engine, tenants, AppConfig::default())
    }

    pub fn with_config(engine: Arc<dyn AccessEngine>, tenants: Tenants, config: AppConfig) -> Self {
        Self {
            engine,
            tenants: Arc::new(tenants),
            config,
        }
    }
}

impl std::fmt::Debug for AppState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AppState")
            .field("engine", &self.engine.engine_name())
            .field("tenants", &self.tenants.ids().collect::<Vec<_>>())
            .field("config", &self.config)
            .finish()
    }
}
