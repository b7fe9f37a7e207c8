//! # bisace-cli: Operator CLI for the BIS ACE Façade
//!
//! Checks a deployment's configuration without starting the API.
//!
//! ## Subcommands
//!
//! - `bisace validate`: load the service config and every tenant, report
//!   systems that were skipped or failed.
//! - `bisace tenants`: list loaded tenants with their server, catalog and
//!   card options.
//!
//! ```bash
//! bisace --config /etc/bisace/bisace.yaml validate --strict
//! bisace tenants --json
//! ```

pub mod tenants;
pub mod validate;

use std::path::Path;

use anyhow::{Context, Result};
use bisace_api::config::ServiceConfig;

/// Load the service configuration from `path`, or from `BISACE_CONFIG`
/// when no path is given.
pub fn load_config(path: Option<&Path>) -> Result<ServiceConfig> {
    let config = match path {
        Some(path) => ServiceConfig::from_file(path),
        None => ServiceConfig::from_env(),
    }
    .context("failed to load service configuration")?;
    tracing::debug!(?config, "service configuration loaded");
    Ok(config)
}
