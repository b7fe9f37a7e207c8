//! # Tenants Subcommand
//!
//! Lists the loaded tenants. Connection string passwords are redacted.

use anyhow::{Context, Result};
use bisace_api::config::ServiceConfig;
use bisace_api::tenants::{TenantConfig, Tenants};
use clap::Args;
use serde::Serialize;

/// Arguments for the `bisace tenants` subcommand.
#[derive(Args, Debug)]
pub struct TenantsArgs {
    /// Print JSON instead of a table.
    #[arg(long)]
    pub json: bool,
}

/// What an operator needs to know about one tenant.
#[derive(Debug, Serialize)]
pub struct TenantSummary {
    pub system_id: u32,
    pub server_name: String,
    pub catalog: Option<String>,
    pub connection_string: String,
    pub option_files: Vec<String>,
    pub card_number_length: usize,
    pub card_name_field: String,
}

impl From<&TenantConfig> for TenantSummary {
    fn from(tenant: &TenantConfig) -> Self {
        Self {
            system_id: tenant.system_id,
            server_name: tenant.server_name.clone(),
            catalog: tenant
                .connection_string
                .initial_catalog()
                .map(str::to_string),
            connection_string: tenant.connection_string.redacted(),
            option_files: tenant
                .options
                .sources()
                .iter()
                .map(|p| p.display().to_string())
                .collect(),
            card_number_length: tenant.card_options.card_number_length,
            card_name_field: tenant.card_options.card_name_field.clone(),
        }
    }
}

/// Execute the tenants subcommand.
pub fn run_tenants(args: &TenantsArgs, config: &ServiceConfig) -> Result<u8> {
    let tenants = Tenants::load(config).context("failed to load tenants")?;
    let summaries: Vec<TenantSummary> = tenants.iter().map(|t| t.as_ref().into()).collect();

    if args.json {
        println!("{}", serde_json::to_string_pretty(&summaries)?);
        return Ok(0);
    }

    if summaries.is_empty() {
        println!("No tenants configured.");
        return Ok(0);
    }

    println!(
        "{:>6}  {:<20}  {:<20}  {:>6}  {:<12}  OPTION FILES",
        "ID", "SERVER", "CATALOG", "WIDTH", "NAME FIELD"
    );
    for s in &summaries {
        println!(
            "{:>6}  {:<20}  {:<20}  {:>6}  {:<12}  {}",
            s.system_id,
            s.server_name,
            s.catalog.as_deref().unwrap_or("-"),
            s.card_number_length,
            s.card_name_field,
            if s.option_files.is_empty() {
                "-".to_string()
            } else {
                s.option_files.join(";")
            }
        );
    }
    Ok(0)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::BTreeMap;

    #[test]
    fn summary_redacts_password_and_reads_card_options() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(
            dir.path().join("cards.xml"),
            "<CardOptions><CardNumberLength>10</CardNumberLength></CardOptions>",
        )
        .unwrap();
        std::fs::write(
            dir.path().join("a.settings"),
            "BisAceDatabaseName=AceA\nOptionFiles=cards.xml\nBisServerName=ACE-A\n",
        )
        .unwrap();

        let config = ServiceConfig {
            port: 8080,
            system_config_files_folder: dir.path().to_path_buf(),
            bis_connection_string: "Data Source=db;User ID=ace;Password=hunter2".into(),
            bis_server_name: "BIS-SERVER".into(),
            engine: None,
            systems: BTreeMap::from([("3".to_string(), "a".to_string())]),
        };

        let tenants = Tenants::load(&config).unwrap();
        let tenant = tenants.get(3).unwrap();
        let summary = TenantSummary::from(tenant.as_ref());

        assert_eq!(summary.server_name, "ACE-A");
        assert_eq!(summary.catalog.as_deref(), Some("AceA"));
        assert!(!summary.connection_string.contains("hunter2"));
        assert_eq!(summary.option_files.len(), 1);
        assert_eq!(summary.card_number_length, 10);
        assert_eq!(summary.card_name_field, "CardName");
    }
}
