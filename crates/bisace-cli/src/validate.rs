//! # Validate Subcommand
//!
//! Loads the tenant table exactly as the API does at startup. A tenant
//! whose settings are invalid fails the run; systems the loader skips
//! (non-integer id, missing or empty settings file) fail it only with
//! `--strict`.

use std::collections::BTreeSet;

use anyhow::Result;
use bisace_api::config::ServiceConfig;
use bisace_api::tenants::Tenants;
use clap::Args;

/// Arguments for the `bisace validate` subcommand.
#[derive(Args, Debug)]
pub struct ValidateArgs {
    /// Treat skipped systems as failures.
    #[arg(long)]
    pub strict: bool,
}

/// Configured systems that did not produce a tenant.
pub fn skipped_systems(config: &ServiceConfig, tenants: &Tenants) -> Vec<String> {
    let loaded: BTreeSet<u32> = tenants.ids().collect();
    config
        .systems
        .iter()
        .filter(|(key, _)| {
            key.trim()
                .parse::<u32>()
                .map_or(true, |id| !loaded.contains(&id))
        })
        .map(|(key, stem)| format!("{key} ({stem})"))
        .collect()
}

/// Execute the validate subcommand.
///
/// Returns exit code: 0 on success, 1 on validation failure.
pub fn run_validate(args: &ValidateArgs, config: &ServiceConfig) -> Result<u8> {
    let tenants = match Tenants::load(config) {
        Ok(tenants) => tenants,
        Err(e) => {
            println!("FAIL: {e}");
            return Ok(1);
        }
    };

    println!(
        "Tenants: {}/{} loaded from {}",
        tenants.len(),
        config.systems.len(),
        config.system_config_files_folder.display()
    );

    let skipped = skipped_systems(config, &tenants);
    for system in &skipped {
        println!("  SKIPPED: {system}");
    }

    if tenants.is_empty() {
        println!("FAIL: no tenants loaded");
        return Ok(1);
    }
    if args.strict && !skipped.is_empty() {
        println!("FAIL: {} system(s) skipped", skipped.len());
        return Ok(1);
    }

    println!("OK");
    Ok(0)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::BTreeMap;
    use std::path::Path;

    fn config(folder: &Path, systems: &[(&str, &str)]) -> ServiceConfig {
        ServiceConfig {
            port: 8080,
            system_config_files_folder: folder.to_path_buf(),
            bis_connection_string: "Data Source=db;Initial Catalog=master".into(),
            bis_server_name: "BIS-SERVER".into(),
            engine: None,
            systems: systems
                .iter()
                .map(|(k, v)| (k.to_string(), v.to_string()))
                .collect::<BTreeMap<_, _>>(),
        }
    }

    #[test]
    fn valid_configuration_passes() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("a.settings"), "BisAceDatabaseName=AceA\n").unwrap();
        let config = config(dir.path(), &[("1", "a")]);

        assert_eq!(run_validate(&ValidateArgs { strict: true }, &config).unwrap(), 0);
    }

    #[test]
    fn skipped_systems_fail_only_when_strict() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("a.settings"), "BisAceDatabaseName=AceA\n").unwrap();
        let config = config(dir.path(), &[("1", "a"), ("2", "missing"), ("x", "a")]);

        let tenants = Tenants::load(&config).unwrap();
        assert_eq!(skipped_systems(&config, &tenants), vec!["2 (missing)", "x (a)"]);

        assert_eq!(run_validate(&ValidateArgs { strict: false }, &config).unwrap(), 0);
        assert_eq!(run_validate(&ValidateArgs { strict: true }, &config).unwrap(), 1);
    }

    #[test]
    fn invalid_tenant_fails() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("a.settings"), "OptionFiles=cards.xml\n").unwrap();
        let config = config(dir.path(), &[("1", "a")]);

        assert_eq!(run_validate(&ValidateArgs { strict: false }, &config).unwrap(), 1);
    }

    #[test]
    fn no_tenants_fails() {
        let dir = tempfile::tempdir().unwrap();
        let config = config(dir.path(), &[]);
        assert_eq!(run_validate(&ValidateArgs { strict: false }, &config).unwrap(), 1);
    }
}
