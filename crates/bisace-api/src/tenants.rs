//! # Multi-tenant Configuration
//!
//! Every tenant (system id) owns a `.settings` file in the service's
//! `system_config_files_folder`. The `systems` map of the service config
//! names the file for each id:
//!
//! ```text
//! systems: { "1": tenant-a }   ->   {folder}/tenant-a.settings
//! ```
//!
//! ## Settings Files
//!
//! `key = value` lines. Blank lines and lines starting with `#` are ignored.
//!
//! | Key                  | Required | Meaning |
//! |----------------------|----------|---------|
//! | `BisAceDatabaseName` | yes      | Catalog substituted into the base connection string |
//! | `OptionFiles`        | no       | `;`-separated XML option files, relative to the settings folder |
//! | `BisServerName`      | no       | Engine server used at login instead of the global one |
//!
//! A missing or empty settings file skips the tenant with a warning. A file
//! that is present but invalid fails the whole load.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use bisace_core::{
    CardOptions, ConnectionString, ConnectionStringError, OptionsBuilder, OptionsDocument,
    OptionsError,
};

use crate::config::ServiceConfig;

/// Extension of tenant settings files.
pub const SETTINGS_EXTENSION: &str = "settings";

/// Settings key naming the tenant's catalog.
pub const DATABASE_NAME_KEY: &str = "BisAceDatabaseName";

/// Settings key listing the tenant's option files.
pub const OPTION_FILES_KEY: &str = "OptionFiles";

/// Settings key overriding the engine server name.
pub const SERVER_NAME_KEY: &str = "BisServerName";

/// Errors building a tenant's configuration.
#[derive(Debug, thiserror::Error)]
pub enum TenantConfigError {
    #[error("BisAceDatabaseName Not Specified In The Settings File!")]
    MissingDatabaseName,

    #[error("Invalid base connection string in configuration!")]
    InvalidConnectionString(#[source] ConnectionStringError),

    #[error(transparent)]
    Options(#[from] OptionsError),

    #[error("failed to read settings file {path}: {source}")]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },

    /// Wraps an error with the tenant it belongs to.
    #[error("system {system_id}: {source}")]
    Tenant {
        system_id: u32,
        #[source]
        source: Box<TenantConfigError>,
    },
}

/// Parsed contents of a `.settings` file.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Settings {
    entries: BTreeMap<String, String>,
}

impl Settings {
    /// Parse `key = value` lines. Later duplicates win.
    pub fn parse(text: &str) -> Self {
        let entries = text
            .lines()
            .map(str::trim)
            .filter(|line| !line.is_empty() && !line.starts_with('#'))
            .filter_map(|line| line.split_once('='))
            .map(|(key, value)| (key.trim().to_string(), value.trim().to_string()))
            .filter(|(key, _)| !key.is_empty())
            .collect();
        Self { entries }
    }

    pub fn get(&self, key: &str) -> Option<&str> {
        self.entries.get(key).map(String::as_str)
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }
}

/// Everything a request needs to know about its tenant.
#[derive(Debug, Clone)]
pub struct TenantConfig {
    pub system_id: u32,
    /// Base connection string with the tenant's catalog.
    pub connection_string: ConnectionString,
    /// Engine server name used at login.
    pub server_name: String,
    /// Merged option files. Empty `<OptionsRoot/>` when none are configured.
    pub options: OptionsDocument,
    pub card_options: CardOptions,
}

impl TenantConfig {
    /// Build a tenant from its settings.
    ///
    /// `settings_dir` anchors relative option file paths.
    pub fn from_settings(
        system_id: u32,
        settings: &Settings,
        settings_dir: &Path,
        service: &ServiceConfig,
    ) -> Result<Self, TenantConfigError> {
        let database = settings
            .get(DATABASE_NAME_KEY)
            .filter(|name| !name.is_empty())
            .ok_or(TenantConfigError::MissingDatabaseName)?;

        let mut connection_string = ConnectionString::parse(&service.bis_connection_string)
            .map_err(TenantConfigError::InvalidConnectionString)?;
        connection_string.set_initial_catalog(database);

        let options = load_options(settings, settings_dir)?;
        let card_options = options.options::<CardOptions>()?;

        let server_name = settings
            .get(SERVER_NAME_KEY)
            .filter(|name| !name.is_empty())
            .unwrap_or(&service.bis_server_name)
            .to_string();

        Ok(Self {
            system_id,
            connection_string,
            server_name,
            options,
            card_options,
        })
    }
}

/// Register the listed option files that exist and merge them.
fn load_options(settings: &Settings, settings_dir: &Path) -> Result<OptionsDocument, OptionsError> {
    let Some(list) = settings.get(OPTION_FILES_KEY) else {
        return Ok(OptionsDocument::default());
    };

    let mut builder = OptionsBuilder::new();
    for entry in list.split(';').map(str::trim).filter(|e| !e.is_empty()) {
        let path = Path::new(entry);
        let path = if path.is_absolute() {
            path.to_path_buf()
        } else {
            settings_dir.join(path)
        };
        if !builder.add_file(&path, true)? {
            tracing::debug!(path = %path.display(), "option file not registered");
        }
    }

    if builder.is_empty() {
        return Ok(OptionsDocument::default());
    }
    builder.build()
}

/// Tenants keyed by system id.
#[derive(Debug, Clone, Default)]
pub struct Tenants {
    by_id: BTreeMap<u32, Arc<TenantConfig>>,
}

impl Tenants {
    pub fn new(tenants: impl IntoIterator<Item = TenantConfig>) -> Self {
        Self {
            by_id: tenants
                .into_iter()
                .map(|t| (t.system_id, Arc::new(t)))
                .collect(),
        }
    }

    /// Load every tenant named in the service config.
    ///
    /// Non-integer ids and missing or empty settings files are skipped with
    /// a warning. Any other failure aborts the load.
    pub fn load(service: &ServiceConfig) -> Result<Self, TenantConfigError> {
        let folder = &service.system_config_files_folder;
        let mut tenants = Vec::new();

        for (key, stem) in &service.systems {
            let Ok(system_id) = key.trim().parse::<u32>() else {
                tracing::warn!(key = %key, "skipping system with non-integer id");
                continue;
            };

            let path = folder.join(format!("{stem}.{SETTINGS_EXTENSION}"));
            let text = match std::fs::read_to_string(&path) {
                Ok(text) => text,
                Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                    tracing::warn!(system_id, path = %path.display(), "settings file not found, skipping system");
                    continue;
                }
                Err(source) => return Err(TenantConfigError::Io { path, source }),
            };

            let settings = Settings::parse(&text);
            if settings.is_empty() {
                tracing::warn!(system_id, path = %path.display(), "settings file has no entries, skipping system");
                continue;
            }

            let tenant = TenantConfig::from_settings(system_id, &settings, folder, service)
                .map_err(|e| TenantConfigError::Tenant {
                    system_id,
                    source: Box::new(e),
                })?;

            tracing::info!(
                system_id,
                server = %tenant.server_name,
                catalog = tenant.connection_string.initial_catalog().unwrap_or_default(),
                option_files = tenant.options.sources().len(),
                "tenant loaded"
            );
            tenants.push(tenant);
        }

        Ok(Self::new(tenants))
    }

    pub fn get(&self, system_id: u32) -> Option<Arc<TenantConfig>> {
        self.by_id.get(&system_id).cloned()
    }

    /// The tenant with the lowest id.
    pub fn default_tenant(&self) -> Option<Arc<TenantConfig>> {
        self.by_id.values().next().cloned()
    }

    pub fn ids(&self) -> impl Iterator<Item = u32> + '_ {
        self.by_id.keys().copied()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Arc<TenantConfig>> {
        self.by_id.values()
    }

    pub fn len(&self) -> usize {
        self.by_id.len()
    }

    pub fn is_empty(&self) -> bool {
        self.by_id.is_empty()
    }
}
