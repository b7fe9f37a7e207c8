//! # Service Configuration
//!
//! Loaded once at startup from a YAML file. The path comes from
//! `BISACE_CONFIG` (default `bisace.yaml`); `PORT` overrides the port.
//!
//! ```yaml
//! port: 8080
//! system_config_files_folder: /etc/bisace/systems
//! bis_connection_string: "Data Source=db;User ID=ace;Password=secret"
//! bis_server_name: BIS-SERVER
//! engine:
//!   base_url: http://127.0.0.1:9000
//!   timeout_secs: 30
//! systems:
//!   "1": tenant-a
//!   "2": tenant-b
//! ```

use std::collections::BTreeMap;
use std::fmt;
use std::path::{Path, PathBuf};

use bisace_core::ConnectionString;
use bisace_engine::EngineConfig;
use serde::Deserialize;

/// Environment variable naming the configuration file.
pub const CONFIG_PATH_VAR: &str = "BISACE_CONFIG";

/// Configuration file used when `BISACE_CONFIG` is unset.
pub const DEFAULT_CONFIG_PATH: &str = "bisace.yaml";

fn default_port() -> u16 {
    8080
}

/// Service-wide settings shared by every tenant.
#[derive(Clone, Deserialize)]
pub struct ServiceConfig {
    /// HTTP listen port.
    #[serde(default = "default_port")]
    pub port: u16,
    /// Folder holding the per-tenant `.settings` files.
    pub system_config_files_folder: PathBuf,
    /// Base connection string. Each tenant replaces its catalog.
    pub bis_connection_string: String,
    /// Engine server name used at login unless a tenant overrides it.
    pub bis_server_name: String,
    /// Engine gateway settings. When absent, `BISACE_ENGINE_URL` is used.
    #[serde(default)]
    pub engine: Option<EngineConfig>,
    /// Tenant id to settings file stem.
    #[serde(default)]
    pub systems: BTreeMap<String, String>,
}

impl fmt::Debug for ServiceConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let connection = ConnectionString::parse(&self.bis_connection_string)
            .map(|c| c.redacted())
            .unwrap_or_else(|_| "[unparseable]".to_string());
        f.debug_struct("ServiceConfig")
            .field("port", &self.port)
            .field("system_config_files_folder", &self.system_config_files_folder)
            .field("bis_connection_string", &connection)
            .field("bis_server_name", &self.bis_server_name)
            .field("engine", &self.engine)
            .field("systems", &self.systems)
            .finish()
    }
}

/// Errors loading the service configuration.
#[derive(Debug, thiserror::Error)]
pub enum ServiceConfigError {
    /// The file could not be read.
    #[error("failed to read configuration file {path}: {source}")]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },
    /// The file is not valid YAML for [`ServiceConfig`].
    #[error("invalid configuration file {path}: {source}")]
    Parse {
        path: PathBuf,
        source: serde_yaml::Error,
    },
}

impl ServiceConfig {
    /// Parse a configuration document.
    pub fn from_yaml(text: &str, path: &Path) -> Result<Self, ServiceConfigError> {
        serde_yaml::from_str(text).map_err(|source| ServiceConfigError::Parse {
            path: path.to_path_buf(),
            source,
        })
    }

    /// Read and parse a configuration file.
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self, ServiceConfigError> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path).map_err(|source| ServiceConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_yaml(&text, path)
    }

    /// Load from `BISACE_CONFIG`, then apply the `PORT` override.
    pub fn from_env() -> Result<Self, ServiceConfigError> {
        let path = std::env::var(CONFIG_PATH_VAR).unwrap_or_else(|_| DEFAULT_CONFIG_PATH.into());
        let mut config = Self::from_file(&path)?;
        if let Some(port) = std::env::var("PORT").ok().and_then(|p| p.parse().ok()) {
            config.port = port;
        }
        Ok(config)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const SAMPLE: &str = r#"
system_config_files_folder: /etc/bisace/systems
bis_connection_string: "Data Source=db;User ID=ace;Password=hunter2"
bis_server_name: BIS-SERVER
engine:
  base_url: http://127.0.0.1:9000
systems:
  "1": tenant-a
  "2": tenant-b
"#;

    #[test]
    fn parses_sample() {
        let config = ServiceConfig::from_yaml(SAMPLE, Path::new("bisace.yaml")).unwrap();
        assert_eq!(config.port, 8080);
        assert_eq!(config.bis_server_name, "BIS-SERVER");
        assert_eq!(config.systems.len(), 2);
        assert_eq!(config.systems["1"], "tenant-a");
        let engine = config.engine.unwrap();
        assert_eq!(engine.base_url.as_str(), "http://127.0.0.1:9000/");
        assert_eq!(engine.timeout_secs, 30);
    }

    #[test]
    fn debug_redacts_password() {
        let config = ServiceConfig::from_yaml(SAMPLE, Path::new("bisace.yaml")).unwrap();
        let shown = format!("{config:?}");
        assert!(!shown.contains("hunter2"));
        assert!(shown.contains("BIS-SERVER"));
    }

    #[test]
    fn missing_required_field_is_a_parse_error() {
        let err = ServiceConfig::from_yaml("port: 1", Path::new("x.yaml")).unwrap_err();
        assert!(matches!(err, ServiceConfigError::Parse { .. }));
        assert!(err.to_string().contains("x.yaml"));
    }

    #[test]
    fn from_file_reports_missing_file() {
        let dir = tempfile::tempdir().unwrap();
        let err = ServiceConfig::from_file(dir.path().join("absent.yaml")).unwrap_err();
        assert!(matches!(err, ServiceConfigError::Io { .. }));
    }
}
