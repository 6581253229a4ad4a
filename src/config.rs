use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::error::{IncidentError, Result};

pub const DEFAULT_DATA_PATH: &str = "data/incidents.json";
pub const DEFAULT_PORT: u16 = 3001;

/// Runtime configuration.
///
/// Layered as defaults, then an optional YAML file, then environment
/// variables. CLI flags are applied last by the binary.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// JSON snapshot holding every incident.
    pub data_path: PathBuf,
    /// Where uploaded CSV bodies are parked while they are ingested.
    pub upload_dir: PathBuf,
    pub port: u16,
    /// Whether listings leave out ARCHIVED incidents when the caller does not say.
    pub hide_archived_by_default: bool,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            data_path: PathBuf::from(DEFAULT_DATA_PATH),
            upload_dir: std::env::temp_dir().join("incident-tracker-uploads"),
            port: DEFAULT_PORT,
            hide_archived_by_default: true,
        }
    }
}

impl Config {
    pub fn from_yaml(source: &str) -> Result<Self> {
        serde_yaml::from_str(source).map_err(|e| IncidentError::Config(e.to_string()))
    }

    /// Read a YAML config file. A missing file is an error here, since the
    /// caller asked for it explicitly.
    pub fn from_file(path: &Path) -> Result<Self> {
        let source = std::fs::read_to_string(path)
            .map_err(|e| IncidentError::Config(format!("{}: {}", path.display(), e)))?;
        Self::from_yaml(&source)
    }

    /// Defaults, or the given file, with environment overrides applied.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let config = match path {
            Some(path) => Self::from_file(path)?,
            None => Self::default(),
        };
        config.with_env(|key| std::env::var(key).ok())
    }

    /// Apply `INCIDENTS_DATA_PATH`, `INCIDENTS_UPLOAD_DIR` and `PORT`.
    pub fn with_env(mut self, lookup: impl Fn(&str) -> Option<String>) -> Result<Self> {
        if let Some(path) = lookup("INCIDENTS_DATA_PATH").filter(|v| !v.is_empty()) {
            self.data_path = PathBuf::from(path);
        }
        if let Some(dir) = lookup("INCIDENTS_UPLOAD_DIR").filter(|v| !v.is_empty()) {
            self.upload_dir = PathBuf::from(dir);
        }
        if let Some(port) = lookup("PORT").filter(|v| !v.is_empty()) {
            self.port = port
                .parse()
                .map_err(|_| IncidentError::Config(format!("Invalid PORT: {}", port)))?;
        }
        Ok(self)
    }
}
