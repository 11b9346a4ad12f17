use anyhow::{Context, Result};
use directories::ProjectDirs;
use serde::Deserialize;
use std::path::{Path, PathBuf};
use tracing::debug;

use crate::service::{RunLogLevel, StorageType};

/// Environment variable naming an explicit configuration file.
pub const CONFIG_ENV: &str = "WDL_OMICS_CONFIG";

/// Defaults for run settings, read from `config.toml`.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct Config {
    pub role_arn: Option<String>,
    pub output_uri: Option<String>,
    pub region: Option<String>,
    pub storage_type: Option<StorageType>,
    pub cache_id: Option<String>,
    pub log_level: Option<RunLogLevel>,
    pub import_paths: Vec<PathBuf>,
}

/// `<config dir>/wdl-omics-run/config.toml` for the current user.
pub fn default_config_path() -> Option<PathBuf> {
    ProjectDirs::from("com", "wdl-omics-run", "wdl-omics-run")
        .map(|dirs| dirs.config_dir().join("config.toml"))
}

impl Config {
    /// Load from `explicit`, else `$WDL_OMICS_CONFIG`, else the per-user
    /// default location. A missing default file yields the empty config;
    /// a missing explicit file is an error. Environment overrides are
    /// applied afterwards.
    pub fn load(explicit: Option<&Path>) -> Result<Self> {
        let explicit = explicit
            .map(Path::to_path_buf)
            .or_else(|| std::env::var_os(CONFIG_ENV).map(PathBuf::from));

        let mut config = match explicit {
            Some(path) => Self::from_file(&path)?,
            None => match default_config_path() {
                Some(path) if path.exists() => Self::from_file(&path)?,
                _ => Self::default(),
            },
        };
        config.merge_env_vars();
        Ok(config)
    }

    pub fn from_file(path: &Path) -> Result<Self> {
        debug!("Loading configuration from {}", path.display());
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file {}", path.display()))?;
        toml::from_str(&content)
            .with_context(|| format!("Failed to parse config file {}", path.display()))
    }

    pub fn merge_env_vars(&mut self) {
        self.merge_env_from(|key| std::env::var(key).ok());
    }

    fn merge_env_from(&mut self, lookup: impl Fn(&str) -> Option<String>) {
        if let Some(role_arn) = lookup("WDL_OMICS_ROLE_ARN") {
            self.role_arn = Some(role_arn);
        }

        if let Some(output_uri) = lookup("WDL_OMICS_OUTPUT_URI") {
            self.output_uri = Some(output_uri);
        }

        if let Some(region) = lookup("WDL_OMICS_REGION") {
            self.region = Some(region);
        }
    }
}
