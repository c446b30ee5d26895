//! Locating and reading the configuration file.

use std::fmt;
use std::path::{Path, PathBuf};

use tracing::debug;

use crate::settings::FederationConfig;
use crate::{ConfigError, Result};

/// Environment variable naming the configuration file.
pub const CONFIG_ENV_VAR: &str = "KGFED_CONFIG";

/// File used when neither the caller nor the environment names one.
pub const DEFAULT_CONFIG_PATH: &str = "kgfed.toml";

/// How the configuration path was determined.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConfigPathSource {
    /// Passed in explicitly by the caller
    Explicit,
    /// From the KGFED_CONFIG environment variable
    EnvironmentVariable,
    /// Default path (kgfed.toml)
    Default,
}

impl fmt::Display for ConfigPathSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Explicit => write!(f, "explicit path"),
            Self::EnvironmentVariable => write!(f, "environment variable ({CONFIG_ENV_VAR})"),
            Self::Default => write!(f, "default"),
        }
    }
}

/// Pick the configuration path: explicit argument, then environment, then default.
pub fn resolve_config_path(explicit: Option<&str>) -> (PathBuf, ConfigPathSource) {
    if let Some(path) = explicit {
        return (PathBuf::from(path), ConfigPathSource::Explicit);
    }
    match std::env::var(CONFIG_ENV_VAR) {
        Ok(path) if !path.is_empty() => (PathBuf::from(path), ConfigPathSource::EnvironmentVariable),
        _ => (PathBuf::from(DEFAULT_CONFIG_PATH), ConfigPathSource::Default),
    }
}

/// Read, parse and validate a configuration file.
///
/// A missing file is an error: the federation has nothing to build without it.
pub fn load_config(path: impl AsRef<Path>) -> Result<FederationConfig> {
    let path = path.as_ref();
    if !path.exists() {
        return Err(ConfigError::NotFound(path.to_path_buf()));
    }

    let content = std::fs::read_to_string(path)?;
    let config = FederationConfig::from_toml(&content)?;
    debug!(
        path = %path.display(),
        providers = config.providers.len(),
        "Loaded federation configuration"
    );
    Ok(config)
}
