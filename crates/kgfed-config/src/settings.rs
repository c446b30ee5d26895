use std::time::Duration;

use indexmap::IndexMap;
use kgfed_core::IMPLICIT_CONVERSION;
use serde::{Deserialize, Serialize};

use crate::{ConfigError, Result};

/// Root configuration document.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FederationConfig {
    /// Base URL that relative (`/...`) schema and registry locations resolve against.
    #[serde(default)]
    pub backplane: String,

    /// Expand registry entries into the providers they list.
    #[serde(default = "default_true")]
    pub use_registry: bool,

    /// Leave statistics-capable stores out of the build.
    #[serde(default)]
    pub skip_statistics: bool,

    /// Interval between background schema rebuilds.
    #[serde(default = "default_refresh_interval", with = "humantime_serde")]
    pub refresh_interval: Duration,

    /// Per-request timeout for remote schema fetches.
    #[serde(default = "default_request_timeout", with = "humantime_serde")]
    pub request_timeout: Duration,

    #[serde(default)]
    pub logging: LoggingConfig,

    /// Providers in declaration order.
    #[serde(default)]
    pub providers: IndexMap<String, ProviderConfig>,
}

fn default_true() -> bool {
    true
}

fn default_refresh_interval() -> Duration {
    Duration::from_secs(20 * 60)
}

fn default_request_timeout() -> Duration {
    Duration::from_secs(10)
}

impl Default for FederationConfig {
    fn default() -> Self {
        Self {
            backplane: String::new(),
            use_registry: true,
            skip_statistics: false,
            refresh_interval: default_refresh_interval(),
            request_timeout: default_request_timeout(),
            logging: LoggingConfig::default(),
            providers: IndexMap::new(),
        }
    }
}

impl FederationConfig {
    /// Parse and validate a TOML document.
    pub fn from_toml(content: &str) -> Result<Self> {
        let config: FederationConfig = toml::from_str(content)?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<()> {
        if self.refresh_interval.is_zero() {
            return Err(ConfigError::validation("refresh_interval must be > 0"));
        }
        if self.request_timeout.is_zero() {
            return Err(ConfigError::validation("request_timeout must be > 0"));
        }

        let lvl = self.logging.level.to_ascii_lowercase();
        let valid_levels = ["trace", "debug", "info", "warn", "error", "off"];
        if !valid_levels.contains(&lvl.as_str()) {
            return Err(ConfigError::validation(format!(
                "logging.level must be one of {valid_levels:?}"
            )));
        }

        for (name, provider) in &self.providers {
            provider
                .kind(name)
                .map_err(|e| ConfigError::validation(format!("providers.{name}: {e}")))?;
        }
        Ok(())
    }

    /// Resolve a schema or registry location against the backplane.
    pub fn resolve_location(&self, location: &str) -> String {
        if location.starts_with('/') {
            format!("{}{}", self.backplane.trim_end_matches('/'), location)
        } else {
            location.to_string()
        }
    }

    /// Access URL used for conversion segments, from the reserved provider entry.
    pub fn conversion_url(&self) -> Option<&str> {
        self.providers
            .get(IMPLICIT_CONVERSION)
            .and_then(|p| p.url.as_deref())
    }

    /// Providers that contribute schema layers (everything but the reserved conversion entry).
    pub fn schema_providers(&self) -> impl Iterator<Item = (&String, &ProviderConfig)> {
        self.providers
            .iter()
            .filter(|(name, _)| name.as_str() != IMPLICIT_CONVERSION)
    }
}

/// Where a provider's schema comes from.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum SchemaLocation {
    /// URL of a JSON document, absolute or relative to the backplane.
    Remote(String),
    /// Reachability map written directly in the configuration.
    Inline(serde_json::Map<String, serde_json::Value>),
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ProviderConfig {
    /// Access URL handed to the execution layer.
    #[serde(default)]
    pub url: Option<String>,

    #[serde(default)]
    pub schema: Option<SchemaLocation>,

    /// Registry adapter name (e.g. `automat`).
    #[serde(default)]
    pub registry: Option<String>,

    #[serde(default)]
    pub registry_url: Option<String>,

    /// Registry entries to leave out.
    #[serde(default)]
    pub exclude: Vec<String>,

    /// Name of a statistics-capable store registered on the schema builder.
    #[serde(default)]
    pub statistics_store: Option<String>,
}

/// Variant a provider entry resolves to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProviderKind {
    Inline,
    Remote,
    Registry,
    Statistics,
    Conversion,
}

/// Why a provider entry cannot be classified.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ProviderKindError {
    #[error("exactly one of 'schema', 'registry' or 'statistics_store' must be set, found {0}")]
    SchemaOrigin(usize),

    #[error("'registry' requires 'registry_url'")]
    MissingRegistryUrl,
}

impl ProviderConfig {
    pub fn inline(url: impl Into<String>, schema: serde_json::Value) -> Self {
        let schema = match schema {
            serde_json::Value::Object(map) => Some(SchemaLocation::Inline(map)),
            _ => None,
        };
        Self {
            url: Some(url.into()),
            schema,
            ..Default::default()
        }
    }

    pub fn remote(url: impl Into<String>, location: impl Into<String>) -> Self {
        Self {
            url: Some(url.into()),
            schema: Some(SchemaLocation::Remote(location.into())),
            ..Default::default()
        }
    }

    pub fn registry(adapter: impl Into<String>, registry_url: impl Into<String>) -> Self {
        Self {
            registry: Some(adapter.into()),
            registry_url: Some(registry_url.into()),
            ..Default::default()
        }
    }

    pub fn statistics(url: impl Into<String>, store: impl Into<String>) -> Self {
        Self {
            url: Some(url.into()),
            statistics_store: Some(store.into()),
            ..Default::default()
        }
    }

    /// Classify the entry; exactly one schema origin must be given.
    pub fn kind(&self, name: &str) -> std::result::Result<ProviderKind, ProviderKindError> {
        if name == IMPLICIT_CONVERSION {
            return Ok(ProviderKind::Conversion);
        }

        let origins = [
            self.schema.is_some(),
            self.registry.is_some(),
            self.statistics_store.is_some(),
        ]
        .iter()
        .filter(|set| **set)
        .count();
        if origins != 1 {
            return Err(ProviderKindError::SchemaOrigin(origins));
        }

        if self.registry.is_some() {
            if self.registry_url.is_none() {
                return Err(ProviderKindError::MissingRegistryUrl);
            }
            return Ok(ProviderKind::Registry);
        }
        if self.statistics_store.is_some() {
            return Ok(ProviderKind::Statistics);
        }
        match self.schema {
            Some(SchemaLocation::Remote(_)) => Ok(ProviderKind::Remote),
            _ => Ok(ProviderKind::Inline),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingConfig {
    #[serde(default = "default_log_level")]
    pub level: String,
}

fn default_log_level() -> String {
    "info".into()
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
        }
    }
}
