//! Configuration for the kgfed schema federation.
//!
//! The configuration is a single TOML document naming the providers to
//! federate, where their schemas come from, and how often the merged schema
//! is rebuilt:
//!
//! ```toml
//! backplane = "http://localhost:8099"
//! refresh_interval = "20m"
//!
//! [providers.kp1]
//! url = "/graph/kp1"
//! schema = { gene = { disease = "related_to" } }
//!
//! [providers.rtx]
//! url = "/graph/rtx"
//! schema = "/graph/rtx/schema"
//! ```

pub mod loader;
pub mod observability;
pub mod settings;

pub use loader::{CONFIG_ENV_VAR, ConfigPathSource, DEFAULT_CONFIG_PATH, load_config, resolve_config_path};
pub use settings::{
    FederationConfig, LoggingConfig, ProviderConfig, ProviderKind, ProviderKindError, SchemaLocation,
};

use std::path::PathBuf;

/// Error types for configuration operations
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Config file not found: {0}")]
    NotFound(PathBuf),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Parse error: {0}")]
    Parse(String),

    #[error("Validation error: {0}")]
    Validation(String),
}

impl ConfigError {
    pub fn parse(msg: impl Into<String>) -> Self {
        Self::Parse(msg.into())
    }

    pub fn validation(msg: impl Into<String>) -> Self {
        Self::Validation(msg.into())
    }
}

impl From<toml::de::Error> for ConfigError {
    fn from(err: toml::de::Error) -> Self {
        Self::Parse(err.to_string())
    }
}

/// Result type for configuration operations
pub type Result<T> = std::result::Result<T, ConfigError>;
