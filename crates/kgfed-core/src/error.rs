use serde::Serialize;
use thiserror::Error;

/// Fatal errors surfaced to callers of the planner, validator and adapters.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum FederationError {
    #[error("Invalid transition from {source_type} to {target_type}: {explanation}")]
    InvalidTransition {
        source_type: String,
        target_type: String,
        explanation: String,
    },

    #[error("No adapter registered under the name '{0}'")]
    UnregisteredAdapter(String),

    #[error("No provider or conversion connects {source_type} to {target_type}")]
    UnplannableHop {
        source_type: String,
        target_type: String,
    },

    #[error("Invalid query: {0}")]
    InvalidQuery(String),

    #[error("Query edge '{edge}' references unknown node '{node}'")]
    UnknownQueryNode { edge: String, node: String },
}

impl FederationError {
    /// Create an InvalidTransition error with the standard explanation.
    pub fn invalid_transition(source_type: impl Into<String>, target_type: impl Into<String>) -> Self {
        let source_type = source_type.into();
        let target_type = target_type.into();
        let explanation = format!(
            "No valid transitions exist between {source_type} and {target_type} in this schema."
        );
        Self::InvalidTransition {
            source_type,
            target_type,
            explanation,
        }
    }

    pub fn unregistered_adapter(name: impl Into<String>) -> Self {
        Self::UnregisteredAdapter(name.into())
    }

    pub fn unplannable_hop(source_type: impl Into<String>, target_type: impl Into<String>) -> Self {
        Self::UnplannableHop {
            source_type: source_type.into(),
            target_type: target_type.into(),
        }
    }

    pub fn invalid_query(message: impl Into<String>) -> Self {
        Self::InvalidQuery(message.into())
    }

    /// Check if this error came from validating a transition.
    pub fn is_invalid_transition(&self) -> bool {
        matches!(self, Self::InvalidTransition { .. })
    }

    /// Human readable explanation, when the error carries one.
    pub fn explanation(&self) -> Option<&str> {
        match self {
            Self::InvalidTransition { explanation, .. } => Some(explanation),
            _ => None,
        }
    }
}

/// Result type for kgfed operations
pub type Result<T> = std::result::Result<T, FederationError>;

/// Classification of a per-provider build failure.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum BuildErrorKind {
    Timeout,
    Connection,
    Fetch,
    MalformedSchema,
    UnregisteredAdapter,
}

/// A non-fatal failure loading one provider's schema.
///
/// Build errors are accumulated on the snapshot and never raised: the
/// failing provider is left out of that build cycle only.
#[derive(Debug, Clone, PartialEq, Eq, Error, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum BuildError {
    #[error("Request timed out while fetching schema at \"{url}\"")]
    Timeout {
        provider: String,
        url: String,
        message: String,
    },

    #[error("Request could not connect while fetching schema at \"{url}\"")]
    Connection {
        provider: String,
        url: String,
        message: String,
    },

    #[error("Request failed while fetching schema at \"{url}\": {message}")]
    Fetch {
        provider: String,
        url: String,
        message: String,
    },

    #[error("Malformed schema for provider {provider}: {message}")]
    MalformedSchema { provider: String, message: String },

    #[error("No adapter '{adapter}' registered for provider {provider}")]
    UnregisteredAdapter { provider: String, adapter: String },
}

impl BuildError {
    pub fn timeout(provider: impl Into<String>, url: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Timeout {
            provider: provider.into(),
            url: url.into(),
            message: message.into(),
        }
    }

    pub fn connection(
        provider: impl Into<String>,
        url: impl Into<String>,
        message: impl Into<String>,
    ) -> Self {
        Self::Connection {
            provider: provider.into(),
            url: url.into(),
            message: message.into(),
        }
    }

    pub fn fetch(provider: impl Into<String>, url: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Fetch {
            provider: provider.into(),
            url: url.into(),
            message: message.into(),
        }
    }

    pub fn malformed(provider: impl Into<String>, message: impl Into<String>) -> Self {
        Self::MalformedSchema {
            provider: provider.into(),
            message: message.into(),
        }
    }

    pub fn unregistered_adapter(provider: impl Into<String>, adapter: impl Into<String>) -> Self {
        Self::UnregisteredAdapter {
            provider: provider.into(),
            adapter: adapter.into(),
        }
    }

    /// Provider the failure belongs to.
    pub fn provider(&self) -> &str {
        match self {
            Self::Timeout { provider, .. }
            | Self::Connection { provider, .. }
            | Self::Fetch { provider, .. }
            | Self::MalformedSchema { provider, .. }
            | Self::UnregisteredAdapter { provider, .. } => provider,
        }
    }

    /// URL that failed, for fetch failures.
    pub fn url(&self) -> Option<&str> {
        match self {
            Self::Timeout { url, .. } | Self::Connection { url, .. } | Self::Fetch { url, .. } => {
                Some(url)
            }
            Self::MalformedSchema { .. } | Self::UnregisteredAdapter { .. } => None,
        }
    }

    pub fn kind(&self) -> BuildErrorKind {
        match self {
            Self::Timeout { .. } => BuildErrorKind::Timeout,
            Self::Connection { .. } => BuildErrorKind::Connection,
            Self::Fetch { .. } => BuildErrorKind::Fetch,
            Self::MalformedSchema { .. } => BuildErrorKind::MalformedSchema,
            Self::UnregisteredAdapter { .. } => BuildErrorKind::UnregisteredAdapter,
        }
    }

    /// Check if the provider could not be reached at all.
    pub fn is_fetch_failure(&self) -> bool {
        matches!(
            self.kind(),
            BuildErrorKind::Timeout | BuildErrorKind::Connection | BuildErrorKind::Fetch
        )
    }
}
