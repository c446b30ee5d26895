//! One build pass: configuration → sources → merged snapshot.

use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};

use arc_swap::ArcSwap;
use futures_util::future::join_all;
use kgfed_config::observability::apply_logging_level;
use kgfed_config::{ConfigError, FederationConfig, load_config};
use tracing::{debug, info, warn};

use crate::snapshot::SchemaSnapshot;
use crate::source::http::HttpFetcher;
use crate::source::statistics::StatisticsStore;
use crate::source::{SourceFactory, StoreRegistry};

pub struct SchemaBuilder {
    config: ArcSwap<FederationConfig>,
    /// Re-read at the start of every build when set.
    config_path: Option<PathBuf>,
    stores: StoreRegistry,
    fetcher: HttpFetcher,
    generation: AtomicU64,
}

impl SchemaBuilder {
    pub fn new(config: FederationConfig) -> Self {
        Self {
            config: ArcSwap::from_pointee(config),
            config_path: None,
            stores: StoreRegistry::new(),
            fetcher: HttpFetcher::default(),
            generation: AtomicU64::new(0),
        }
    }

    /// Load the configuration file and keep following it on later builds.
    pub fn from_path(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let config = load_config(path)?;
        let mut builder = Self::new(config);
        builder.config_path = Some(path.to_path_buf());
        Ok(builder)
    }

    /// Register a statistics store under the name configuration refers to.
    pub fn with_store(mut self, name: impl Into<String>, store: Arc<dyn StatisticsStore>) -> Self {
        self.register_store(name, store);
        self
    }

    pub fn register_store(&mut self, name: impl Into<String>, store: Arc<dyn StatisticsStore>) {
        self.stores.insert(name.into(), store);
    }

    /// Use a preconfigured HTTP client (proxies, TLS roots).
    pub fn with_http_client(mut self, client: reqwest::Client) -> Self {
        self.fetcher = HttpFetcher::new(client);
        self
    }

    pub fn config(&self) -> Arc<FederationConfig> {
        self.config.load_full()
    }

    /// Replace the configuration used by the next build.
    pub fn set_config(&self, config: FederationConfig) {
        self.config.store(Arc::new(config));
    }

    pub fn config_path(&self) -> Option<&Path> {
        self.config_path.as_deref()
    }

    /// Build a fresh snapshot from the current configuration.
    ///
    /// Never fails: unreachable or malformed providers are left out and
    /// recorded on the snapshot's error list.
    pub async fn build(&self) -> SchemaSnapshot {
        self.reload_config();
        let config = self.config.load_full();
        let generation = self.generation.fetch_add(1, Ordering::SeqCst) + 1;

        let (sources, setup_errors) = SourceFactory::new(&config, &self.stores).sources();
        info!(
            generation,
            sources = sources.len(),
            "Building federated schema"
        );

        let outcomes = join_all(
            sources
                .iter()
                .map(|source| source.load(&self.fetcher, config.request_timeout)),
        )
        .await;

        let mut snapshot = SchemaSnapshot::new(generation, config.conversion_url().map(str::to_string));
        for error in setup_errors {
            warn!(provider = %error.provider(), error = %error, "Provider not loaded");
            snapshot.add_error(error);
        }
        for outcome in outcomes {
            for error in outcome.errors {
                warn!(provider = %error.provider(), error = %error, "Provider schema failure");
                snapshot.add_error(error);
            }
            for schema in outcome.schemas {
                debug!(
                    provider = %schema.id,
                    transitions = schema.transition_count(),
                    "Merging provider layer"
                );
                snapshot.add_layer(schema);
            }
        }

        info!(
            generation,
            providers = snapshot.providers().len(),
            concept_types = snapshot.graph().node_count(),
            transitions = snapshot.graph().edge_count(),
            errors = snapshot.errors().len(),
            "Federated schema built"
        );
        snapshot
    }

    fn reload_config(&self) {
        let Some(path) = &self.config_path else {
            return;
        };
        match load_config(path) {
            Ok(config) => {
                let previous = self.config.load();
                if previous.logging.level != config.logging.level {
                    apply_logging_level(&config.logging.level);
                }
                self.config.store(Arc::new(config));
            }
            Err(e) => {
                warn!(
                    path = %path.display(),
                    error = %e,
                    "Failed to reload configuration, keeping previous"
                );
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::source::statistics::StaticStatisticsStore;
    use kgfed_config::ProviderConfig;
    use kgfed_core::BuildErrorKind;
    use serde_json::json;

    #[tokio::test]
    async fn test_build_inline_and_statistics() {
        let mut config = FederationConfig::default();
        config.providers.insert(
            "kp1".into(),
            ProviderConfig::inline("/graph/kp1", json!({"gene": {"disease": "related_to"}})),
        );
        config
            .providers
            .insert("redis".into(), ProviderConfig::statistics("/graph/redis", "redis"));

        let store = StaticStatisticsStore::new(json!({"gene": {"disease": "related_to"}}))
            .with_count("gene", "disease", "related_to", 5);
        let builder = SchemaBuilder::new(config).with_store("redis", Arc::new(store));

        let snapshot = builder.build().await;
        assert!(snapshot.errors().is_empty());
        assert_eq!(snapshot.generation(), 1);

        let edge = snapshot
            .graph()
            .get_edge("gene", "disease", Some("related_to"))
            .unwrap();
        assert!(edge.is_offered_by("kp1"));
        assert_eq!(edge.score("redis"), Some(1.0));

        assert_eq!(builder.build().await.generation(), 2);
    }

    #[tokio::test]
    async fn test_malformed_provider_does_not_abort_build() {
        let mut config = FederationConfig::default();
        config.providers.insert(
            "kp1".into(),
            ProviderConfig::inline("/graph/kp1", json!({"gene": {"disease": "related_to"}})),
        );
        config.providers.insert(
            "broken".into(),
            ProviderConfig::inline("/graph/broken", json!({"message": "down for maintenance"})),
        );
        let builder = SchemaBuilder::new(config);

        let snapshot = builder.build().await;
        assert_eq!(snapshot.providers().len(), 1);
        assert_eq!(snapshot.errors().len(), 1);
        assert_eq!(snapshot.errors()[0].provider(), "broken");
        assert_eq!(snapshot.errors()[0].kind(), BuildErrorKind::MalformedSchema);
    }

    #[tokio::test]
    async fn test_set_config_applies_to_next_build() {
        let builder = SchemaBuilder::new(FederationConfig::default());
        assert!(builder.build().await.providers().is_empty());

        let mut config = FederationConfig::default();
        config.providers.insert(
            "kp2".into(),
            ProviderConfig::inline("/graph/kp2", json!({"gene": {"protein": "codes_for"}})),
        );
        builder.set_config(config);

        let snapshot = builder.build().await;
        assert!(snapshot.provider("kp2").is_some());
    }
}
