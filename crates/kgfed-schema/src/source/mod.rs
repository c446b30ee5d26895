//! Schema sources: where each provider layer comes from.
//!
//! [`SourceFactory`] turns configuration entries into typed [`SchemaSource`]
//! values; every source loads into a [`LoadOutcome`] holding the layers it
//! produced and the failures it hit. Loading never fails as a whole.

pub mod http;
pub mod registry;
pub mod statistics;

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use kgfed_config::{FederationConfig, ProviderConfig, ProviderKind, SchemaLocation};
use kgfed_core::BuildError;
use serde_json::Value;
use tracing::debug;

use crate::provider::ProviderSchema;
use http::HttpFetcher;
use registry::{RegistryKind, RegistrySource};
use statistics::StatisticsStore;

/// Named statistics stores available to the factory.
pub type StoreRegistry = HashMap<String, Arc<dyn StatisticsStore>>;

/// Layers and failures produced by one source.
#[derive(Debug, Default)]
pub struct LoadOutcome {
    pub schemas: Vec<ProviderSchema>,
    pub errors: Vec<BuildError>,
}

impl LoadOutcome {
    pub fn failed(error: BuildError) -> Self {
        Self {
            schemas: Vec::new(),
            errors: vec![error],
        }
    }

    /// Take in the result of parsing one raw document.
    pub fn absorb(&mut self, parsed: Result<(ProviderSchema, Vec<BuildError>), BuildError>) {
        match parsed {
            Ok((schema, issues)) => {
                self.schemas.push(schema);
                self.errors.extend(issues);
            }
            Err(e) => self.errors.push(e),
        }
    }

    fn parsed(parsed: Result<(ProviderSchema, Vec<BuildError>), BuildError>) -> Self {
        let mut outcome = Self::default();
        outcome.absorb(parsed);
        outcome
    }
}

pub enum SchemaSource {
    /// Reachability map written in the configuration.
    Inline {
        id: String,
        url: String,
        document: Value,
    },
    /// JSON document fetched over HTTP.
    Remote {
        id: String,
        url: String,
        location: String,
    },
    /// Registry listing several providers.
    Registry(RegistrySource),
    /// Store supplying a schema plus usage counts.
    Statistics {
        id: String,
        url: String,
        store: Arc<dyn StatisticsStore>,
    },
}

impl SchemaSource {
    /// Configuration entry name this source was created from.
    pub fn name(&self) -> &str {
        match self {
            SchemaSource::Inline { id, .. }
            | SchemaSource::Remote { id, .. }
            | SchemaSource::Statistics { id, .. } => id,
            SchemaSource::Registry(registry) => &registry.name,
        }
    }

    pub fn kind(&self) -> ProviderKind {
        match self {
            SchemaSource::Inline { .. } => ProviderKind::Inline,
            SchemaSource::Remote { .. } => ProviderKind::Remote,
            SchemaSource::Registry(_) => ProviderKind::Registry,
            SchemaSource::Statistics { .. } => ProviderKind::Statistics,
        }
    }

    pub async fn load(&self, fetcher: &HttpFetcher, timeout: Duration) -> LoadOutcome {
        match self {
            SchemaSource::Inline { id, url, document } => {
                LoadOutcome::parsed(ProviderSchema::parse(id, url, document))
            }
            SchemaSource::Remote { id, url, location } => {
                match fetcher.fetch_json(id, location, timeout).await {
                    Ok(document) => LoadOutcome::parsed(ProviderSchema::parse(id, url, &document)),
                    Err(e) => LoadOutcome::failed(e),
                }
            }
            SchemaSource::Registry(registry) => registry.discover(fetcher, timeout).await,
            SchemaSource::Statistics { id, url, store } => {
                let loaded = tokio::time::timeout(timeout, async {
                    tokio::join!(store.schema(), store.edge_counts())
                })
                .await;

                let (document, counts) = match loaded {
                    Ok((Ok(document), Ok(counts))) => (document, counts),
                    Ok((Err(e), _)) | Ok((_, Err(e))) => {
                        return LoadOutcome::failed(BuildError::fetch(id, url, e.to_string()));
                    }
                    Err(_) => {
                        return LoadOutcome::failed(BuildError::timeout(
                            id,
                            url,
                            format!("statistics store did not answer within {timeout:?}"),
                        ));
                    }
                };

                LoadOutcome::parsed(
                    ProviderSchema::parse(id, url, &document)
                        .map(|(schema, issues)| (schema.with_statistics(counts), issues)),
                )
            }
        }
    }
}

/// Builds [`SchemaSource`]s from configuration entries.
pub struct SourceFactory<'a> {
    config: &'a FederationConfig,
    stores: &'a StoreRegistry,
}

impl<'a> SourceFactory<'a> {
    pub fn new(config: &'a FederationConfig, stores: &'a StoreRegistry) -> Self {
        Self { config, stores }
    }

    /// Sources for every schema-providing entry, in configuration order.
    ///
    /// Entries that cannot be turned into a source are reported as build
    /// errors; entries disabled by configuration are silently left out.
    pub fn sources(&self) -> (Vec<SchemaSource>, Vec<BuildError>) {
        let mut sources = Vec::new();
        let mut errors = Vec::new();
        for (name, provider) in self.config.schema_providers() {
            match self.source_for(name, provider) {
                Ok(Some(source)) => sources.push(source),
                Ok(None) => {}
                Err(e) => errors.push(e),
            }
        }
        (sources, errors)
    }

    pub fn source_for(
        &self,
        name: &str,
        provider: &ProviderConfig,
    ) -> Result<Option<SchemaSource>, BuildError> {
        let kind = provider
            .kind(name)
            .map_err(|e| BuildError::malformed(name, e.to_string()))?;
        let url = provider.url.clone().unwrap_or_default();

        let source = match (kind, &provider.schema) {
            (ProviderKind::Conversion, _) => return Ok(None),
            (ProviderKind::Inline, Some(SchemaLocation::Inline(map))) => SchemaSource::Inline {
                id: name.to_string(),
                url,
                document: Value::Object(map.clone()),
            },
            (ProviderKind::Remote, Some(SchemaLocation::Remote(location))) => SchemaSource::Remote {
                id: name.to_string(),
                url,
                location: self.config.resolve_location(location),
            },
            (ProviderKind::Registry, _) => {
                if !self.config.use_registry {
                    debug!(provider = %name, "Registry use disabled, skipping entry");
                    return Ok(None);
                }
                let adapter = provider.registry.as_deref().unwrap_or_default();
                let registry_kind: RegistryKind = adapter
                    .parse()
                    .map_err(|_| BuildError::unregistered_adapter(name, adapter))?;
                let base_url = provider.registry_url.as_deref().unwrap_or_default();
                SchemaSource::Registry(RegistrySource {
                    name: name.to_string(),
                    kind: registry_kind,
                    base_url: self.config.resolve_location(base_url),
                    exclude: provider.exclude.clone(),
                })
            }
            (ProviderKind::Statistics, _) => {
                if self.config.skip_statistics {
                    debug!(provider = %name, "Statistics stores skipped by configuration");
                    return Ok(None);
                }
                let store_name = provider.statistics_store.as_deref().unwrap_or_default();
                let store = self
                    .stores
                    .get(store_name)
                    .cloned()
                    .ok_or_else(|| BuildError::unregistered_adapter(name, store_name))?;
                SchemaSource::Statistics {
                    id: name.to_string(),
                    url,
                    store,
                }
            }
            (kind, _) => {
                return Err(BuildError::malformed(
                    name,
                    format!("schema location does not match provider kind {kind:?}"),
                ));
            }
        };
        Ok(Some(source))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use kgfed_core::BuildErrorKind;
    use serde_json::json;
    use statistics::StaticStatisticsStore;

    fn config() -> FederationConfig {
        let mut config = FederationConfig {
            backplane: "http://backplane:8099".into(),
            ..Default::default()
        };
        config.providers.insert(
            "kp1".into(),
            ProviderConfig::inline("/graph/kp1", json!({"gene": {"disease": "related_to"}})),
        );
        config
            .providers
            .insert("rtx".into(), ProviderConfig::remote("/graph/rtx", "/graph/rtx/schema"));
        config.providers.insert(
            "automat".into(),
            ProviderConfig::registry("automat", "/graph/automat"),
        );
        config
            .providers
            .insert("redis".into(), ProviderConfig::statistics("/graph/redis", "redis"));
        config
    }

    fn stores() -> StoreRegistry {
        let mut stores = StoreRegistry::new();
        let store: Arc<dyn StatisticsStore> = Arc::new(StaticStatisticsStore::default());
        stores.insert("redis".into(), store);
        stores
    }

    #[test]
    fn test_factory_builds_typed_sources_in_order() {
        let config = config();
        let stores = stores();
        let (sources, errors) = SourceFactory::new(&config, &stores).sources();

        assert!(errors.is_empty());
        let kinds: Vec<_> = sources.iter().map(SchemaSource::kind).collect();
        assert_eq!(
            kinds,
            vec![
                ProviderKind::Inline,
                ProviderKind::Remote,
                ProviderKind::Registry,
                ProviderKind::Statistics
            ]
        );
        match &sources[1] {
            SchemaSource::Remote { location, .. } => {
                assert_eq!(location, "http://backplane:8099/graph/rtx/schema")
            }
            _ => panic!("expected remote source"),
        }
        match &sources[2] {
            SchemaSource::Registry(registry) => {
                assert_eq!(registry.base_url, "http://backplane:8099/graph/automat")
            }
            _ => panic!("expected registry source"),
        }
    }

    #[test]
    fn test_disabled_variants_are_dropped() {
        let mut config = config();
        config.use_registry = false;
        config.skip_statistics = true;
        let stores = stores();
        let (sources, errors) = SourceFactory::new(&config, &stores).sources();

        assert!(errors.is_empty());
        let names: Vec<_> = sources.iter().map(SchemaSource::name).collect();
        assert_eq!(names, vec!["kp1", "rtx"]);
    }

    #[test]
    fn test_unregistered_adapters_are_reported() {
        let mut config = config();
        config.providers.insert(
            "smartapi".into(),
            ProviderConfig::registry("smartapi", "/graph/smartapi"),
        );
        let (sources, errors) = SourceFactory::new(&config, &StoreRegistry::new()).sources();

        assert_eq!(sources.len(), 3);
        let failed: Vec<_> = errors.iter().map(|e| (e.provider(), e.kind())).collect();
        assert_eq!(
            failed,
            vec![
                ("redis", BuildErrorKind::UnregisteredAdapter),
                ("smartapi", BuildErrorKind::UnregisteredAdapter)
            ]
        );
    }

    #[tokio::test]
    async fn test_statistics_source_attaches_counts() {
        let store: Arc<dyn StatisticsStore> = Arc::new(
            StaticStatisticsStore::new(json!({"gene": {"disease": ["related_to", "causes"]}}))
                .with_count("gene", "disease", "related_to", 3)
                .with_count("gene", "disease", "causes", 1),
        );
        let source = SchemaSource::Statistics {
            id: "redis".into(),
            url: "/graph/redis".into(),
            store,
        };

        let outcome = source
            .load(&HttpFetcher::default(), Duration::from_secs(1))
            .await;
        assert!(outcome.errors.is_empty());
        let stats = outcome.schemas[0].statistics.as_ref().unwrap();
        assert_eq!(stats.relevance("gene", "disease", "related_to"), Some(0.75));
    }
}
