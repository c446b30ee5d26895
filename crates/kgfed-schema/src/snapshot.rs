use indexmap::IndexMap;
use kgfed_core::BuildError;
use serde::Serialize;
use time::OffsetDateTime;

use crate::graph::{EdgeAttributes, GraphStore};
use crate::provider::ProviderSchema;

/// The merged result of one build pass.
///
/// Published snapshots are shared behind an `Arc` and never mutated in
/// place; a caller that wants to edit one goes through `Arc::make_mut` and
/// gets a private copy.
#[derive(Debug, Clone)]
pub struct SchemaSnapshot {
    providers: IndexMap<String, ProviderSchema>,
    graph: GraphStore,
    errors: Vec<BuildError>,
    built_at: OffsetDateTime,
    generation: u64,
    conversion_url: Option<String>,
}

impl SchemaSnapshot {
    pub fn new(generation: u64, conversion_url: Option<String>) -> Self {
        Self {
            providers: IndexMap::new(),
            graph: GraphStore::new(),
            errors: Vec::new(),
            built_at: OffsetDateTime::now_utc(),
            generation,
            conversion_url,
        }
    }

    /// Snapshot made of the given layers, in order.
    pub fn from_providers(
        providers: impl IntoIterator<Item = ProviderSchema>,
        conversion_url: Option<String>,
    ) -> Self {
        let mut snapshot = Self::new(0, conversion_url);
        for provider in providers {
            snapshot.add_layer(provider);
        }
        snapshot
    }

    /// Merge one provider's layer into the graph.
    ///
    /// A provider id seen before is ignored and reported as a build error.
    pub fn add_layer(&mut self, provider: ProviderSchema) {
        if self.providers.contains_key(&provider.id) {
            self.errors.push(BuildError::malformed(
                &provider.id,
                "duplicate provider id, keeping the first layer",
            ));
            return;
        }

        for (source, targets) in &provider.reachability {
            self.graph.add_node(source, [provider.id.as_str()]);
            for (target, predicates) in targets {
                self.graph.add_node(target, [provider.id.as_str()]);
                for predicate in predicates {
                    let mut attrs = EdgeAttributes::provider(&provider.id);
                    if let Some(score) = provider
                        .statistics
                        .as_ref()
                        .and_then(|s| s.relevance(source, target, predicate))
                    {
                        attrs = attrs.with_score(&provider.id, score);
                    }
                    self.graph.add_edge(source, predicate, target, attrs);
                }
            }
        }
        self.providers.insert(provider.id.clone(), provider);
    }

    pub fn add_error(&mut self, error: BuildError) {
        self.errors.push(error);
    }

    pub fn providers(&self) -> &IndexMap<String, ProviderSchema> {
        &self.providers
    }

    pub fn provider(&self, id: &str) -> Option<&ProviderSchema> {
        self.providers.get(id)
    }

    pub fn graph(&self) -> &GraphStore {
        &self.graph
    }

    pub fn graph_mut(&mut self) -> &mut GraphStore {
        &mut self.graph
    }

    /// Per-provider failures accumulated during the build.
    pub fn errors(&self) -> &[BuildError] {
        &self.errors
    }

    pub fn built_at(&self) -> OffsetDateTime {
        self.built_at
    }

    pub fn generation(&self) -> u64 {
        self.generation
    }

    /// Access URL for implicit-conversion segments.
    pub fn conversion_url(&self) -> Option<&str> {
        self.conversion_url.as_deref()
    }

    /// The merged graph as a knowledge-graph message, see [`GraphStore::to_message`].
    pub fn to_message(&self) -> serde_json::Value {
        self.graph.to_message()
    }

    pub fn summary(&self) -> SnapshotSummary {
        SnapshotSummary {
            generation: self.generation,
            built_at: self.built_at,
            providers: self.providers.keys().cloned().collect(),
            concept_types: self.graph.node_count(),
            transitions: self.graph.edge_count(),
            errors: self.errors.clone(),
        }
    }
}

/// Serializable overview of a snapshot, for logs and status endpoints.
#[derive(Debug, Clone, Serialize)]
pub struct SnapshotSummary {
    pub generation: u64,
    #[serde(with = "time::serde::rfc3339")]
    pub built_at: OffsetDateTime,
    pub providers: Vec<String>,
    pub concept_types: usize,
    pub transitions: usize,
    pub errors: Vec<BuildError>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::provider::EdgeCounts;
    use serde_json::json;

    fn layer(id: &str, doc: serde_json::Value) -> ProviderSchema {
        ProviderSchema::parse(id, format!("/graph/{id}"), &doc).unwrap().0
    }

    #[test]
    fn test_shared_transition_carries_both_providers() {
        let snapshot = SchemaSnapshot::from_providers(
            [
                layer("kp1", json!({"gene": {"disease": "related_to"}})),
                layer("kp2", json!({"gene": {"disease": "related_to"}})),
            ],
            None,
        );

        let graph = snapshot.graph();
        assert_eq!(graph.edge_count(), 1);
        let edge = graph.get_edge("gene", "disease", Some("related_to")).unwrap();
        assert_eq!(
            edge.providers.iter().map(String::as_str).collect::<Vec<_>>(),
            vec!["kp1", "kp2"]
        );
        assert!(graph.get_node("gene").unwrap().providers.contains("kp2"));
    }

    #[test]
    fn test_scores_only_for_providers_with_statistics() {
        let counted = layer("redis", json!({"gene": {"disease": ["related_to", "causes"]}}))
            .with_statistics(
                EdgeCounts::new()
                    .with("gene", "disease", "related_to", 1)
                    .with("gene", "disease", "causes", 3),
            );
        let plain = layer("kp1", json!({"gene": {"disease": "related_to"}}));
        let snapshot = SchemaSnapshot::from_providers([counted, plain], None);

        let related = snapshot
            .graph()
            .get_edge("gene", "disease", Some("related_to"))
            .unwrap();
        assert_eq!(related.score("redis"), Some(0.25));
        assert_eq!(related.score("kp1"), None);
        let causes = snapshot.graph().get_edge("gene", "disease", Some("causes")).unwrap();
        assert_eq!(causes.score("redis"), Some(0.75));
    }

    #[test]
    fn test_duplicate_layer_reported() {
        let mut snapshot = SchemaSnapshot::new(1, None);
        snapshot.add_layer(layer("kp1", json!({"gene": {"disease": "related_to"}})));
        snapshot.add_layer(layer("kp1", json!({"gene": {"protein": "related_to"}})));

        assert_eq!(snapshot.providers().len(), 1);
        assert_eq!(snapshot.errors().len(), 1);
        assert!(!snapshot.graph().has_node("protein"));
    }

    #[test]
    fn test_message_lists_merged_layers() {
        let snapshot = SchemaSnapshot::from_providers(
            [
                layer("kp1", json!({"gene": {"disease": "related_to"}})),
                layer("kp2", json!({"disease": {"phenotypic_feature": "has_phenotype"}})),
            ],
            None,
        );
        let message = snapshot.to_message();
        let graph = &message["knowledge_graph"];

        assert_eq!(graph["nodes"].as_array().unwrap().len(), 3);
        assert_eq!(graph["nodes"][1], json!(["disease", {"providers": ["kp1", "kp2"]}]));
        assert_eq!(
            graph["edges"],
            json!([
                ["gene", "related_to", "disease", {"providers": ["kp1"], "scores": {}}],
                ["disease", "has_phenotype", "phenotypic_feature", {"providers": ["kp2"], "scores": {}}]
            ])
        );
        assert_eq!(message["knowledge_map"], json!([{}]));
    }

    #[test]
    fn test_summary_serializes() {
        let snapshot = SchemaSnapshot::from_providers(
            [layer("kp1", json!({"gene": {"disease": "related_to"}}))],
            Some("/graph/conv".into()),
        );
        let summary = serde_json::to_value(snapshot.summary()).unwrap();
        assert_eq!(summary["providers"], json!(["kp1"]));
        assert_eq!(summary["transitions"], 1);
        assert!(summary["built_at"].is_string());
        assert_eq!(snapshot.conversion_url(), Some("/graph/conv"));
    }
}
