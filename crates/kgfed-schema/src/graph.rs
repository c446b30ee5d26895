//! Directed multi-edge graph over concept types.
//!
//! Nodes are keyed by normalized concept-type id. Several edges may join the
//! same ordered pair of nodes as long as their predicates differ; inserting an
//! edge whose predicate already exists between the pair merges attributes
//! instead of adding a parallel edge.

use std::collections::{BTreeMap, BTreeSet, HashMap};

use petgraph::graph::{DiGraph, EdgeIndex, NodeIndex};
use petgraph::visit::EdgeRef;
use serde::Serialize;
use serde_json::{Value, json};

/// A concept type and the providers that expose it.
#[derive(Debug, Clone, PartialEq)]
pub struct ConceptNode {
    pub id: String,
    pub providers: BTreeSet<String>,
}

/// A predicate-labelled transition between two concept types.
#[derive(Debug, Clone, PartialEq)]
pub struct Transition {
    pub predicate: String,
    /// Providers offering this transition. Never empty.
    pub providers: BTreeSet<String>,
    /// Relevance in `[0, 1]`, only for providers that published usage statistics.
    pub scores: BTreeMap<String, f64>,
}

impl Transition {
    pub fn score(&self, provider: &str) -> Option<f64> {
        self.scores.get(provider).copied()
    }

    pub fn is_offered_by(&self, provider: &str) -> bool {
        self.providers.contains(provider)
    }
}

/// Attributes merged into an edge on insertion.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct EdgeAttributes {
    pub providers: BTreeSet<String>,
    pub scores: BTreeMap<String, f64>,
}

impl EdgeAttributes {
    /// Attributes for a single offering provider.
    pub fn provider(id: impl Into<String>) -> Self {
        let mut providers = BTreeSet::new();
        providers.insert(id.into());
        Self {
            providers,
            scores: BTreeMap::new(),
        }
    }

    pub fn with_score(mut self, provider: impl Into<String>, score: f64) -> Self {
        self.scores.insert(provider.into(), score);
        self
    }
}

#[derive(Debug, Clone, Default)]
pub struct GraphStore {
    graph: DiGraph<ConceptNode, Transition>,
    /// Index: concept id → NodeIndex
    node_index: HashMap<String, NodeIndex>,
}

impl GraphStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Create the node if absent, otherwise union its provider set.
    pub fn add_node<I, S>(&mut self, id: &str, providers: I) -> NodeIndex
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let idx = self.ensure_node(id);
        self.graph[idx]
            .providers
            .extend(providers.into_iter().map(Into::into));
        idx
    }

    /// Insert or merge the `start -[predicate]-> end` edge.
    ///
    /// Missing endpoints are created and inherit the edge's providers.
    /// Attributes without any provider are ignored and yield `None`.
    pub fn add_edge(
        &mut self,
        start: &str,
        predicate: &str,
        end: &str,
        attrs: EdgeAttributes,
    ) -> Option<EdgeIndex> {
        if attrs.providers.is_empty() {
            return None;
        }
        let a = self.add_node(start, attrs.providers.iter().cloned());
        let b = self.add_node(end, attrs.providers.iter().cloned());

        let existing = self
            .graph
            .edges_connecting(a, b)
            .find(|e| e.weight().predicate == predicate)
            .map(|e| e.id());

        let edge = match existing {
            Some(edge) => {
                let weight = &mut self.graph[edge];
                weight.providers.extend(attrs.providers);
                weight.scores.extend(attrs.scores);
                edge
            }
            None => self.graph.add_edge(
                a,
                b,
                Transition {
                    predicate: predicate.to_string(),
                    providers: attrs.providers,
                    scores: attrs.scores,
                },
            ),
        };
        Some(edge)
    }

    pub fn has_node(&self, id: &str) -> bool {
        self.node_index.contains_key(id)
    }

    pub fn get_node(&self, id: &str) -> Option<&ConceptNode> {
        self.node_index.get(id).map(|&idx| &self.graph[idx])
    }

    /// Edge between `start` and `end`.
    ///
    /// With a predicate, only the edge carrying it matches. Without one, the
    /// earliest inserted edge between the pair is returned.
    pub fn get_edge(&self, start: &str, end: &str, predicate: Option<&str>) -> Option<&Transition> {
        self.edges_between(start, end)
            .into_iter()
            .find(|t| predicate.is_none_or(|p| t.predicate == p))
    }

    pub fn has_edge(&self, start: &str, end: &str) -> bool {
        self.get_edge(start, end, None).is_some()
    }

    /// All edges from `start` to `end`, in insertion order.
    pub fn edges_between(&self, start: &str, end: &str) -> Vec<&Transition> {
        let (Some(&a), Some(&b)) = (self.node_index.get(start), self.node_index.get(end)) else {
            return Vec::new();
        };
        let mut edges: Vec<_> = self.graph.edges_connecting(a, b).collect();
        edges.sort_by_key(|e| e.id());
        edges.into_iter().map(|e| e.weight()).collect()
    }

    pub fn nodes(&self) -> impl Iterator<Item = &ConceptNode> {
        self.graph.node_weights()
    }

    /// `(source id, target id, transition)` for every edge.
    pub fn edges(&self) -> impl Iterator<Item = (&str, &str, &Transition)> {
        self.graph.edge_references().map(|e| {
            (
                self.graph[e.source()].id.as_str(),
                self.graph[e.target()].id.as_str(),
                e.weight(),
            )
        })
    }

    pub fn node_count(&self) -> usize {
        self.graph.node_count()
    }

    pub fn edge_count(&self) -> usize {
        self.graph.edge_count()
    }

    pub fn is_empty(&self) -> bool {
        self.graph.node_count() == 0
    }

    /// Knowledge-graph message view of the whole graph.
    ///
    /// Nodes are `[id, {"providers": [...]}]`, edges are
    /// `[source, predicate, target, {"providers": [...], "scores": {...}}]`,
    /// both in insertion order.
    pub fn to_message(&self) -> Value {
        let nodes: Vec<_> = self
            .nodes()
            .map(|node| (node.id.as_str(), NodeData { providers: &node.providers }))
            .collect();
        let edges: Vec<_> = self
            .edges()
            .map(|(source, target, t)| {
                (
                    source,
                    t.predicate.as_str(),
                    target,
                    EdgeData {
                        providers: &t.providers,
                        scores: &t.scores,
                    },
                )
            })
            .collect();
        json!({
            "knowledge_graph": {
                "nodes": nodes,
                "edges": edges,
            },
            "knowledge_map": [{}],
            "options": {},
        })
    }

    pub fn clear(&mut self) {
        self.graph.clear();
        self.node_index.clear();
    }

    fn ensure_node(&mut self, id: &str) -> NodeIndex {
        if let Some(&idx) = self.node_index.get(id) {
            return idx;
        }
        let idx = self.graph.add_node(ConceptNode {
            id: id.to_string(),
            providers: BTreeSet::new(),
        });
        self.node_index.insert(id.to_string(), idx);
        idx
    }
}

#[derive(Serialize)]
struct NodeData<'a> {
    providers: &'a BTreeSet<String>,
}

#[derive(Serialize)]
struct EdgeData<'a> {
    providers: &'a BTreeSet<String>,
    scores: &'a BTreeMap<String, f64>,
}
