//! Transition checks against the merged graph.
//!
//! Only direct provider schemas count here: a pair that the planner could
//! bridge with an implicit conversion is still reported invalid.

use indexmap::IndexMap;
use kgfed_core::{FederationError, Result, normalize_identifier};
use kgfed_schema::SchemaSnapshot;
use serde::Deserialize;
use serde_json::Value;
use tracing::debug;

/// One category or several.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(untagged)]
pub enum Categories {
    One(String),
    Many(Vec<String>),
}

impl Categories {
    pub fn as_slice(&self) -> &[String] {
        match self {
            Categories::One(category) => std::slice::from_ref(category),
            Categories::Many(categories) => categories,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct QueryNode {
    #[serde(default)]
    pub category: Option<Categories>,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct QueryEdge {
    pub subject: String,
    pub object: String,
}

/// The node/edge question graph of an incoming message.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct QueryGraph {
    #[serde(default)]
    pub nodes: IndexMap<String, QueryNode>,
    #[serde(default)]
    pub edges: IndexMap<String, QueryEdge>,
}

impl QueryGraph {
    /// Accepts either a bare query graph or a message wrapping one under `query_graph`.
    pub fn from_message(message: &Value) -> Result<Self> {
        let graph = message.get("query_graph").unwrap_or(message);
        serde_json::from_value(graph.clone())
            .map_err(|e| FederationError::invalid_query(format!("malformed query graph: {e}")))
    }
}

pub struct EdgeValidator<'a> {
    snapshot: &'a SchemaSnapshot,
}

impl<'a> EdgeValidator<'a> {
    pub fn new(snapshot: &'a SchemaSnapshot) -> Self {
        Self { snapshot }
    }

    /// Fails unless some provider connects `source_type` to `target_type`, under any predicate.
    pub fn validate_edge(&self, source_type: &str, target_type: &str) -> Result<()> {
        let source = normalize_identifier(source_type);
        let target = normalize_identifier(target_type);
        if self.snapshot.graph().has_edge(&source, &target) {
            Ok(())
        } else {
            Err(FederationError::invalid_transition(source, target))
        }
    }

    /// Validate every edge of a query graph; the first invalid edge is returned.
    ///
    /// With several categories on an endpoint, any connected combination
    /// makes the edge valid. An endpoint without a category is unconstrained.
    pub fn validate_query(&self, graph: &QueryGraph) -> Result<()> {
        for (edge_id, edge) in &graph.edges {
            let subject = self.endpoint(graph, edge_id, &edge.subject)?;
            let object = self.endpoint(graph, edge_id, &edge.object)?;
            let (Some(subject), Some(object)) = (subject, object) else {
                debug!(edge = %edge_id, "Unconstrained endpoint, skipping edge");
                continue;
            };

            let mut first_failure = None;
            let connected = subject.iter().any(|s| {
                object.iter().any(|o| match self.validate_edge(s, o) {
                    Ok(()) => true,
                    Err(e) => {
                        first_failure.get_or_insert(e);
                        false
                    }
                })
            });
            if !connected && let Some(err) = first_failure {
                return Err(err);
            }
        }
        Ok(())
    }

    /// Validate the query graph carried by a JSON message.
    pub fn validate_message(&self, message: &Value) -> Result<()> {
        self.validate_query(&QueryGraph::from_message(message)?)
    }

    fn endpoint<'g>(
        &self,
        graph: &'g QueryGraph,
        edge_id: &str,
        node_id: &str,
    ) -> Result<Option<&'g [String]>> {
        let node = graph.nodes.get(node_id).ok_or_else(|| FederationError::UnknownQueryNode {
            edge: edge_id.to_string(),
            node: node_id.to_string(),
        })?;
        Ok(node
            .category
            .as_ref()
            .map(Categories::as_slice)
            .filter(|categories| !categories.is_empty()))
    }
}
