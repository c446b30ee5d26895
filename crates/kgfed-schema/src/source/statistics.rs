//! Statistics-capable stores.
//!
//! A store supplies both a reachability schema and usage counts for its
//! edges; the counts turn into per-provider relevance scores on the merged
//! graph. Stores are registered on the schema builder by name and referenced
//! from configuration through `statistics_store`.

use async_trait::async_trait;
use serde_json::Value;

use crate::provider::EdgeCounts;

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("Statistics store error: {0}")]
pub struct StoreError(pub String);

impl StoreError {
    pub fn new(message: impl Into<String>) -> Self {
        Self(message.into())
    }
}

#[async_trait]
pub trait StatisticsStore: Send + Sync {
    /// Raw reachability document, in the same shape as a remote schema.
    async fn schema(&self) -> Result<Value, StoreError>;

    /// Usage counts keyed by `(source, target, predicate)`.
    async fn edge_counts(&self) -> Result<EdgeCounts, StoreError>;
}

/// In-memory store, for fixed deployments and tests.
#[derive(Debug, Clone, Default)]
pub struct StaticStatisticsStore {
    schema: Value,
    counts: EdgeCounts,
}

impl StaticStatisticsStore {
    pub fn new(schema: Value) -> Self {
        Self {
            schema,
            counts: EdgeCounts::new(),
        }
    }

    pub fn with_counts(mut self, counts: EdgeCounts) -> Self {
        self.counts = counts;
        self
    }

    pub fn with_count(mut self, source: &str, target: &str, predicate: &str, count: u64) -> Self {
        self.counts.insert(source, target, predicate, count);
        self
    }
}

#[async_trait]
impl StatisticsStore for StaticStatisticsStore {
    async fn schema(&self) -> Result<Value, StoreError> {
        Ok(self.schema.clone())
    }

    async fn edge_counts(&self) -> Result<EdgeCounts, StoreError> {
        Ok(self.counts.clone())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[tokio::test]
    async fn test_static_store() {
        let store = StaticStatisticsStore::new(json!({"gene": {"disease": "related_to"}}))
            .with_count("gene", "disease", "related_to", 10);

        assert_eq!(store.schema().await.unwrap()["gene"]["disease"], "related_to");
        let counts = store.edge_counts().await.unwrap();
        assert_eq!(counts.get("gene", "disease", "related_to"), Some(10));
    }
}
