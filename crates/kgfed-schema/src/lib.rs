//! Federated schema construction and caching.
//!
//! Provider schemas are loaded from their [`source`]s, merged into a
//! [`GraphStore`] by the [`SchemaBuilder`], and published as immutable
//! [`SchemaSnapshot`]s through the [`SchemaCache`].

pub mod builder;
pub mod cache;
pub mod graph;
pub mod provider;
pub mod snapshot;
pub mod source;

pub use builder::SchemaBuilder;
pub use cache::SchemaCache;
pub use graph::{ConceptNode, EdgeAttributes, GraphStore, Transition};
pub use provider::{EdgeCounts, ProviderSchema, Reachability};
pub use snapshot::{SchemaSnapshot, SnapshotSummary};
pub use source::http::HttpFetcher;
pub use source::registry::{RegistryKind, RegistrySource};
pub use source::statistics::{StaticStatisticsStore, StatisticsStore, StoreError};
pub use source::{LoadOutcome, SchemaSource, SourceFactory, StoreRegistry};
