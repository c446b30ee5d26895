//! Core types shared by the kgfed schema federation crates.
//!
//! - [`normalize`]: canonical form of concept type and predicate names
//! - [`query`]: the ordered concept query handed to the planner
//! - [`plan`]: provider-bound execution plans produced by the planner
//! - [`error`]: fatal errors and non-fatal per-provider build errors

pub mod error;
pub mod normalize;
pub mod plan;
pub mod query;

pub use error::{BuildError, BuildErrorKind, FederationError, Result};
pub use normalize::{normalize_identifier, snake_case};
pub use plan::{Hop, IMPLICIT_CONVERSION, Plan, Segment};
pub use query::{Arrow, Concept, Direction, QuerySpec, QuerySpecBuilder};
