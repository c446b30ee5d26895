//! Query planning and transition validation over a federated schema snapshot.
//!
//! Both consumers are synchronous and read-only: take a snapshot from the
//! schema cache, then plan or validate against it as often as needed.
//!
//! ```ignore
//! let snapshot = cache.get_snapshot(false).await;
//! let resolver = BiolinkHierarchy::new();
//! let plan = QueryPlanner::new(&snapshot, &resolver).plan(&query)?;
//! EdgeValidator::new(&snapshot).validate_edge("gene", "disease")?;
//! ```

pub mod conversion;
pub mod planner;
pub mod validator;

pub use conversion::{BiolinkHierarchy, ROOT_CATEGORY, TypeConversionResolver};
pub use planner::{PlanMode, QueryPlanner};
pub use validator::{Categories, EdgeValidator, QueryEdge, QueryGraph, QueryNode};
