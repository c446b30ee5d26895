//! Rule-based query planning over a published snapshot.
//!
//! The planner walks the query left to right, one pair of consecutive
//! concepts at a time, and binds each transition to providers:
//!
//! 1. every provider (in configuration order) with a direct
//!    `source → target` entry contributes a hop;
//! 2. failing that, the source type is reinterpreted as the first broader
//!    type some provider can take to the target, which yields a conversion
//!    segment followed by that provider's segment;
//! 3. failing that, the pair is skipped ([`PlanMode::BestEffort`]) or the
//!    whole plan fails ([`PlanMode::Strict`]).
//!
//! There is no ranking and no backtracking.

use kgfed_core::{
    Arrow, Concept, FederationError, Hop, IMPLICIT_CONVERSION, Plan, QuerySpec, Result,
    normalize_identifier,
};
use kgfed_schema::SchemaSnapshot;
use tracing::debug;

use crate::conversion::TypeConversionResolver;

/// What to do with a transition no provider or conversion can serve.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum PlanMode {
    /// Leave the transition out of the plan.
    #[default]
    BestEffort,
    /// Fail with [`FederationError::UnplannableHop`].
    Strict,
}

pub struct QueryPlanner<'a> {
    snapshot: &'a SchemaSnapshot,
    resolver: &'a dyn TypeConversionResolver,
    mode: PlanMode,
}

impl<'a> QueryPlanner<'a> {
    pub fn new(snapshot: &'a SchemaSnapshot, resolver: &'a dyn TypeConversionResolver) -> Self {
        Self {
            snapshot,
            resolver,
            mode: PlanMode::default(),
        }
    }

    pub fn with_mode(mut self, mode: PlanMode) -> Self {
        self.mode = mode;
        self
    }

    pub fn mode(&self) -> PlanMode {
        self.mode
    }

    pub fn plan(&self, query: &QuerySpec) -> Result<Plan> {
        let mut plan = Plan::new();
        for (source, arrow, target) in query.transitions() {
            self.plan_transition(&mut plan, source, arrow, target)?;
        }
        debug!(
            segments = plan.len(),
            hops = plan.hop_count(),
            "Planned query"
        );
        Ok(plan)
    }

    fn plan_transition(
        &self,
        plan: &mut Plan,
        source: &Concept,
        arrow: &Arrow,
        target: &Concept,
    ) -> Result<()> {
        let source_type = normalize_identifier(&source.concept_type);
        let target_type = normalize_identifier(&target.concept_type);
        let direct: Vec<_> = self
            .snapshot
            .providers()
            .values()
            .filter(|p| p.offers(&source_type, &target_type))
            .collect();
        if !direct.is_empty() {
            for provider in direct {
                debug!(
                    provider = %provider.id,
                    source = %source_type,
                    target = %target_type,
                    "Direct transition"
                );
                plan.push_hop(
                    &provider.id,
                    &provider.url,
                    hop(arrow, (&source.name, &source_type), (&target.name, &target_type)),
                );
            }
            return Ok(());
        }

        for conversion in self.resolver.transitions_for(&source_type) {
            let Some(provider) = self
                .snapshot
                .providers()
                .values()
                .find(|p| p.offers(&conversion, &target_type))
            else {
                continue;
            };
            debug!(
                provider = %provider.id,
                source = %source_type,
                conversion = %conversion,
                target = %target_type,
                "Implicit conversion"
            );
            let conversion_url = self.snapshot.conversion_url().unwrap_or_default();
            plan.push_hop(
                IMPLICIT_CONVERSION,
                conversion_url,
                hop(arrow, (&source.name, &source_type), (&conversion, &conversion)),
            );
            plan.push_hop(
                &provider.id,
                &provider.url,
                hop(arrow, (&conversion, &conversion), (&target.name, &target_type)),
            );
            return Ok(());
        }

        match self.mode {
            PlanMode::Strict => Err(FederationError::unplannable_hop(source_type, target_type)),
            PlanMode::BestEffort => {
                debug!(
                    source = %source_type,
                    target = %target_type,
                    "No provider or conversion, skipping transition"
                );
                Ok(())
            }
        }
    }
}

/// Hop between two `(name, type)` endpoints carrying the arrow's constraint.
fn hop(arrow: &Arrow, from: (&String, &String), to: (&String, &String)) -> Hop {
    Hop {
        source_name: from.0.clone(),
        source_type: from.1.clone(),
        predicate: arrow.predicate.clone(),
        direction: arrow.direction,
        target_name: to.0.clone(),
        target_type: to.1.clone(),
    }
}
