//! Provider-bound execution plans.
//!
//! A plan is consumed by the execution layer, which dispatches every segment
//! to its provider's access URL. On the wire a plan is a nested array:
//!
//! ```text
//! [[provider, url, [[source, source_type, predicate, direction, target, target_type], ...]], ...]
//! ```

use serde::{Deserialize, Serialize};

use crate::query::Direction;

/// Reserved provider id for synthesized type-conversion segments.
pub const IMPLICIT_CONVERSION: &str = "implicit_conversion";

#[derive(Serialize, Deserialize)]
struct HopRepr(String, String, Option<String>, Direction, String, String);

/// One transition between two query concepts, bound to a provider segment.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "HopRepr", into = "HopRepr")]
pub struct Hop {
    pub source_name: String,
    pub source_type: String,
    pub predicate: Option<String>,
    pub direction: Direction,
    pub target_name: String,
    pub target_type: String,
}

impl From<HopRepr> for Hop {
    fn from(r: HopRepr) -> Self {
        Self {
            source_name: r.0,
            source_type: r.1,
            predicate: r.2,
            direction: r.3,
            target_name: r.4,
            target_type: r.5,
        }
    }
}

impl From<Hop> for HopRepr {
    fn from(h: Hop) -> Self {
        HopRepr(
            h.source_name,
            h.source_type,
            h.predicate,
            h.direction,
            h.target_name,
            h.target_type,
        )
    }
}

#[derive(Serialize, Deserialize)]
struct SegmentRepr(String, String, Vec<Hop>);

/// A maximal run of consecutive hops served by one provider.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "SegmentRepr", into = "SegmentRepr")]
pub struct Segment {
    pub provider: String,
    pub access_url: String,
    pub hops: Vec<Hop>,
}

impl From<SegmentRepr> for Segment {
    fn from(r: SegmentRepr) -> Self {
        Self {
            provider: r.0,
            access_url: r.1,
            hops: r.2,
        }
    }
}

impl From<Segment> for SegmentRepr {
    fn from(s: Segment) -> Self {
        SegmentRepr(s.provider, s.access_url, s.hops)
    }
}

impl Segment {
    pub fn new(provider: impl Into<String>, access_url: impl Into<String>, first: Hop) -> Self {
        Self {
            provider: provider.into(),
            access_url: access_url.into(),
            hops: vec![first],
        }
    }

    pub fn is_conversion(&self) -> bool {
        self.provider == IMPLICIT_CONVERSION
    }
}

/// Ordered list of segments.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Plan {
    segments: Vec<Segment>,
}

impl Plan {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn segments(&self) -> &[Segment] {
        &self.segments
    }

    pub fn into_segments(self) -> Vec<Segment> {
        self.segments
    }

    pub fn len(&self) -> usize {
        self.segments.len()
    }

    pub fn is_empty(&self) -> bool {
        self.segments.is_empty()
    }

    /// Total number of hops across all segments.
    pub fn hop_count(&self) -> usize {
        self.segments.iter().map(|s| s.hops.len()).sum()
    }

    /// Append a hop served by `provider`.
    ///
    /// The hop joins the open segment when it belongs to the same provider,
    /// otherwise it opens a new one. Conversion segments never grow: every
    /// conversion hop gets its own segment.
    pub fn push_hop(&mut self, provider: &str, access_url: &str, hop: Hop) {
        if provider != IMPLICIT_CONVERSION
            && let Some(open) = self.segments.last_mut()
            && open.provider == provider
        {
            open.hops.push(hop);
            return;
        }
        self.segments.push(Segment::new(provider, access_url, hop));
    }
}
