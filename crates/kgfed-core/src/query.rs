//! Ordered concept queries as produced by the query-language front end.

use std::collections::HashSet;
use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::{FederationError, Result};

/// Direction of an arrow between two consecutive concepts.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Direction {
    #[default]
    Forward,
    Backward,
}

impl fmt::Display for Direction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Direction::Forward => write!(f, "forward"),
            Direction::Backward => write!(f, "backward"),
        }
    }
}

impl FromStr for Direction {
    type Err = FederationError;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "forward" | "->" => Ok(Direction::Forward),
            "backward" | "<-" => Ok(Direction::Backward),
            other => Err(FederationError::invalid_query(format!(
                "unknown arrow direction '{other}'"
            ))),
        }
    }
}

/// A named, typed concept in a query (`g:gene`).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Concept {
    pub name: String,
    #[serde(rename = "type")]
    pub concept_type: String,
}

impl Concept {
    pub fn new(name: impl Into<String>, concept_type: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            concept_type: concept_type.into(),
        }
    }
}

/// Arrow connecting concept `i` to concept `i + 1`.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct Arrow {
    #[serde(default)]
    pub predicate: Option<String>,
    #[serde(default)]
    pub direction: Direction,
}

impl Arrow {
    pub fn new(predicate: Option<&str>, direction: Direction) -> Self {
        Self {
            predicate: predicate.map(str::to_string),
            direction,
        }
    }

    pub fn forward(predicate: Option<&str>) -> Self {
        Self::new(predicate, Direction::Forward)
    }

    pub fn backward(predicate: Option<&str>) -> Self {
        Self::new(predicate, Direction::Backward)
    }
}

/// An ordered chain of concepts joined by arrows.
///
/// Invariant: `arrows.len() == concepts.len() - 1` (zero for an empty query)
/// and concept names are unique.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct QuerySpec {
    concepts: Vec<Concept>,
    arrows: Vec<Arrow>,
}

impl QuerySpec {
    pub fn new(concepts: Vec<Concept>, arrows: Vec<Arrow>) -> Result<Self> {
        let expected = concepts.len().saturating_sub(1);
        if arrows.len() != expected {
            return Err(FederationError::invalid_query(format!(
                "{} concepts require {expected} arrows, got {}",
                concepts.len(),
                arrows.len()
            )));
        }

        let mut seen = HashSet::new();
        for concept in &concepts {
            if concept.name.is_empty() {
                return Err(FederationError::invalid_query("concept name must not be empty"));
            }
            if !seen.insert(concept.name.as_str()) {
                return Err(FederationError::invalid_query(format!(
                    "duplicate concept name '{}'",
                    concept.name
                )));
            }
        }

        Ok(Self { concepts, arrows })
    }

    pub fn builder() -> QuerySpecBuilder {
        QuerySpecBuilder::default()
    }

    pub fn concepts(&self) -> &[Concept] {
        &self.concepts
    }

    pub fn arrows(&self) -> &[Arrow] {
        &self.arrows
    }

    pub fn len(&self) -> usize {
        self.concepts.len()
    }

    pub fn is_empty(&self) -> bool {
        self.concepts.is_empty()
    }

    /// Consecutive `(source, arrow, target)` triples in query order.
    pub fn transitions(&self) -> impl Iterator<Item = (&Concept, &Arrow, &Concept)> {
        self.concepts
            .windows(2)
            .zip(&self.arrows)
            .map(|(pair, arrow)| (&pair[0], arrow, &pair[1]))
    }
}

/// Incremental construction of a [`QuerySpec`].
#[derive(Debug, Default)]
pub struct QuerySpecBuilder {
    concepts: Vec<Concept>,
    arrows: Vec<Arrow>,
}

impl QuerySpecBuilder {
    pub fn concept(mut self, name: impl Into<String>, concept_type: impl Into<String>) -> Self {
        self.concepts.push(Concept::new(name, concept_type));
        self
    }

    pub fn arrow(mut self, predicate: Option<&str>, direction: Direction) -> Self {
        self.arrows.push(Arrow::new(predicate, direction));
        self
    }

    pub fn forward(self, predicate: Option<&str>) -> Self {
        self.arrow(predicate, Direction::Forward)
    }

    pub fn backward(self, predicate: Option<&str>) -> Self {
        self.arrow(predicate, Direction::Backward)
    }

    pub fn build(self) -> Result<QuerySpec> {
        QuerySpec::new(self.concepts, self.arrows)
    }
}
