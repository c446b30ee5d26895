//! Per-provider schema layers and the raw reachability document format.
//!
//! A raw document maps source type → target type → predicate (or a list of
//! predicates):
//!
//! ```json
//! {"gene": {"disease": "related_to", "chemical_substance": ["interacts_with"]}}
//! ```

use std::collections::BTreeMap;

use kgfed_core::{BuildError, normalize_identifier};
use serde::{Serialize, Serializer};
use serde_json::Value;

/// source type → target type → predicates, all normalized.
pub type Reachability = BTreeMap<String, BTreeMap<String, Vec<String>>>;

/// Edge usage counts keyed by normalized `(source, target, predicate)`.
///
/// Serializes as a list of `{source, target, predicate, count}` records.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct EdgeCounts {
    counts: BTreeMap<(String, String, String), u64>,
}

impl EdgeCounts {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record a count. Names are normalized; repeated keys accumulate.
    pub fn insert(&mut self, source: &str, target: &str, predicate: &str, count: u64) {
        let key = (
            normalize_identifier(source),
            normalize_identifier(target),
            normalize_identifier(predicate),
        );
        *self.counts.entry(key).or_default() += count;
    }

    pub fn with(mut self, source: &str, target: &str, predicate: &str, count: u64) -> Self {
        self.insert(source, target, predicate, count);
        self
    }

    pub fn get(&self, source: &str, target: &str, predicate: &str) -> Option<u64> {
        self.counts
            .get(&(source.to_string(), target.to_string(), predicate.to_string()))
            .copied()
    }

    /// Sum of counts over every predicate between `source` and `target`.
    pub fn total(&self, source: &str, target: &str) -> u64 {
        self.counts
            .iter()
            .filter(|((s, t, _), _)| s == source && t == target)
            .map(|(_, count)| count)
            .sum()
    }

    /// Relevance of one predicate among all predicates between the pair.
    pub fn relevance(&self, source: &str, target: &str, predicate: &str) -> Option<f64> {
        let count = self.get(source, target, predicate)?;
        let total = self.total(source, target);
        (total > 0).then(|| count as f64 / total as f64)
    }

    pub fn is_empty(&self) -> bool {
        self.counts.is_empty()
    }
}

#[derive(Serialize)]
struct CountRecord<'a> {
    source: &'a str,
    target: &'a str,
    predicate: &'a str,
    count: u64,
}

impl Serialize for EdgeCounts {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_seq(self.counts.iter().map(|((source, target, predicate), count)| {
            CountRecord {
                source,
                target,
                predicate,
                count: *count,
            }
        }))
    }
}

/// One provider's contribution to a snapshot.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ProviderSchema {
    pub id: String,
    /// Access URL handed to the execution layer.
    pub url: String,
    pub reachability: Reachability,
    pub statistics: Option<EdgeCounts>,
}

impl ProviderSchema {
    pub fn new(id: impl Into<String>, url: impl Into<String>, reachability: Reachability) -> Self {
        Self {
            id: id.into(),
            url: url.into(),
            reachability,
            statistics: None,
        }
    }

    /// Parse a raw reachability document.
    ///
    /// A document that is not an object, or that carries an error `message`,
    /// is rejected outright. Individual malformed entries are skipped and
    /// returned alongside the parsed layer.
    pub fn parse(
        id: impl Into<String>,
        url: impl Into<String>,
        document: &Value,
    ) -> Result<(Self, Vec<BuildError>), BuildError> {
        let id = id.into();
        let Some(entries) = document.as_object() else {
            return Err(BuildError::malformed(&id, "schema document is not a JSON object"));
        };
        if let Some(message) = entries.get("message") {
            let message = message
                .as_str()
                .map(str::to_string)
                .unwrap_or_else(|| message.to_string());
            return Err(BuildError::malformed(
                &id,
                format!("provider reported an error: {message}"),
            ));
        }

        let mut reachability = Reachability::new();
        let mut issues = Vec::new();

        for (raw_source, targets) in entries {
            let source = normalize_identifier(raw_source);
            if source.is_empty() {
                issues.push(BuildError::malformed(&id, format!("empty source type '{raw_source}'")));
                continue;
            }
            let Some(targets) = targets.as_object() else {
                issues.push(BuildError::malformed(
                    &id,
                    format!("targets of '{raw_source}' are not an object"),
                ));
                continue;
            };

            for (raw_target, predicates) in targets {
                let target = normalize_identifier(raw_target);
                if target.is_empty() {
                    issues.push(BuildError::malformed(
                        &id,
                        format!("empty target type under '{raw_source}'"),
                    ));
                    continue;
                }
                let Some(predicates) = parse_predicates(predicates) else {
                    issues.push(BuildError::malformed(
                        &id,
                        format!("predicate for {raw_source} -> {raw_target} is not a string or list of strings"),
                    ));
                    continue;
                };
                let slot = reachability
                    .entry(source.clone())
                    .or_default()
                    .entry(target)
                    .or_default();
                for predicate in predicates {
                    if !slot.contains(&predicate) {
                        slot.push(predicate);
                    }
                }
            }
        }

        Ok((Self::new(id, url, reachability), issues))
    }

    pub fn with_statistics(mut self, statistics: EdgeCounts) -> Self {
        self.statistics = Some(statistics);
        self
    }

    /// Predicates this provider offers from `source` to `target`.
    pub fn predicates(&self, source: &str, target: &str) -> &[String] {
        self.reachability
            .get(source)
            .and_then(|targets| targets.get(target))
            .map(Vec::as_slice)
            .unwrap_or_default()
    }

    /// Whether the provider has a non-empty `source → target` entry.
    pub fn offers(&self, source: &str, target: &str) -> bool {
        !self.predicates(source, target).is_empty()
    }

    /// Number of `(source, target, predicate)` triples.
    pub fn transition_count(&self) -> usize {
        self.reachability
            .values()
            .flat_map(|targets| targets.values())
            .map(Vec::len)
            .sum()
    }
}

/// Normalized, de-duplicated predicates; `None` when the value has the wrong shape.
fn parse_predicates(value: &Value) -> Option<Vec<String>> {
    let raw: Vec<&str> = match value {
        Value::String(s) => vec![s.as_str()],
        Value::Array(items) => items.iter().map(Value::as_str).collect::<Option<_>>()?,
        _ => return None,
    };

    let mut out: Vec<String> = Vec::with_capacity(raw.len());
    for predicate in raw.into_iter().map(normalize_identifier) {
        if !predicate.is_empty() && !out.contains(&predicate) {
            out.push(predicate);
        }
    }
    Some(out)
}

#[cfg(test)]
mod tests {
    use super::*;
    use kgfed_core::BuildErrorKind;
    use serde_json::json;

    #[test]
    fn test_parse_normalizes_and_dedups() {
        let doc = json!({
            "biolink:Gene": {
                "Disease": ["related_to", "biolink:related_to", "RelatedTo"],
                "ChemicalSubstance": "interacts_with"
            }
        });
        let (schema, issues) = ProviderSchema::parse("kp1", "/kp1", &doc).unwrap();

        assert!(issues.is_empty());
        assert_eq!(schema.predicates("gene", "disease"), ["related_to"]);
        assert_eq!(
            schema.predicates("gene", "chemical_substance"),
            ["interacts_with"]
        );
        assert!(schema.offers("gene", "disease"));
        assert!(!schema.offers("disease", "gene"));
        assert_eq!(schema.transition_count(), 2);
    }

    #[test]
    fn test_malformed_entries_are_skipped() {
        let doc = json!({
            "gene": {"disease": "related_to", "protein": 42},
            "disease": ["not", "an", "object"]
        });
        let (schema, issues) = ProviderSchema::parse("kp1", "/kp1", &doc).unwrap();

        assert_eq!(schema.transition_count(), 1);
        assert_eq!(issues.len(), 2);
        assert!(issues.iter().all(|e| e.kind() == BuildErrorKind::MalformedSchema));
        assert!(issues.iter().all(|e| e.provider() == "kp1"));
    }

    #[test]
    fn test_error_document_rejected() {
        let err = ProviderSchema::parse("rtx", "/rtx", &json!({"message": "internal error"}))
            .unwrap_err();
        assert_eq!(err.kind(), BuildErrorKind::MalformedSchema);
        assert!(err.to_string().contains("internal error"));

        let err = ProviderSchema::parse("rtx", "/rtx", &json!(["gene"])).unwrap_err();
        assert!(err.to_string().contains("not a JSON object"));
    }

    #[test]
    fn test_empty_predicate_list_is_not_an_offer() {
        let (schema, issues) =
            ProviderSchema::parse("kp1", "/kp1", &json!({"gene": {"disease": []}})).unwrap();
        assert!(issues.is_empty());
        assert!(!schema.offers("gene", "disease"));
    }

    #[test]
    fn test_relevance() {
        let counts = EdgeCounts::new()
            .with("Gene", "Disease", "related_to", 3)
            .with("gene", "disease", "causes", 1);

        assert_eq!(counts.total("gene", "disease"), 4);
        assert_eq!(counts.relevance("gene", "disease", "related_to"), Some(0.75));
        assert_eq!(counts.relevance("gene", "disease", "treats"), None);
        assert_eq!(counts.relevance("gene", "protein", "related_to"), None);
    }

    #[test]
    fn test_provider_with_statistics_serializes() {
        let (schema, _) =
            ProviderSchema::parse("redis", "/redis", &json!({"gene": {"disease": "related_to"}}))
                .unwrap();
        let schema = schema.with_statistics(
            EdgeCounts::new()
                .with("gene", "disease", "related_to", 3)
                .with("Gene", "Disease", "causes", 1),
        );

        let value = serde_json::to_value(&schema).unwrap();
        assert_eq!(value["reachability"], json!({"gene": {"disease": ["related_to"]}}));
        assert_eq!(
            value["statistics"],
            json!([
                {"source": "gene", "target": "disease", "predicate": "causes", "count": 1},
                {"source": "gene", "target": "disease", "predicate": "related_to", "count": 3}
            ])
        );
    }
}
