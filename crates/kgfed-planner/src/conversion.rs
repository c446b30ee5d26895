//! Implicit type conversion along the Biolink category hierarchy.

use std::collections::{HashMap, HashSet};

use kgfed_core::normalize_identifier;

/// Root of the category hierarchy.
pub const ROOT_CATEGORY: &str = "named_thing";

/// Yields broader types a concept may be reinterpreted as.
pub trait TypeConversionResolver: Send + Sync {
    /// Candidate conversion types for `concept_type`, most specific first.
    fn transitions_for(&self, concept_type: &str) -> Vec<String>;
}

/// `(child, parent)` is_a links of the Biolink category hierarchy.
const BIOLINK_IS_A: &[(&str, &str)] = &[
    ("biological_entity", ROOT_CATEGORY),
    ("information_content_entity", ROOT_CATEGORY),
    ("organism_taxon", ROOT_CATEGORY),
    ("publication", "information_content_entity"),
    ("molecular_entity", "biological_entity"),
    ("chemical_substance", "molecular_entity"),
    ("drug", "chemical_substance"),
    ("metabolite", "chemical_substance"),
    ("genomic_entity", "molecular_entity"),
    ("macromolecular_machine", "genomic_entity"),
    ("gene_or_gene_product", "macromolecular_machine"),
    ("gene", "gene_or_gene_product"),
    ("gene_product", "gene_or_gene_product"),
    ("protein", "gene_product"),
    ("rna_product", "gene_product"),
    ("sequence_variant", "genomic_entity"),
    ("gene_family", "molecular_entity"),
    ("disease_or_phenotypic_feature", "biological_entity"),
    ("disease", "disease_or_phenotypic_feature"),
    ("phenotypic_feature", "disease_or_phenotypic_feature"),
    ("organismal_entity", "biological_entity"),
    ("anatomical_entity", "organismal_entity"),
    ("cell", "anatomical_entity"),
    ("cellular_component", "anatomical_entity"),
    ("gross_anatomical_structure", "anatomical_entity"),
    ("biological_process_or_activity", "biological_entity"),
    ("biological_process", "biological_process_or_activity"),
    ("molecular_activity", "biological_process_or_activity"),
    ("pathway", "biological_process"),
    ("physiological_process", "biological_process"),
];

/// Resolver walking `is_a` links up to [`ROOT_CATEGORY`].
#[derive(Debug, Clone)]
pub struct BiolinkHierarchy {
    parents: HashMap<String, String>,
}

impl Default for BiolinkHierarchy {
    fn default() -> Self {
        Self::new()
    }
}

impl BiolinkHierarchy {
    /// The built-in category hierarchy.
    pub fn new() -> Self {
        Self {
            parents: BIOLINK_IS_A
                .iter()
                .map(|(child, parent)| (child.to_string(), parent.to_string()))
                .collect(),
        }
    }

    /// A hierarchy with no links at all.
    pub fn empty() -> Self {
        Self {
            parents: HashMap::new(),
        }
    }

    /// Add or replace the parent of `child`.
    pub fn with_parent(mut self, child: &str, parent: &str) -> Self {
        self.parents
            .insert(normalize_identifier(child), normalize_identifier(parent));
        self
    }

    pub fn parent_of(&self, concept_type: &str) -> Option<&str> {
        self.parents.get(concept_type).map(String::as_str)
    }
}

impl TypeConversionResolver for BiolinkHierarchy {
    fn transitions_for(&self, concept_type: &str) -> Vec<String> {
        let mut current = normalize_identifier(concept_type);
        let mut seen = HashSet::from([current.clone()]);
        let mut chain = Vec::new();

        while let Some(parent) = self.parents.get(&current) {
            // extra links may close a loop
            if !seen.insert(parent.clone()) {
                break;
            }
            chain.push(parent.clone());
            current = parent.clone();
        }
        chain
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_chain_is_most_specific_first() {
        let resolver = BiolinkHierarchy::new();
        assert_eq!(
            resolver.transitions_for("gene"),
            vec![
                "gene_or_gene_product",
                "macromolecular_machine",
                "genomic_entity",
                "molecular_entity",
                "biological_entity",
                "named_thing"
            ]
        );
        assert_eq!(
            resolver.transitions_for("biolink:Disease"),
            vec!["disease_or_phenotypic_feature", "biological_entity", "named_thing"]
        );
    }

    #[test]
    fn test_unknown_and_root_types_have_no_transitions() {
        let resolver = BiolinkHierarchy::new();
        assert!(resolver.transitions_for("spaceship").is_empty());
        assert!(resolver.transitions_for(ROOT_CATEGORY).is_empty());
    }

    #[test]
    fn test_extra_links() {
        let resolver = BiolinkHierarchy::empty()
            .with_parent("Spaceship", "Vehicle")
            .with_parent("vehicle", "spaceship");
        assert_eq!(resolver.parent_of("spaceship"), Some("vehicle"));
        assert_eq!(resolver.transitions_for("spaceship"), vec!["vehicle"]);
    }
}
