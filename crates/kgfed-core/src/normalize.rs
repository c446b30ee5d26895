//! Canonical naming for concept types and predicates.
//!
//! Providers publish names in several spellings (`biolink:ChemicalSubstance`,
//! `biolink.Gene`, `related_to`). Everything that enters a snapshot is
//! reduced to snake_case with the namespace prefix removed.

const NAMESPACE_PREFIXES: [&str; 2] = ["biolink:", "biolink."];

/// Strip the namespace prefix and snake_case the remainder.
pub fn normalize_identifier(raw: &str) -> String {
    snake_case(strip_namespace(raw.trim()))
}

fn strip_namespace(raw: &str) -> &str {
    for prefix in NAMESPACE_PREFIXES {
        if let Some(head) = raw.get(..prefix.len())
            && head.eq_ignore_ascii_case(prefix)
        {
            return &raw[prefix.len()..];
        }
    }
    raw
}

/// Convert `CamelCase`, `Title Case` and `kebab-case` names to `snake_case`.
///
/// Acronym runs stay together: `RNAProduct` becomes `rna_product`.
pub fn snake_case(raw: &str) -> String {
    let chars: Vec<char> = raw.trim().chars().collect();
    let mut out = String::with_capacity(chars.len() + 4);

    for (i, &c) in chars.iter().enumerate() {
        if c.is_uppercase() {
            if i > 0 {
                let prev = chars[i - 1];
                let next_is_lower = chars.get(i + 1).is_some_and(|n| n.is_lowercase());
                let boundary = prev.is_lowercase()
                    || prev.is_ascii_digit()
                    || (prev.is_uppercase() && next_is_lower);
                if boundary && !out.ends_with('_') {
                    out.push('_');
                }
            }
            out.extend(c.to_lowercase());
        } else if c == ' ' || c == '-' || c == '_' {
            if !out.is_empty() && !out.ends_with('_') {
                out.push('_');
            }
        } else {
            out.push(c);
        }
    }

    while out.ends_with('_') {
        out.pop();
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_snake_case() {
        assert_eq!(snake_case("ChemicalSubstance"), "chemical_substance");
        assert_eq!(snake_case("gene"), "gene");
        assert_eq!(snake_case("RNAProduct"), "rna_product");
        assert_eq!(snake_case("Has Phenotype"), "has_phenotype");
        assert_eq!(snake_case("gene-to-disease"), "gene_to_disease");
        assert_eq!(snake_case("related_to"), "related_to");
        assert_eq!(snake_case("already__snake_"), "already_snake");
    }

    #[test]
    fn test_normalize_strips_namespace() {
        assert_eq!(normalize_identifier("biolink:Gene"), "gene");
        assert_eq!(normalize_identifier("biolink.ChemicalSubstance"), "chemical_substance");
        assert_eq!(normalize_identifier("Biolink:related_to"), "related_to");
        assert_eq!(normalize_identifier("  disease "), "disease");
    }

    #[test]
    fn test_normalize_is_idempotent() {
        for raw in ["biolink:PhenotypicFeature", "gene_product", "Disease"] {
            let once = normalize_identifier(raw);
            assert_eq!(normalize_identifier(&once), once);
        }
    }
}
