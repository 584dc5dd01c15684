//! Canonical filter vocabulary and its per-provider translation
//!
//! The public API accepts provider-agnostic filters (`ethnicity=asian`,
//! `hair_color=blonde`...). Each provider names these differently, or not at
//! all. [`FILTER_MAP`] holds the translation table; pairs that have no entry
//! for a provider are dropped with a warning.

use crate::models::{Filters, ProviderKind};
use tracing::warn;

/// A provider query parameter produced by a canonical filter
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ProviderParam {
    pub name: &'static str,
    pub value: &'static str,
}

/// One `(key, value)` entry of the translation table
#[derive(Debug, Clone, Copy)]
pub struct FilterRule {
    pub key: &'static str,
    pub value: &'static str,
    pub awe: Option<ProviderParam>,
    pub vpapi: Option<ProviderParam>,
    pub free: Option<ProviderParam>,
}

impl FilterRule {
    pub fn param_for(&self, provider: ProviderKind) -> Option<ProviderParam> {
        match provider {
            ProviderKind::Awe => self.awe,
            ProviderKind::Vpapi => self.vpapi,
            ProviderKind::Free => self.free,
        }
    }
}

const fn p(name: &'static str, value: &'static str) -> Option<ProviderParam> {
    Some(ProviderParam { name, value })
}

/// Table de traduction des filtres canoniques
pub static FILTER_MAP: &[FilterRule] = &[
    // ethnicity
    FilterRule { key: "ethnicity", value: "asian", awe: p("ethnicity", "asian"), vpapi: p("tags", "asian"), free: p("tag", "asian") },
    FilterRule { key: "ethnicity", value: "ebony", awe: p("ethnicity", "ebony"), vpapi: p("tags", "ebony"), free: p("tag", "ebony") },
    FilterRule { key: "ethnicity", value: "latina", awe: p("ethnicity", "latin"), vpapi: p("tags", "latina"), free: p("tag", "latina") },
    FilterRule { key: "ethnicity", value: "white", awe: p("ethnicity", "white"), vpapi: p("tags", "caucasian"), free: p("tag", "white") },
    FilterRule { key: "ethnicity", value: "middle_eastern", awe: p("ethnicity", "middle_eastern"), vpapi: p("tags", "arab"), free: p("tag", "arab") },
    FilterRule { key: "ethnicity", value: "indian", awe: p("ethnicity", "indian"), vpapi: p("tags", "indian"), free: p("tag", "indian") },
    // hair_color
    FilterRule { key: "hair_color", value: "blonde", awe: p("hairColor", "blonde"), vpapi: p("tags", "blonde"), free: p("tag", "blonde") },
    FilterRule { key: "hair_color", value: "brown", awe: p("hairColor", "brown"), vpapi: p("tags", "brunette"), free: p("tag", "brunette") },
    FilterRule { key: "hair_color", value: "red", awe: p("hairColor", "red"), vpapi: p("tags", "redhead"), free: p("tag", "redhead") },
    FilterRule { key: "hair_color", value: "black", awe: p("hairColor", "black"), vpapi: None, free: None },
    // body_type
    FilterRule { key: "body_type", value: "petite", awe: p("bodyType", "petite"), vpapi: p("tags", "petite"), free: p("tag", "petite") },
    FilterRule { key: "body_type", value: "athletic", awe: p("bodyType", "athletic"), vpapi: None, free: p("tag", "fit") },
    FilterRule { key: "body_type", value: "curvy", awe: p("bodyType", "curvy"), vpapi: p("tags", "curvy"), free: p("tag", "curvy") },
    FilterRule { key: "body_type", value: "bbw", awe: p("bodyType", "bbw"), vpapi: p("tags", "bbw"), free: p("tag", "bbw") },
    // language
    FilterRule { key: "language", value: "en", awe: p("language", "en"), vpapi: None, free: None },
    FilterRule { key: "language", value: "es", awe: p("language", "es"), vpapi: None, free: None },
    FilterRule { key: "language", value: "fr", awe: p("language", "fr"), vpapi: None, free: None },
    FilterRule { key: "language", value: "de", awe: p("language", "de"), vpapi: None, free: None },
];

/// Finds the rule for a canonical pair; key and value are normalized first
pub fn lookup(key: &str, value: &str) -> Option<&'static FilterRule> {
    let key = key.trim().to_lowercase();
    let value = value.trim().to_lowercase();
    FILTER_MAP
        .iter()
        .find(|rule| rule.key == key && rule.value == value)
}

/// Translates canonical filters into the query parameters of `provider`
///
/// Unknown keys, unknown values and pairs the provider cannot express are
/// dropped and logged; this never fails.
pub fn map_filters_to_provider(filters: &Filters, provider: ProviderKind) -> Vec<(String, String)> {
    let mut params = Vec::with_capacity(filters.len());

    for (key, value) in filters {
        match lookup(key, value).and_then(|rule| rule.param_for(provider)) {
            Some(param) => params.push((param.name.to_string(), param.value.to_string())),
            None => warn!(
                %provider,
                "Dropping unmapped filter {}={}",
                key.trim(),
                value.trim()
            ),
        }
    }

    params
}

#[cfg(test)]
mod tests {
    use super::*;

    fn filters(pairs: &[(&str, &str)]) -> Filters {
        pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect()
    }

    #[test]
    fn test_awe_mapping() {
        let mapped = map_filters_to_provider(
            &filters(&[("ethnicity", "Latina"), ("hair_color", " blonde ")]),
            ProviderKind::Awe,
        );
        assert_eq!(
            mapped,
            vec![
                ("ethnicity".to_string(), "latin".to_string()),
                ("hairColor".to_string(), "blonde".to_string()),
            ]
        );
    }

    #[test]
    fn test_vpapi_mapping() {
        let mapped = map_filters_to_provider(&filters(&[("ethnicity", "white")]), ProviderKind::Vpapi);
        assert_eq!(mapped, vec![("tags".to_string(), "caucasian".to_string())]);
    }

    #[test]
    fn test_unmapped_pairs_are_dropped() {
        let mapped = map_filters_to_provider(
            &filters(&[("language", "fr"), ("shoe_size", "42"), ("ethnicity", "martian")]),
            ProviderKind::Free,
        );
        assert!(mapped.is_empty());
    }

    #[test]
    fn test_table_has_no_duplicates() {
        for (i, a) in FILTER_MAP.iter().enumerate() {
            for b in &FILTER_MAP[i + 1..] {
                assert!(!(a.key == b.key && a.value == b.value), "{}={}", a.key, a.value);
            }
        }
    }

    #[test]
    fn test_every_rule_maps_to_its_table_entry() {
        for rule in FILTER_MAP {
            assert!(rule.awe.is_some(), "{}={} has no AWE param", rule.key, rule.value);

            for provider in ProviderKind::ALL {
                let expected: Vec<(String, String)> = rule
                    .param_for(provider)
                    .map(|param| (param.name.to_string(), param.value.to_string()))
                    .into_iter()
                    .collect();

                for (key, value) in [
                    (rule.key.to_string(), rule.value.to_string()),
                    (rule.key.to_uppercase(), format!(" {} ", rule.value.to_uppercase())),
                ] {
                    let mapped =
                        map_filters_to_provider(&filters(&[(key.as_str(), value.as_str())]), provider);
                    assert_eq!(mapped, expected, "{provider}: {key}={value}");
                }
            }
        }
    }
}
