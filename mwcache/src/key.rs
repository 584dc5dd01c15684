//! Canonical cache keys and TTL tiers

use serde_json::{Map, Value};
use std::collections::BTreeMap;
use std::fmt;
use std::time::Duration;

/// A cache key: a namespace plus named fields
///
/// Fields are kept sorted, so two keys built from the same fields in any
/// order render to the same string: `models:{"category":"girls","limit":"24"}`.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct CacheKey {
    namespace: String,
    fields: BTreeMap<String, String>,
}

impl CacheKey {
    pub fn new(namespace: impl Into<String>) -> Self {
        Self {
            namespace: namespace.into(),
            fields: BTreeMap::new(),
        }
    }

    pub fn field(mut self, name: impl Into<String>, value: impl ToString) -> Self {
        self.fields.insert(name.into(), value.to_string());
        self
    }

    /// Adds the field only when `value` is present
    pub fn opt_field(self, name: impl Into<String>, value: Option<impl ToString>) -> Self {
        match value {
            Some(value) => self.field(name, value),
            None => self,
        }
    }

    /// Adds several fields at once (filters, typically)
    pub fn fields<K, V>(mut self, fields: impl IntoIterator<Item = (K, V)>) -> Self
    where
        K: Into<String>,
        V: ToString,
    {
        for (name, value) in fields {
            self.fields.insert(name.into(), value.to_string());
        }
        self
    }

    pub fn namespace(&self) -> &str {
        &self.namespace
    }

    /// The rendered key: namespace, a colon, then the fields as sorted JSON
    pub fn render(&self) -> String {
        let map: Map<String, Value> = self
            .fields
            .iter()
            .map(|(k, v)| (k.clone(), Value::String(v.clone())))
            .collect();
        format!("{}:{}", self.namespace, Value::Object(map))
    }
}

impl fmt::Display for CacheKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.render())
    }
}

/// TTL classes
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CacheTier {
    /// Free-cam listings, which churn fast
    Free,
    /// Premium model and video listings
    Premium,
    /// Category trees
    Taxonomy,
}

impl CacheTier {
    pub const FREE_TTL_SECS: u64 = 120;
    pub const PREMIUM_TTL_SECS: u64 = 180;
    pub const TAXONOMY_TTL_SECS: u64 = 300;

    pub fn ttl(&self) -> Duration {
        Duration::from_secs(match self {
            CacheTier::Free => Self::FREE_TTL_SECS,
            CacheTier::Premium => Self::PREMIUM_TTL_SECS,
            CacheTier::Taxonomy => Self::TAXONOMY_TTL_SECS,
        })
    }
}
