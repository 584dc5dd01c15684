//! Structures de données partagées par les trois fournisseurs
//!
//! Every adapter maps its own payload into [`ModelListing`] / [`VideoListing`],
//! so the orchestrator and the HTTP layer only ever see these shapes.

use crate::pagination::Pagination;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;
use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

/// Canonical filters: provider-agnostic key → value
///
/// A `BTreeMap` so that iteration (and therefore cache fingerprints) is
/// always in key order.
pub type Filters = BTreeMap<String, String>;

/// Upstream affiliate source
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
#[serde(rename_all = "UPPERCASE")]
pub enum ProviderKind {
    /// Premium model feed
    Awe,
    /// Premium video feed
    Vpapi,
    /// Free-cam feed
    Free,
}

impl ProviderKind {
    pub const ALL: [ProviderKind; 3] = [ProviderKind::Awe, ProviderKind::Vpapi, ProviderKind::Free];

    /// Lower-case tag used in query strings and configuration paths
    pub fn as_str(&self) -> &'static str {
        match self {
            ProviderKind::Awe => "awe",
            ProviderKind::Vpapi => "vpapi",
            ProviderKind::Free => "free",
        }
    }

    /// Upper-case label used in payloads and logs
    pub fn label(&self) -> &'static str {
        match self {
            ProviderKind::Awe => "AWE",
            ProviderKind::Vpapi => "VPAPI",
            ProviderKind::Free => "FREE",
        }
    }

    /// Premium feeds churn less than the free one and are cached longer
    pub fn is_premium(&self) -> bool {
        !matches!(self, ProviderKind::Free)
    }
}

impl fmt::Display for ProviderKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// Error returned when parsing an unknown provider tag
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown provider '{0}' (expected awe, vpapi or free)")]
pub struct UnknownProvider(pub String);

impl FromStr for ProviderKind {
    type Err = UnknownProvider;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "awe" => Ok(ProviderKind::Awe),
            "vpapi" => Ok(ProviderKind::Vpapi),
            "free" => Ok(ProviderKind::Free),
            other => Err(UnknownProvider(other.to_string())),
        }
    }
}

/// A webcam model, normalized across providers
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
#[serde(rename_all = "camelCase")]
pub struct ModelListing {
    pub id: String,
    pub slug: String,
    pub name: String,
    #[serde(default)]
    pub thumbnail: Option<String>,
    #[serde(default)]
    pub preview_image: Option<String>,
    #[serde(default)]
    pub age: Option<u32>,
    #[serde(default)]
    pub ethnicity: Option<String>,
    #[serde(default)]
    pub body_type: Option<String>,
    #[serde(default)]
    pub tags: Vec<String>,
    pub is_online: bool,
    #[serde(default)]
    pub viewer_count: u64,
    pub provider: ProviderKind,
}

impl ModelListing {
    /// Creates a bare offline listing; the slug is derived from the name
    pub fn new(id: impl Into<String>, name: impl Into<String>, provider: ProviderKind) -> Self {
        let name = name.into();
        Self {
            id: id.into(),
            slug: slugify(&name),
            name,
            thumbnail: None,
            preview_image: None,
            age: None,
            ethnicity: None,
            body_type: None,
            tags: Vec::new(),
            is_online: false,
            viewer_count: 0,
            provider,
        }
    }
}

/// A promotional video from the premium video feed
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
#[serde(rename_all = "camelCase")]
pub struct VideoListing {
    pub id: String,
    pub title: String,
    #[serde(default)]
    pub thumbnail: Option<String>,
    #[serde(default)]
    pub preview_images: Vec<String>,
    /// Durée en secondes
    #[serde(default)]
    pub duration: u32,
    #[serde(default)]
    pub tags: Vec<String>,
    #[serde(default)]
    pub performer_name: Option<String>,
    #[serde(default)]
    pub quality: Option<String>,
    #[serde(default)]
    pub target_url: Option<String>,
    pub provider: ProviderKind,
}

/// One page of models
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
pub struct ModelPage {
    pub items: Vec<ModelListing>,
    pub pagination: Pagination,
}

/// One page of videos
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
pub struct VideoPage {
    pub items: Vec<VideoListing>,
    pub pagination: Pagination,
}

/// A browsing category and the providers able to serve it
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
pub struct Category {
    pub slug: String,
    pub name: String,
    #[serde(default)]
    pub providers: Vec<ProviderKind>,
    #[serde(default)]
    pub subcategories: Vec<Subcategory>,
}

/// Second-level entry of a [`Category`]
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
pub struct Subcategory {
    pub slug: String,
    pub name: String,
    #[serde(default)]
    pub providers: Vec<ProviderKind>,
}

impl Category {
    /// Builds a category from a static `(slug, name)` subcategory table
    pub fn from_table(
        slug: &str,
        name: &str,
        subcategories: &[(&str, &str)],
        provider: ProviderKind,
    ) -> Self {
        Self {
            slug: slug.to_string(),
            name: name.to_string(),
            providers: vec![provider],
            subcategories: subcategories
                .iter()
                .map(|(slug, name)| Subcategory {
                    slug: slug.to_string(),
                    name: name.to_string(),
                    providers: vec![provider],
                })
                .collect(),
        }
    }
}

/// Canonical listing request handed to an adapter
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ModelRequest {
    pub category: Option<String>,
    pub subcategory: Option<String>,
    pub limit: u32,
    pub offset: u32,
    pub filters: Filters,
}

impl ModelRequest {
    pub fn new(limit: u32, offset: u32) -> Self {
        Self {
            limit,
            offset,
            ..Default::default()
        }
    }

    pub fn with_category(mut self, category: impl Into<String>) -> Self {
        self.category = Some(category.into());
        self
    }

    pub fn with_subcategory(mut self, subcategory: impl Into<String>) -> Self {
        self.subcategory = Some(subcategory.into());
        self
    }

    pub fn with_filter(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.filters.insert(key.into(), value.into());
        self
    }

    /// Category, lower-cased, or `default` when absent or blank
    pub fn category_or<'a>(&'a self, default: &'a str) -> String {
        self.category
            .as_deref()
            .map(str::trim)
            .filter(|c| !c.is_empty())
            .unwrap_or(default)
            .to_lowercase()
    }

    /// Subcategory, lower-cased, when present and not blank
    pub fn subcategory(&self) -> Option<String> {
        self.subcategory
            .as_deref()
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .map(str::to_lowercase)
    }

    /// 1-based page index for providers paginating by page
    pub fn page_index(&self) -> u32 {
        crate::pagination::page_number(self.limit, self.offset)
    }
}

/// Turns a display name into a URL slug (`"Miss Jade 23"` → `"miss-jade-23"`)
pub fn slugify(name: &str) -> String {
    let mut slug = String::with_capacity(name.len());
    let mut pending_dash = false;
    for c in name.chars().flat_map(char::to_lowercase) {
        if c.is_alphanumeric() {
            if pending_dash && !slug.is_empty() {
                slug.push('-');
            }
            pending_dash = false;
            slug.push(c);
        } else {
            pending_dash = true;
        }
    }
    slug
}

/// Désérialiseur flexible pour les IDs qui peuvent être des strings ou des integers
pub(crate) fn deserialize_id<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    use serde::de::Error;

    match Value::deserialize(deserializer)? {
        Value::String(s) => Ok(s),
        Value::Number(n) => Ok(n.to_string()),
        _ => Err(Error::custom("ID must be a string or number")),
    }
}

/// Accepts a number, a numeric string, or null
pub(crate) fn deserialize_opt_u64<'de, D>(deserializer: D) -> Result<Option<u64>, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(match Value::deserialize(deserializer)? {
        Value::Number(n) => n.as_u64().or_else(|| n.as_f64().map(|f| f.max(0.0) as u64)),
        Value::String(s) => s.trim().parse().ok(),
        _ => None,
    })
}

/// Decodes raw upstream items one by one, skipping the malformed ones
pub(crate) fn parse_items<T: DeserializeOwned>(raw: Vec<Value>, provider: ProviderKind) -> Vec<T> {
    let total = raw.len();
    let items: Vec<T> = raw
        .into_iter()
        .filter_map(|value| match serde_json::from_value(value) {
            Ok(item) => Some(item),
            Err(e) => {
                tracing::debug!(%provider, "Skipping malformed item: {}", e);
                None
            }
        })
        .collect();

    if items.len() < total {
        tracing::warn!(
            %provider,
            "Skipped {} malformed item(s) out of {}",
            total - items.len(),
            total
        );
    }
    items
}
