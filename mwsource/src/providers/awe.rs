//! Premium model feed (AWE)
//!
//! `GET {base}/model/feed?siteId=..&psId=..&accessKey=..&category=girls&limit=..&offset=..`
//! answers `{status, data: {models: [...], pagination: {total}}}`.

use crate::config_ext::ProviderConfigExt;
use crate::error::{Result, SourceError};
use crate::filters::map_filters_to_provider;
use crate::http::{build_client, get_json, join_url, QueryParams, DEFAULT_TIMEOUT_SECS};
use crate::models::{
    deserialize_id, deserialize_opt_u64, parse_items, slugify, Category, ModelListing, ModelPage,
    ModelRequest, ProviderKind,
};
use crate::pagination::Pagination;
use crate::provider::ModelProvider;
use mwconfig::Config;
use reqwest::Client;
use serde::Deserialize;
use serde_json::Value;
use std::time::Duration;
use tracing::debug;

/// Default AWE API base URL
pub const DEFAULT_API_BASE: &str = "https://pt.ptawe.com/api";

/// Default promotion tool identifier
pub const DEFAULT_PS_TOOL: &str = "213_1";

/// Thumbnail sizes requested from the feed
const IMAGE_SIZES: &str = "320x180,896x503";

const DEFAULT_CATEGORY: &str = "girls";

const CATEGORIES: &[(&str, &str, &[(&str, &str)])] = &[
    (
        "girls",
        "Girls",
        &[
            ("fetish", "Fetish"),
            ("mature", "Mature"),
            ("teen", "18+ Teen"),
            ("bdsm", "BDSM"),
            ("lesbian", "Lesbian"),
        ],
    ),
    ("boys", "Boys", &[("fetish", "Fetish"), ("muscular", "Muscular")]),
    ("couples", "Couples", &[("fetish", "Fetish")]),
    ("trans", "Trans", &[("fetish", "Fetish")]),
];

#[derive(Debug, Deserialize)]
struct FeedResponse {
    #[serde(default)]
    status: Option<String>,
    #[serde(default)]
    message: Option<String>,
    #[serde(default)]
    data: FeedData,
}

#[derive(Debug, Default, Deserialize)]
struct FeedData {
    #[serde(default)]
    models: Vec<Value>,
    #[serde(default)]
    pagination: Option<FeedPagination>,
}

#[derive(Debug, Default, Deserialize)]
struct FeedPagination {
    #[serde(default, deserialize_with = "deserialize_opt_u64")]
    total: Option<u64>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct AweModel {
    #[serde(deserialize_with = "deserialize_id")]
    performer_id: String,
    display_name: String,
    #[serde(default)]
    profile_picture_url: Option<PictureUrls>,
    #[serde(default)]
    persons: Vec<Person>,
    #[serde(default)]
    ethnicity: Option<String>,
    #[serde(default)]
    body_type: Option<String>,
    #[serde(default)]
    details: Option<Details>,
    #[serde(default)]
    status: Option<String>,
    #[serde(default, deserialize_with = "deserialize_opt_u64")]
    viewer_count: Option<u64>,
}

#[derive(Debug, Default, Deserialize)]
struct PictureUrls {
    #[serde(default)]
    size320x180: Option<String>,
    #[serde(default)]
    size896x503: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
struct Person {
    #[serde(default, deserialize_with = "deserialize_opt_u64")]
    age: Option<u64>,
}

#[derive(Debug, Default, Deserialize)]
struct Details {
    #[serde(default)]
    willingnesses: Vec<String>,
}

impl From<AweModel> for ModelListing {
    fn from(model: AweModel) -> Self {
        let pictures = model.profile_picture_url.unwrap_or_default();
        let is_online = !model
            .status
            .as_deref()
            .is_some_and(|s| s.eq_ignore_ascii_case("offline"));

        ModelListing {
            slug: slugify(&model.display_name),
            id: model.performer_id,
            name: model.display_name,
            thumbnail: pictures.size320x180,
            preview_image: pictures.size896x503,
            age: model
                .persons
                .first()
                .and_then(|p| p.age)
                .and_then(|a| u32::try_from(a).ok()),
            ethnicity: model.ethnicity.map(|e| e.to_lowercase()),
            body_type: model.body_type.map(|b| b.to_lowercase()),
            tags: model.details.map(|d| d.willingnesses).unwrap_or_default(),
            is_online,
            viewer_count: model.viewer_count.unwrap_or(0),
            provider: ProviderKind::Awe,
        }
    }
}

/// Client for the premium model feed
#[derive(Debug, Clone)]
pub struct AweClient {
    client: Client,
    base_url: String,
    site_id: String,
    ps_id: String,
    ps_tool: String,
    access_key: String,
    show_offline: bool,
}

impl AweClient {
    /// Create a builder for configuring the client
    pub fn builder() -> AweClientBuilder {
        AweClientBuilder::default()
    }

    /// Crée un client à partir de la configuration `providers.awe`
    pub fn from_config(config: &Config) -> Result<Self> {
        let kind = ProviderKind::Awe;
        let setting = |key: &str| config.get_provider_setting(kind, key).unwrap_or_default();

        let mut builder = Self::builder()
            .site_id(setting("site_id"))
            .ps_id(setting("ps_id"))
            .access_key(setting("access_key"))
            .timeout(config.get_provider_timeout(kind));
        if let Some(base_url) = config.get_provider_base_url(kind) {
            builder = builder.base_url(base_url);
        }
        if let Some(ps_tool) = config.get_provider_setting(kind, "ps_tool") {
            builder = builder.ps_tool(ps_tool);
        }
        builder.build()
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Translates a canonical request into feed parameters
    pub fn query_for(&self, request: &ModelRequest) -> QueryParams {
        let mut params = QueryParams::new();
        params
            .push("siteId", &self.site_id)
            .push("psId", &self.ps_id)
            .push("psTool", &self.ps_tool)
            .push("accessKey", &self.access_key)
            .push("responseFormat", "json")
            .push("category", request.category_or(DEFAULT_CATEGORY))
            .push_opt("subcategory", request.subcategory())
            .push("limit", request.limit)
            .push("offset", request.offset)
            .push("imageSizes", IMAGE_SIZES)
            .push("showOffline", if self.show_offline { 1 } else { 0 })
            .extend(map_filters_to_provider(&request.filters, ProviderKind::Awe));
        params
    }
}

#[async_trait::async_trait]
impl ModelProvider for AweClient {
    fn kind(&self) -> ProviderKind {
        ProviderKind::Awe
    }

    async fn fetch_models(&self, request: &ModelRequest) -> Result<ModelPage> {
        let url = join_url(&self.base_url, "model/feed");
        let response: FeedResponse =
            get_json(&self.client, self.kind(), &url, &self.query_for(request)).await?;

        if response
            .status
            .as_deref()
            .is_some_and(|s| s.eq_ignore_ascii_case("error"))
        {
            return Err(SourceError::Rejected(
                response
                    .message
                    .unwrap_or_else(|| "unknown error".to_string()),
            ));
        }

        let total = response.data.pagination.and_then(|p| p.total);
        let mut items: Vec<ModelListing> = parse_items::<AweModel>(response.data.models, self.kind())
            .into_iter()
            .map(ModelListing::from)
            .collect();
        items.truncate(request.limit as usize);

        debug!("AWE returned {} models (total: {:?})", items.len(), total);

        let pagination = Pagination::resolve(total, request.limit, request.offset, items.len());
        Ok(ModelPage { items, pagination })
    }

    async fn categories(&self) -> Result<Vec<Category>> {
        Ok(CATEGORIES
            .iter()
            .map(|(slug, name, subs)| Category::from_table(slug, name, subs, ProviderKind::Awe))
            .collect())
    }
}

/// Builder for [`AweClient`]
#[derive(Debug, Clone)]
pub struct AweClientBuilder {
    client: Option<Client>,
    base_url: String,
    site_id: String,
    ps_id: String,
    ps_tool: String,
    access_key: String,
    show_offline: bool,
    timeout: Duration,
}

impl Default for AweClientBuilder {
    fn default() -> Self {
        Self {
            client: None,
            base_url: DEFAULT_API_BASE.to_string(),
            site_id: String::new(),
            ps_id: String::new(),
            ps_tool: DEFAULT_PS_TOOL.to_string(),
            access_key: String::new(),
            show_offline: false,
            timeout: Duration::from_secs(DEFAULT_TIMEOUT_SECS),
        }
    }
}

impl AweClientBuilder {
    /// Use a custom reqwest client (the timeout setting is then ignored)
    pub fn client(mut self, client: Client) -> Self {
        self.client = Some(client);
        self
    }

    pub fn base_url(mut self, url: impl Into<String>) -> Self {
        self.base_url = url.into();
        self
    }

    pub fn site_id(mut self, site_id: impl Into<String>) -> Self {
        self.site_id = site_id.into();
        self
    }

    pub fn ps_id(mut self, ps_id: impl Into<String>) -> Self {
        self.ps_id = ps_id.into();
        self
    }

    pub fn ps_tool(mut self, ps_tool: impl Into<String>) -> Self {
        self.ps_tool = ps_tool.into();
        self
    }

    pub fn access_key(mut self, access_key: impl Into<String>) -> Self {
        self.access_key = access_key.into();
        self
    }

    /// Include offline performers in listings
    pub fn show_offline(mut self, show: bool) -> Self {
        self.show_offline = show;
        self
    }

    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    pub fn build(self) -> Result<AweClient> {
        let client = match self.client {
            Some(client) => client,
            None => build_client(self.timeout)?,
        };

        Ok(AweClient {
            client,
            base_url: self.base_url,
            site_id: self.site_id,
            ps_id: self.ps_id,
            ps_tool: self.ps_tool,
            access_key: self.access_key,
            show_offline: self.show_offline,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_query_for() {
        let client = AweClient::builder()
            .site_id("77")
            .ps_id("me")
            .access_key("k")
            .build()
            .unwrap();
        let request = ModelRequest::new(10, 20)
            .with_subcategory("Fetish")
            .with_filter("ethnicity", "asian");
        let params = client.query_for(&request);

        assert_eq!(params.get("siteId"), Some("77"));
        assert_eq!(params.get("category"), Some("girls"));
        assert_eq!(params.get("subcategory"), Some("fetish"));
        assert_eq!(params.get("offset"), Some("20"));
        assert_eq!(params.get("psTool"), Some(DEFAULT_PS_TOOL));
        assert_eq!(params.get("ethnicity"), Some("asian"));
    }

    #[test]
    fn test_model_mapping() {
        let model: AweModel = serde_json::from_value(json!({
            "performerId": 981,
            "displayName": "Mistress Vera",
            "profilePictureUrl": {"size320x180": "a.jpg", "size896x503": "b.jpg"},
            "persons": [{"age": 31}],
            "ethnicity": "White",
            "details": {"willingnesses": ["femdom", "roleplay"]},
            "status": "free_chat",
            "viewerCount": "42"
        }))
        .unwrap();

        let listing = ModelListing::from(model);
        assert_eq!(listing.id, "981");
        assert_eq!(listing.slug, "mistress-vera");
        assert_eq!(listing.age, Some(31));
        assert_eq!(listing.ethnicity.as_deref(), Some("white"));
        assert_eq!(listing.preview_image.as_deref(), Some("b.jpg"));
        assert_eq!(listing.tags, vec!["femdom", "roleplay"]);
        assert!(listing.is_online);
        assert_eq!(listing.viewer_count, 42);
    }

    #[test]
    fn test_offline_status() {
        let model: AweModel = serde_json::from_value(json!({
            "performerId": "x",
            "displayName": "X",
            "status": "offline"
        }))
        .unwrap();
        let listing = ModelListing::from(model);
        assert!(!listing.is_online);
        assert_eq!(listing.viewer_count, 0);
    }
}
