//! Free-cam feed
//!
//! `GET {base}?wm=..&client_ip=..&format=json&limit=..&offset=..&gender=f`
//! answers `{count, results: [...]}`, where `count` is the true number of
//! rooms matching the query. A room is online while its `current_show` is
//! `public` or `private`; the feed may omit the field, in which case the room
//! is taken as online.

use crate::config_ext::ProviderConfigExt;
use crate::error::Result;
use crate::filters::map_filters_to_provider;
use crate::http::{build_client, get_json, QueryParams, DEFAULT_TIMEOUT_SECS};
use crate::models::{
    deserialize_opt_u64, parse_items, Category, ModelListing, ModelPage, ModelRequest,
    ProviderKind,
};
use crate::pagination::Pagination;
use crate::provider::ModelProvider;
use mwconfig::Config;
use reqwest::Client;
use serde::Deserialize;
use serde_json::Value;
use std::time::Duration;
use tracing::debug;

/// Default free-cam feed URL
pub const DEFAULT_API_BASE: &str = "https://chaturbate.com/api/public/affiliates/onlinerooms/";

/// Placeholder asking the feed to use the caller's address
pub const DEFAULT_CLIENT_IP: &str = "request_ip";

const DEFAULT_CATEGORY: &str = "girls";

/// Category slug → `gender` parameter
const GENDERS: &[(&str, &str, &str)] = &[
    ("girls", "Girls", "f"),
    ("boys", "Boys", "m"),
    ("couples", "Couples", "c"),
    ("trans", "Trans", "t"),
];

const SUBCATEGORIES: &[(&str, &str)] = &[
    ("fetish", "Fetish"),
    ("bdsm", "BDSM"),
    ("feet", "Feet"),
    ("mature", "Mature"),
    ("teen", "18+ Teen"),
];

/// Maps a category slug to the feed's gender code
pub fn gender_for(category: &str) -> Option<&'static str> {
    GENDERS
        .iter()
        .find(|(slug, _, _)| *slug == category)
        .map(|(_, _, gender)| *gender)
}

#[derive(Debug, Deserialize)]
struct RoomsResponse {
    #[serde(default, deserialize_with = "deserialize_opt_u64")]
    count: Option<u64>,
    #[serde(default)]
    results: Vec<Value>,
}

#[derive(Debug, Deserialize)]
struct Room {
    username: String,
    #[serde(default)]
    display_name: Option<String>,
    #[serde(default)]
    image_url: Option<String>,
    #[serde(default)]
    image_url_360x270: Option<String>,
    #[serde(default, deserialize_with = "deserialize_opt_u64")]
    age: Option<u64>,
    #[serde(default)]
    tags: Vec<String>,
    #[serde(default, deserialize_with = "deserialize_opt_u64")]
    num_users: Option<u64>,
    #[serde(default)]
    current_show: Option<String>,
}

impl Room {
    fn is_online(&self) -> bool {
        self.current_show.as_deref().is_none_or(|show| {
            let show = show.trim();
            show.eq_ignore_ascii_case("public") || show.eq_ignore_ascii_case("private")
        })
    }
}

impl From<Room> for ModelListing {
    fn from(room: Room) -> Self {
        let is_online = room.is_online();
        let name = room
            .display_name
            .filter(|n| !n.trim().is_empty())
            .unwrap_or_else(|| room.username.clone());

        ModelListing {
            id: room.username.clone(),
            slug: room.username,
            name,
            thumbnail: room.image_url,
            preview_image: room.image_url_360x270,
            age: room.age.and_then(|a| u32::try_from(a).ok()),
            ethnicity: None,
            body_type: None,
            tags: room.tags,
            is_online,
            viewer_count: room.num_users.unwrap_or(0),
            provider: ProviderKind::Free,
        }
    }
}

/// Client for the free-cam feed
#[derive(Debug, Clone)]
pub struct FreeClient {
    client: Client,
    base_url: String,
    wm: String,
    client_ip: String,
}

impl FreeClient {
    /// Create a builder for configuring the client
    pub fn builder() -> FreeClientBuilder {
        FreeClientBuilder::default()
    }

    /// Crée un client à partir de la configuration `providers.free`
    pub fn from_config(config: &Config) -> Result<Self> {
        let kind = ProviderKind::Free;

        let mut builder = Self::builder()
            .wm(config.get_provider_setting(kind, "wm").unwrap_or_default())
            .timeout(config.get_provider_timeout(kind));
        if let Some(base_url) = config.get_provider_base_url(kind) {
            builder = builder.base_url(base_url);
        }
        if let Some(client_ip) = config.get_provider_setting(kind, "client_ip") {
            builder = builder.client_ip(client_ip);
        }
        builder.build()
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Translates a canonical request into feed parameters
    ///
    /// The subcategory and mapped filters become repeated `tag` parameters.
    pub fn query_for(&self, request: &ModelRequest) -> QueryParams {
        let category = request.category_or(DEFAULT_CATEGORY);

        let mut params = QueryParams::new();
        params
            .push("wm", &self.wm)
            .push("client_ip", &self.client_ip)
            .push("format", "json")
            .push("limit", request.limit)
            .push("offset", request.offset)
            .push_opt("gender", gender_for(&category))
            .push_opt("tag", request.subcategory())
            .extend(map_filters_to_provider(&request.filters, ProviderKind::Free));
        params
    }
}

#[async_trait::async_trait]
impl ModelProvider for FreeClient {
    fn kind(&self) -> ProviderKind {
        ProviderKind::Free
    }

    async fn fetch_models(&self, request: &ModelRequest) -> Result<ModelPage> {
        let response: RoomsResponse =
            get_json(&self.client, self.kind(), &self.base_url, &self.query_for(request)).await?;

        let mut items: Vec<ModelListing> = parse_items::<Room>(response.results, self.kind())
            .into_iter()
            .map(ModelListing::from)
            .collect();
        items.truncate(request.limit as usize);

        debug!("FREE returned {} rooms (count: {:?})", items.len(), response.count);

        let pagination =
            Pagination::resolve(response.count, request.limit, request.offset, items.len());
        Ok(ModelPage { items, pagination })
    }

    async fn categories(&self) -> Result<Vec<Category>> {
        Ok(GENDERS
            .iter()
            .map(|(slug, name, _)| Category::from_table(slug, name, SUBCATEGORIES, ProviderKind::Free))
            .collect())
    }
}

/// Builder for [`FreeClient`]
#[derive(Debug, Clone)]
pub struct FreeClientBuilder {
    client: Option<Client>,
    base_url: String,
    wm: String,
    client_ip: String,
    timeout: Duration,
}

impl Default for FreeClientBuilder {
    fn default() -> Self {
        Self {
            client: None,
            base_url: DEFAULT_API_BASE.to_string(),
            wm: String::new(),
            client_ip: DEFAULT_CLIENT_IP.to_string(),
            timeout: Duration::from_secs(DEFAULT_TIMEOUT_SECS),
        }
    }
}

impl FreeClientBuilder {
    pub fn client(mut self, client: Client) -> Self {
        self.client = Some(client);
        self
    }

    pub fn base_url(mut self, url: impl Into<String>) -> Self {
        self.base_url = url.into();
        self
    }

    /// Affiliate campaign code
    pub fn wm(mut self, wm: impl Into<String>) -> Self {
        self.wm = wm.into();
        self
    }

    pub fn client_ip(mut self, client_ip: impl Into<String>) -> Self {
        self.client_ip = client_ip.into();
        self
    }

    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    pub fn build(self) -> Result<FreeClient> {
        let client = match self.client {
            Some(client) => client,
            None => build_client(self.timeout)?,
        };

        Ok(FreeClient {
            client,
            base_url: self.base_url,
            wm: self.wm,
            client_ip: self.client_ip,
        })
    }
}
