//! Premium video feed (VPAPI)
//!
//! `GET {base}/list?psid=..&accessKey=..&sexualOrientation=straight&limit=..&pageIndex=..`
//! answers `{status, data: {videos: [...], pagination: {total}}}`. The feed
//! pages by index rather than by offset.

use crate::config_ext::ProviderConfigExt;
use crate::error::{Result, SourceError};
use crate::filters::map_filters_to_provider;
use crate::http::{build_client, get_json, join_url, QueryParams, DEFAULT_TIMEOUT_SECS};
use crate::models::{
    deserialize_id, deserialize_opt_u64, parse_items, slugify, Category, ModelListing, ModelPage,
    ModelRequest, ProviderKind, Subcategory, VideoListing, VideoPage,
};
use crate::pagination::Pagination;
use crate::provider::ModelProvider;
use mwconfig::Config;
use reqwest::Client;
use serde::Deserialize;
use serde_json::Value;
use std::collections::HashSet;
use std::time::Duration;
use tracing::{debug, warn};

/// Default VPAPI base URL
pub const DEFAULT_API_BASE: &str = "https://pt.protoawe.com/api/video-promotion/v1";

/// Orientation used when the request does not name one
pub const DEFAULT_ORIENTATION: &str = "straight";

const ORIENTATIONS: &[(&str, &str)] = &[
    ("straight", "Straight"),
    ("gay", "Gay"),
    ("shemale", "Trans"),
];

#[derive(Debug, Deserialize)]
struct ListResponse {
    #[serde(default)]
    status: Option<String>,
    #[serde(default)]
    message: Option<String>,
    #[serde(default)]
    data: ListData,
}

#[derive(Debug, Default, Deserialize)]
struct ListData {
    #[serde(default)]
    videos: Vec<Value>,
    #[serde(default)]
    tags: Vec<Value>,
    #[serde(default)]
    pagination: Option<ListPagination>,
}

#[derive(Debug, Default, Deserialize)]
struct ListPagination {
    #[serde(default, deserialize_with = "deserialize_opt_u64")]
    total: Option<u64>,
}

impl ListResponse {
    fn into_data(self) -> Result<ListData> {
        if self
            .status
            .as_deref()
            .is_some_and(|s| s.eq_ignore_ascii_case("error"))
        {
            return Err(SourceError::Rejected(
                self.message.unwrap_or_else(|| "unknown error".to_string()),
            ));
        }
        Ok(self.data)
    }
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct Video {
    #[serde(deserialize_with = "deserialize_id")]
    id: String,
    title: String,
    #[serde(default)]
    cover_image: Option<String>,
    #[serde(default)]
    preview_images: Vec<String>,
    #[serde(default, deserialize_with = "deserialize_opt_u64")]
    duration: Option<u64>,
    #[serde(default)]
    tags: Vec<String>,
    #[serde(default)]
    uploader: Option<String>,
    #[serde(default)]
    quality: Option<String>,
    #[serde(default)]
    target_url: Option<String>,
}

impl From<Video> for VideoListing {
    fn from(video: Video) -> Self {
        VideoListing {
            id: video.id,
            title: video.title,
            thumbnail: video
                .cover_image
                .or_else(|| video.preview_images.first().cloned()),
            preview_images: video.preview_images,
            duration: video
                .duration
                .map(|d| u32::try_from(d).unwrap_or(u32::MAX))
                .unwrap_or(0),
            tags: video.tags,
            performer_name: video.uploader.filter(|u| !u.trim().is_empty()),
            quality: video.quality,
            target_url: video.target_url,
            provider: ProviderKind::Vpapi,
        }
    }
}

/// The uploader of a video, seen as an (offline) model listing
fn uploader_listing(video: &VideoListing) -> Option<ModelListing> {
    let name = video.performer_name.as_deref()?.trim();
    let mut listing = ModelListing::new(slugify(name), name, ProviderKind::Vpapi);
    listing.thumbnail = video.thumbnail.clone();
    listing.preview_image = video.preview_images.first().cloned();
    listing.tags = video.tags.clone();
    Some(listing)
}

/// Client for the premium video feed
#[derive(Debug, Clone)]
pub struct VpapiClient {
    client: Client,
    base_url: String,
    ps_id: String,
    access_key: String,
    sexual_orientation: String,
}

impl VpapiClient {
    /// Create a builder for configuring the client
    pub fn builder() -> VpapiClientBuilder {
        VpapiClientBuilder::default()
    }

    /// Crée un client à partir de la configuration `providers.vpapi`
    pub fn from_config(config: &Config) -> Result<Self> {
        let kind = ProviderKind::Vpapi;
        let setting = |key: &str| config.get_provider_setting(kind, key).unwrap_or_default();

        let mut builder = Self::builder()
            .ps_id(setting("ps_id"))
            .access_key(setting("access_key"))
            .timeout(config.get_provider_timeout(kind));
        if let Some(base_url) = config.get_provider_base_url(kind) {
            builder = builder.base_url(base_url);
        }
        if let Some(orientation) = config.get_provider_setting(kind, "sexual_orientation") {
            builder = builder.sexual_orientation(orientation);
        }
        builder.build()
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn credentials(&self) -> QueryParams {
        let mut params = QueryParams::new();
        params
            .push("psid", &self.ps_id)
            .push("accessKey", &self.access_key);
        params
    }

    /// Translates a canonical request into list parameters
    ///
    /// The category selects the orientation when it names one. The
    /// subcategory and every mapped filter end up in a single `tags` list.
    pub fn query_for(&self, request: &ModelRequest) -> QueryParams {
        let category = request.category_or(&self.sexual_orientation);
        let orientation = if ORIENTATIONS.iter().any(|(slug, _)| *slug == category) {
            category
        } else {
            self.sexual_orientation.clone()
        };

        let mut tags: Vec<String> = request.subcategory().into_iter().collect();
        let mut others = Vec::new();
        for (name, value) in map_filters_to_provider(&request.filters, ProviderKind::Vpapi) {
            if name == "tags" {
                if !tags.contains(&value) {
                    tags.push(value);
                }
            } else {
                others.push((name, value));
            }
        }

        let mut params = self.credentials();
        params
            .push("sexualOrientation", orientation)
            .push("limit", request.limit)
            .push("pageIndex", request.page_index())
            .push_list("tags", &tags)
            .extend(others);
        params
    }

    async fn list(&self, request: &ModelRequest) -> Result<(Vec<VideoListing>, Option<u64>)> {
        let url = join_url(&self.base_url, "list");
        let response: ListResponse =
            get_json(&self.client, self.kind(), &url, &self.query_for(request)).await?;
        let data = response.into_data()?;

        let total = data.pagination.and_then(|p| p.total);
        let mut videos: Vec<VideoListing> = parse_items::<Video>(data.videos, self.kind())
            .into_iter()
            .map(VideoListing::from)
            .collect();
        videos.truncate(request.limit as usize);

        debug!("VPAPI returned {} videos (total: {:?})", videos.len(), total);
        Ok((videos, total))
    }

    /// Live tag list, used as subcategories
    pub async fn tags(&self) -> Result<Vec<String>> {
        let url = join_url(&self.base_url, "tags");
        let response: ListResponse =
            get_json(&self.client, self.kind(), &url, &self.credentials()).await?;

        let tags = response
            .into_data()?
            .tags
            .into_iter()
            .filter_map(|tag| match tag {
                Value::String(s) => Some(s),
                Value::Object(map) => map
                    .get("name")
                    .and_then(Value::as_str)
                    .map(str::to_string),
                _ => None,
            })
            .filter(|t| !t.trim().is_empty())
            .collect();
        Ok(tags)
    }
}

#[async_trait::async_trait]
impl ModelProvider for VpapiClient {
    fn kind(&self) -> ProviderKind {
        ProviderKind::Vpapi
    }

    /// Performers of the listed videos, one entry per uploader
    ///
    /// Pagination follows the video page, since that is what the feed pages.
    async fn fetch_models(&self, request: &ModelRequest) -> Result<ModelPage> {
        let (videos, total) = self.list(request).await?;

        let mut seen = HashSet::new();
        let items: Vec<ModelListing> = videos
            .iter()
            .filter_map(uploader_listing)
            .filter(|m| seen.insert(m.id.clone()))
            .collect();

        let pagination = Pagination::resolve(total, request.limit, request.offset, videos.len());
        Ok(ModelPage { items, pagination })
    }

    async fn fetch_videos(&self, request: &ModelRequest) -> Result<VideoPage> {
        let (items, total) = self.list(request).await?;
        let pagination = Pagination::resolve(total, request.limit, request.offset, items.len());
        Ok(VideoPage { items, pagination })
    }

    async fn categories(&self) -> Result<Vec<Category>> {
        let tags = match self.tags().await {
            Ok(tags) => tags,
            Err(e) => {
                warn!("VPAPI tag list unavailable, using static categories: {}", e);
                Vec::new()
            }
        };

        let subcategories: Vec<Subcategory> = tags
            .iter()
            .map(|tag| Subcategory {
                slug: slugify(tag),
                name: tag.clone(),
                providers: vec![ProviderKind::Vpapi],
            })
            .collect();

        Ok(ORIENTATIONS
            .iter()
            .map(|(slug, name)| Category {
                slug: slug.to_string(),
                name: name.to_string(),
                providers: vec![ProviderKind::Vpapi],
                subcategories: subcategories.clone(),
            })
            .collect())
    }
}

/// Builder for [`VpapiClient`]
#[derive(Debug, Clone)]
pub struct VpapiClientBuilder {
    client: Option<Client>,
    base_url: String,
    ps_id: String,
    access_key: String,
    sexual_orientation: String,
    timeout: Duration,
}

impl Default for VpapiClientBuilder {
    fn default() -> Self {
        Self {
            client: None,
            base_url: DEFAULT_API_BASE.to_string(),
            ps_id: String::new(),
            access_key: String::new(),
            sexual_orientation: DEFAULT_ORIENTATION.to_string(),
            timeout: Duration::from_secs(DEFAULT_TIMEOUT_SECS),
        }
    }
}

impl VpapiClientBuilder {
    pub fn client(mut self, client: Client) -> Self {
        self.client = Some(client);
        self
    }

    pub fn base_url(mut self, url: impl Into<String>) -> Self {
        self.base_url = url.into();
        self
    }

    pub fn ps_id(mut self, ps_id: impl Into<String>) -> Self {
        self.ps_id = ps_id.into();
        self
    }

    pub fn access_key(mut self, access_key: impl Into<String>) -> Self {
        self.access_key = access_key.into();
        self
    }

    pub fn sexual_orientation(mut self, orientation: impl Into<String>) -> Self {
        self.sexual_orientation = orientation.into().to_lowercase();
        self
    }

    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    pub fn build(self) -> Result<VpapiClient> {
        let client = match self.client {
            Some(client) => client,
            None => build_client(self.timeout)?,
        };

        Ok(VpapiClient {
            client,
            base_url: self.base_url,
            ps_id: self.ps_id,
            access_key: self.access_key,
            sexual_orientation: self.sexual_orientation,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn client() -> VpapiClient {
        VpapiClient::builder().ps_id("me").access_key("k").build().unwrap()
    }

    #[test]
    fn test_query_for_merges_tags() {
        let request = ModelRequest::new(12, 24)
            .with_category("gay")
            .with_subcategory("Leather")
            .with_filter("ethnicity", "white")
            .with_filter("language", "fr");
        let params = client().query_for(&request);

        assert_eq!(params.get("psid"), Some("me"));
        assert_eq!(params.get("sexualOrientation"), Some("gay"));
        assert_eq!(params.get("pageIndex"), Some("3"));
        assert_eq!(params.get("tags"), Some("leather,caucasian"));
        assert_eq!(params.get("language"), None);
    }

    #[test]
    fn test_unknown_category_keeps_default_orientation() {
        let params = client().query_for(&ModelRequest::new(10, 0).with_category("girls"));
        assert_eq!(params.get("sexualOrientation"), Some(DEFAULT_ORIENTATION));
        assert_eq!(params.get("tags"), None);
    }

    #[test]
    fn test_video_mapping_and_uploader() {
        let video: Video = serde_json::from_value(json!({
            "id": 55,
            "title": "Session",
            "previewImages": ["p1.jpg", "p2.jpg"],
            "duration": "615",
            "tags": ["latex"],
            "uploader": "Lady Noir",
            "quality": "hd"
        }))
        .unwrap();
        let listing = VideoListing::from(video);
        assert_eq!(listing.id, "55");
        assert_eq!(listing.thumbnail.as_deref(), Some("p1.jpg"));
        assert_eq!(listing.duration, 615);

        let model = uploader_listing(&listing).unwrap();
        assert_eq!(model.id, "lady-noir");
        assert_eq!(model.name, "Lady Noir");
        assert!(!model.is_online);
        assert_eq!(model.viewer_count, 0);
        assert_eq!(model.provider, ProviderKind::Vpapi);
    }
}
