//! Endpoints API REST du catalogue
//!
//! Every route answers GET only and wraps its payload in the same envelope:
//!
//! ```json
//! {"success": true, "data": {"models": [...], "pagination": {...}}}
//! ```
//!
//! Query strings are parsed by the [`ListingParams`] extractor: the reserved
//! keys (`limit`, `offset`, `category`, `subcategory`, `provider`, `seed`,
//! `debug`, `forceRefresh`) are coerced, every other key becomes a filter.

use crate::error::AggregatorError;
use crate::orchestrator::{ModelQuery, Origin, Sourced};
use crate::service::{CatalogService, Listing};
use axum::{
    extract::{FromRequestParts, Path, Query, State},
    http::{request::Parts, StatusCode},
    response::{IntoResponse, Response},
    routing::get,
    Json, Router,
};
use mwsource::{
    Category, ModelListing, ModelPage, Pagination, ProviderKind, Subcategory, VideoListing,
    VideoPage,
};
use serde::Serialize;
use std::collections::BTreeMap;
use std::str::FromStr;
use std::sync::Arc;
use tracing::{debug, warn};
use utoipa::{OpenApi, ToSchema};

/// Page size when `limit` is absent
pub const DEFAULT_LIMIT: u32 = 24;

/// Larger `limit` values are clamped to this
pub const MAX_LIMIT: u32 = 100;

/// État partagé des handlers
#[derive(Debug, Clone)]
pub struct CatalogState {
    pub service: Arc<CatalogService>,
}

impl CatalogState {
    pub fn new(service: CatalogService) -> Self {
        Self {
            service: Arc::new(service),
        }
    }
}

// ============ Paramètres ============

/// Coerced query string of a listing route
#[derive(Debug, Clone, PartialEq)]
pub struct ListingParams {
    pub query: ModelQuery,
    pub debug: bool,
    pub force_refresh: bool,
}

impl Default for ListingParams {
    fn default() -> Self {
        Self {
            query: ModelQuery::new(DEFAULT_LIMIT, 0),
            debug: false,
            force_refresh: false,
        }
    }
}

impl ListingParams {
    /// Blank values count as absent
    pub fn parse(raw: BTreeMap<String, String>) -> Result<Self, AggregatorError> {
        let mut params = Self::default();
        let query = &mut params.query;

        for (name, value) in raw {
            let value = value.trim();
            if value.is_empty() {
                continue;
            }

            match name.as_str() {
                "limit" => query.limit = parse_number::<u32>(&name, value)?.min(MAX_LIMIT),
                "offset" => query.offset = parse_number(&name, value)?,
                "seed" => query.seed = Some(parse_number(&name, value)?),
                "provider" => {
                    let provider = ProviderKind::from_str(value)
                        .map_err(|_| AggregatorError::UnknownProvider(value.to_string()))?;
                    query.provider = Some(provider);
                }
                "category" => query.category = Some(value.to_string()),
                "subcategory" => query.subcategory = Some(value.to_string()),
                "debug" => params.debug = parse_flag(value),
                "forceRefresh" => params.force_refresh = parse_flag(value),
                _ => {
                    query.filters.insert(name.clone(), value.to_string());
                }
            }
        }

        Ok(params)
    }
}

impl<S> FromRequestParts<S> for ListingParams
where
    S: Send + Sync,
{
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let Query(raw) = Query::<BTreeMap<String, String>>::from_request_parts(parts, state)
            .await
            .map_err(|rejection| AggregatorError::invalid("query", &rejection.body_text()))?;
        Ok(Self::parse(raw)?)
    }
}

fn parse_number<T: FromStr>(name: &str, value: &str) -> Result<T, AggregatorError> {
    value
        .parse()
        .map_err(|_| AggregatorError::invalid(name, value))
}

fn parse_flag(value: &str) -> bool {
    matches!(value.to_lowercase().as_str(), "true" | "1" | "yes")
}

// ============ Réponses ============

/// Debug view of a model
#[derive(Debug, Clone, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct ModelDigest {
    pub id: String,
    pub name: String,
    pub provider: ProviderKind,
    pub is_online: bool,
}

impl From<&ModelListing> for ModelDigest {
    fn from(model: &ModelListing) -> Self {
        Self {
            id: model.id.clone(),
            name: model.name.clone(),
            provider: model.provider,
            is_online: model.is_online,
        }
    }
}

/// Debug view of a video
#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct VideoDigest {
    pub id: String,
    pub title: String,
    pub provider: ProviderKind,
}

impl From<&VideoListing> for VideoDigest {
    fn from(video: &VideoListing) -> Self {
        Self {
            id: video.id.clone(),
            title: video.title.clone(),
            provider: video.provider,
        }
    }
}

#[derive(Debug, Serialize, ToSchema)]
#[serde(untagged)]
pub enum ModelItems {
    Full(Vec<ModelListing>),
    Digest(Vec<ModelDigest>),
}

#[derive(Debug, Serialize, ToSchema)]
#[serde(untagged)]
pub enum VideoItems {
    Full(Vec<VideoListing>),
    Digest(Vec<VideoDigest>),
}

/// Present in debug mode only
#[derive(Debug, Serialize, ToSchema)]
pub struct ResponseMeta {
    pub origin: Origin,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct ModelsData {
    pub models: ModelItems,
    pub pagination: Pagination,
}

impl ModelsData {
    fn empty(query: &ModelQuery) -> Self {
        Self {
            models: ModelItems::Full(Vec::new()),
            pagination: Pagination::empty(query.limit, query.offset),
        }
    }
}

#[derive(Debug, Serialize, ToSchema)]
pub struct VideosData {
    pub videos: VideoItems,
    pub pagination: Pagination,
}

impl VideosData {
    fn empty(query: &ModelQuery) -> Self {
        Self {
            videos: VideoItems::Full(Vec::new()),
            pagination: Pagination::empty(query.limit, query.offset),
        }
    }
}

#[derive(Debug, Serialize, ToSchema)]
pub struct ModelsResponse {
    pub success: bool,
    pub data: ModelsData,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub meta: Option<ResponseMeta>,
}

impl ModelsResponse {
    fn new(page: Sourced<ModelPage>, debug: bool) -> Self {
        let Sourced { data, origin } = page;
        let models = if debug {
            ModelItems::Digest(data.items.iter().map(ModelDigest::from).collect())
        } else {
            ModelItems::Full(data.items)
        };

        Self {
            success: true,
            data: ModelsData {
                models,
                pagination: data.pagination,
            },
            meta: debug.then_some(ResponseMeta { origin }),
        }
    }
}

#[derive(Debug, Serialize, ToSchema)]
pub struct VideosResponse {
    pub success: bool,
    pub data: VideosData,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub meta: Option<ResponseMeta>,
}

impl VideosResponse {
    fn new(page: Sourced<VideoPage>, debug: bool) -> Self {
        let Sourced { data, origin } = page;
        let videos = if debug {
            VideoItems::Digest(data.items.iter().map(VideoDigest::from).collect())
        } else {
            VideoItems::Full(data.items)
        };

        Self {
            success: true,
            data: VideosData {
                videos,
                pagination: data.pagination,
            },
            meta: debug.then_some(ResponseMeta { origin }),
        }
    }
}

#[derive(Debug, Serialize, ToSchema)]
pub struct CategoriesData {
    pub categories: Vec<Category>,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct CategoriesResponse {
    pub success: bool,
    pub data: CategoriesData,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub meta: Option<ResponseMeta>,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct CategoryData {
    pub category: Category,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct CategoryResponse {
    pub success: bool,
    pub data: CategoryData,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub meta: Option<ResponseMeta>,
}

/// Empty listing sent with a 502
#[derive(Debug, Serialize)]
#[serde(untagged)]
enum EmptyData {
    Models(ModelsData),
    Videos(VideosData),
}

/// Corps des réponses en erreur
#[derive(Debug, Serialize, ToSchema)]
pub struct ErrorResponse {
    pub success: bool,
    pub error: String,
    /// Empty listing, on upstream failures only
    #[serde(skip_serializing_if = "Option::is_none")]
    #[schema(value_type = Option<Object>)]
    data: Option<EmptyData>,
}

impl ErrorResponse {
    pub fn new(error: impl Into<String>) -> Self {
        Self {
            success: false,
            error: error.into(),
            data: None,
        }
    }
}

// ============ Router ============

/// Crée le router Axum du catalogue
///
/// Paths are absolute: mount the router with a merge, not a nest.
pub fn create_router(state: CatalogState) -> Router {
    Router::new()
        .route("/api/models", get(list_models).fallback(method_not_allowed))
        .route(
            "/api/free-models",
            get(list_free_models).fallback(method_not_allowed),
        )
        .route(
            "/api/mixed-models",
            get(list_mixed_models).fallback(method_not_allowed),
        )
        .route("/api/videos", get(list_videos).fallback(method_not_allowed))
        .route(
            "/api/categories",
            get(list_categories).fallback(method_not_allowed),
        )
        .route(
            "/api/categories/{category}",
            get(get_category).fallback(method_not_allowed),
        )
        .with_state(state)
}

async fn method_not_allowed() -> Response {
    (
        StatusCode::METHOD_NOT_ALLOWED,
        Json(ErrorResponse::new("Method not allowed")),
    )
        .into_response()
}

// ============ Handlers ============

async fn model_listing(
    state: &CatalogState,
    listing: Listing,
    params: ListingParams,
) -> Result<Json<ModelsResponse>, AppError> {
    let page = state
        .service
        .models(listing, &params.query, params.force_refresh)
        .await
        .map_err(|e| AppError::listing(e, EmptyData::Models(ModelsData::empty(&params.query))))?;

    debug!(
        "{} → {} models ({:?})",
        listing.namespace(),
        page.data.items.len(),
        page.origin
    );
    Ok(Json(ModelsResponse::new(page, params.debug)))
}

/// Models from one provider, AWE by default
#[utoipa::path(
    get,
    path = "/api/models",
    params(
        ("provider" = Option<String>, Query, description = "awe, vpapi or free (default awe)"),
        ("category" = Option<String>, Query, description = "Category slug"),
        ("subcategory" = Option<String>, Query, description = "Subcategory slug"),
        ("limit" = Option<u32>, Query, description = "Page size, default 24, max 100"),
        ("offset" = Option<u32>, Query, description = "Items to skip"),
        ("debug" = Option<bool>, Query, description = "Reduced items plus origin"),
        ("forceRefresh" = Option<bool>, Query, description = "Bypass the cache read")
    ),
    responses(
        (status = 200, description = "Page of models", body = ModelsResponse),
        (status = 400, description = "Invalid parameter", body = ErrorResponse),
        (status = 502, description = "Upstream failure", body = ErrorResponse)
    ),
    tag = "catalog"
)]
pub async fn list_models(
    State(state): State<CatalogState>,
    params: ListingParams,
) -> Result<Json<ModelsResponse>, AppError> {
    model_listing(&state, Listing::Models, params).await
}

/// Models from the free-cam feed
#[utoipa::path(
    get,
    path = "/api/free-models",
    params(
        ("category" = Option<String>, Query, description = "Category slug"),
        ("subcategory" = Option<String>, Query, description = "Tag"),
        ("limit" = Option<u32>, Query, description = "Page size, default 24, max 100"),
        ("offset" = Option<u32>, Query, description = "Items to skip"),
        ("debug" = Option<bool>, Query, description = "Reduced items plus origin"),
        ("forceRefresh" = Option<bool>, Query, description = "Bypass the cache read")
    ),
    responses(
        (status = 200, description = "Page of models", body = ModelsResponse),
        (status = 400, description = "Invalid parameter", body = ErrorResponse),
        (status = 502, description = "Upstream failure", body = ErrorResponse)
    ),
    tag = "catalog"
)]
pub async fn list_free_models(
    State(state): State<CatalogState>,
    params: ListingParams,
) -> Result<Json<ModelsResponse>, AppError> {
    model_listing(&state, Listing::FreeModels, params).await
}

/// Shuffled models from every provider
#[utoipa::path(
    get,
    path = "/api/mixed-models",
    params(
        ("category" = Option<String>, Query, description = "Category slug"),
        ("limit" = Option<u32>, Query, description = "Page size, default 24, max 100"),
        ("offset" = Option<u32>, Query, description = "Items to skip"),
        ("seed" = Option<u64>, Query, description = "Shuffle seed"),
        ("debug" = Option<bool>, Query, description = "Reduced items plus origin"),
        ("forceRefresh" = Option<bool>, Query, description = "Bypass the cache read")
    ),
    responses(
        (status = 200, description = "Page of models", body = ModelsResponse),
        (status = 400, description = "Invalid parameter", body = ErrorResponse),
        (status = 502, description = "Every provider failed", body = ErrorResponse)
    ),
    tag = "catalog"
)]
pub async fn list_mixed_models(
    State(state): State<CatalogState>,
    params: ListingParams,
) -> Result<Json<ModelsResponse>, AppError> {
    model_listing(&state, Listing::MixedModels, params).await
}

/// Videos from the video feed
#[utoipa::path(
    get,
    path = "/api/videos",
    params(
        ("category" = Option<String>, Query, description = "straight, gay or shemale"),
        ("subcategory" = Option<String>, Query, description = "Tag"),
        ("limit" = Option<u32>, Query, description = "Page size, default 24, max 100"),
        ("offset" = Option<u32>, Query, description = "Items to skip"),
        ("debug" = Option<bool>, Query, description = "Reduced items plus origin"),
        ("forceRefresh" = Option<bool>, Query, description = "Bypass the cache read")
    ),
    responses(
        (status = 200, description = "Page of videos", body = VideosResponse),
        (status = 400, description = "Invalid parameter", body = ErrorResponse),
        (status = 502, description = "Upstream failure", body = ErrorResponse)
    ),
    tag = "catalog"
)]
pub async fn list_videos(
    State(state): State<CatalogState>,
    params: ListingParams,
) -> Result<Json<VideosResponse>, AppError> {
    let page = state
        .service
        .videos(&params.query, params.force_refresh)
        .await
        .map_err(|e| AppError::listing(e, EmptyData::Videos(VideosData::empty(&params.query))))?;

    Ok(Json(VideosResponse::new(page, params.debug)))
}

/// Category tree merged across providers
#[utoipa::path(
    get,
    path = "/api/categories",
    params(
        ("debug" = Option<bool>, Query, description = "Adds the origin"),
        ("forceRefresh" = Option<bool>, Query, description = "Bypass the cache read")
    ),
    responses(
        (status = 200, description = "Every category", body = CategoriesResponse)
    ),
    tag = "catalog"
)]
pub async fn list_categories(
    State(state): State<CatalogState>,
    params: ListingParams,
) -> Result<Json<CategoriesResponse>, AppError> {
    let taxonomy = state.service.categories(params.force_refresh).await?;

    Ok(Json(CategoriesResponse {
        success: true,
        data: CategoriesData {
            categories: taxonomy.data.categories,
        },
        meta: params.debug.then_some(ResponseMeta {
            origin: taxonomy.origin,
        }),
    }))
}

/// One category and its subcategories
#[utoipa::path(
    get,
    path = "/api/categories/{category}",
    params(
        ("category" = String, Path, description = "Category slug"),
        ("debug" = Option<bool>, Query, description = "Adds the origin"),
        ("forceRefresh" = Option<bool>, Query, description = "Bypass the cache read")
    ),
    responses(
        (status = 200, description = "The category", body = CategoryResponse),
        (status = 404, description = "Unknown category", body = ErrorResponse)
    ),
    tag = "catalog"
)]
pub async fn get_category(
    State(state): State<CatalogState>,
    Path(category): Path<String>,
    params: ListingParams,
) -> Result<Json<CategoryResponse>, AppError> {
    let found = state
        .service
        .category(&category, params.force_refresh)
        .await?;

    Ok(Json(CategoryResponse {
        success: true,
        data: CategoryData {
            category: found.data,
        },
        meta: params.debug.then_some(ResponseMeta {
            origin: found.origin,
        }),
    }))
}

// ============ Erreurs ============

/// Error type for handlers
#[derive(Debug)]
pub struct AppError {
    error: AggregatorError,
    empty: Option<EmptyData>,
}

impl AppError {
    /// Error of a listing route; the empty page is sent along with a 502
    fn listing(error: AggregatorError, empty: EmptyData) -> Self {
        Self {
            error,
            empty: Some(empty),
        }
    }

    pub fn status(&self) -> StatusCode {
        match &self.error {
            AggregatorError::UnknownProvider(_) | AggregatorError::InvalidParameter { .. } => {
                StatusCode::BAD_REQUEST
            }
            AggregatorError::UnknownCategory(_) => StatusCode::NOT_FOUND,
            AggregatorError::ProviderUnavailable(_) => StatusCode::SERVICE_UNAVAILABLE,
            AggregatorError::Upstream { source, .. } if source.is_upstream() => {
                StatusCode::BAD_GATEWAY
            }
            AggregatorError::AllProvidersFailed(_) => StatusCode::BAD_GATEWAY,
            AggregatorError::Upstream { .. } => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = self.status();
        if status.is_server_error() {
            warn!("{} → {}", self.error, status);
        } else {
            debug!("{} → {}", self.error, status);
        }

        let body = ErrorResponse {
            success: false,
            error: self.error.to_string(),
            data: self.empty.filter(|_| status == StatusCode::BAD_GATEWAY),
        };

        (status, Json(body)).into_response()
    }
}

impl From<AggregatorError> for AppError {
    fn from(error: AggregatorError) -> Self {
        Self { error, empty: None }
    }
}

// ============ OpenAPI ============

#[derive(OpenApi)]
#[openapi(
    paths(
        list_models,
        list_free_models,
        list_mixed_models,
        list_videos,
        list_categories,
        get_category
    ),
    components(schemas(
        ModelsResponse,
        ModelsData,
        ModelItems,
        ModelDigest,
        VideosResponse,
        VideosData,
        VideoItems,
        VideoDigest,
        CategoriesResponse,
        CategoriesData,
        CategoryResponse,
        CategoryData,
        ErrorResponse,
        ResponseMeta,
        Origin,
        ModelListing,
        VideoListing,
        Category,
        Subcategory,
        Pagination,
        ProviderKind
    )),
    tags((name = "catalog", description = "Affiliate catalog aggregated across providers"))
)]
pub struct ApiDoc;

#[cfg(test)]
mod tests {
    use super::*;

    fn raw(pairs: &[(&str, &str)]) -> BTreeMap<String, String> {
        pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect()
    }

    #[test]
    fn test_defaults() {
        let params = ListingParams::parse(BTreeMap::new()).unwrap();
        assert_eq!(params.query.limit, DEFAULT_LIMIT);
        assert_eq!(params.query.offset, 0);
        assert!(!params.debug);
        assert!(!params.force_refresh);
    }

    #[test]
    fn test_coercion_and_filters() {
        let params = ListingParams::parse(raw(&[
            ("limit", "500"),
            ("offset", "48"),
            ("provider", "VPAPI"),
            ("category", "girls"),
            ("seed", "7"),
            ("debug", "yes"),
            ("forceRefresh", "1"),
            ("ethnicity", "asian"),
            ("hair_color", " "),
        ]))
        .unwrap();

        assert_eq!(params.query.limit, MAX_LIMIT);
        assert_eq!(params.query.offset, 48);
        assert_eq!(params.query.provider, Some(ProviderKind::Vpapi));
        assert_eq!(params.query.category.as_deref(), Some("girls"));
        assert_eq!(params.query.seed, Some(7));
        assert!(params.debug);
        assert!(params.force_refresh);
        assert_eq!(params.query.filters.len(), 1);
        assert_eq!(params.query.filters["ethnicity"], "asian");
    }

    #[test]
    fn test_invalid_values() {
        for pairs in [
            [("limit", "ten")],
            [("offset", "-1")],
            [("seed", "abc")],
            [("provider", "chaturbate")],
        ] {
            let err = ListingParams::parse(raw(&pairs)).unwrap_err();
            assert!(err.is_client_error(), "{pairs:?}");
            assert_eq!(AppError::from(err).status(), StatusCode::BAD_REQUEST);
        }
    }

    #[test]
    fn test_status_mapping() {
        let upstream = AggregatorError::Upstream {
            provider: ProviderKind::Awe,
            source: mwsource::SourceError::Timeout,
        };
        assert_eq!(AppError::from(upstream).status(), StatusCode::BAD_GATEWAY);

        let misconfigured = AggregatorError::Upstream {
            provider: ProviderKind::Free,
            source: mwsource::SourceError::Unsupported {
                provider: "FREE",
                operation: "fetch_videos",
            },
        };
        assert_eq!(
            AppError::from(misconfigured).status(),
            StatusCode::INTERNAL_SERVER_ERROR
        );
        assert_eq!(
            AppError::from(AggregatorError::UnknownCategory("x".into())).status(),
            StatusCode::NOT_FOUND
        );
    }

    #[test]
    fn test_digest_serialization() {
        let mut model = ModelListing::new("1", "Luna", ProviderKind::Awe);
        model.is_online = true;
        let json = serde_json::to_value(ModelDigest::from(&model)).unwrap();
        assert_eq!(
            json,
            serde_json::json!({"id": "1", "name": "Luna", "provider": "AWE", "isOnline": true})
        );
    }
}
