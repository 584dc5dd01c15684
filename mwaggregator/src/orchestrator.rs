//! Routing of logical listing requests to the provider adapters
//!
//! The orchestrator owns one adapter per provider. Single-provider calls go
//! straight to the adapter; the mixed listing fans out to all of them
//! concurrently and shuffles the union; the taxonomy merges every provider's
//! categories by slug.

use crate::error::{AggregatorError, Result};
use futures::future::join_all;
use indexmap::IndexMap;
use mwsource::{
    mock, Category, Filters, ModelListing, ModelPage, ModelProvider, ModelRequest, Pagination,
    ProviderKind, SourceError, VideoPage,
};
use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rand::SeedableRng;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::sync::Arc;
use tracing::{debug, warn};

/// Where a result came from
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, utoipa::ToSchema)]
#[serde(rename_all = "lowercase")]
pub enum Origin {
    /// Fetched from the upstream API
    Live,
    /// Served from the response cache
    Cache,
    /// Deterministic mock data served in place of a failed upstream
    Fallback,
}

/// A result tagged with its [`Origin`]
#[derive(Debug, Clone, PartialEq)]
pub struct Sourced<T> {
    pub data: T,
    pub origin: Origin,
}

impl<T> Sourced<T> {
    pub fn live(data: T) -> Self {
        Self {
            data,
            origin: Origin::Live,
        }
    }

    pub fn fallback(data: T) -> Self {
        Self {
            data,
            origin: Origin::Fallback,
        }
    }
}

/// Provider-agnostic listing query
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ModelQuery {
    /// Only read by [`Orchestrator::fetch_models`]; defaults to AWE
    pub provider: Option<ProviderKind>,
    pub category: Option<String>,
    pub subcategory: Option<String>,
    pub filters: Filters,
    pub limit: u32,
    pub offset: u32,
    /// Shuffle seed for the mixed listing
    pub seed: Option<u64>,
}

impl ModelQuery {
    pub fn new(limit: u32, offset: u32) -> Self {
        Self {
            limit,
            offset,
            ..Default::default()
        }
    }

    pub fn with_provider(mut self, provider: ProviderKind) -> Self {
        self.provider = Some(provider);
        self
    }

    pub fn with_category(mut self, category: impl Into<String>) -> Self {
        self.category = Some(category.into());
        self
    }

    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = Some(seed);
        self
    }

    fn request(&self, limit: u32, offset: u32) -> ModelRequest {
        ModelRequest {
            category: self.category.clone(),
            subcategory: self.subcategory.clone(),
            limit,
            offset,
            filters: self.filters.clone(),
        }
    }

    /// The adapter request for a single-provider call
    pub fn to_request(&self) -> ModelRequest {
        self.request(self.limit, self.offset)
    }
}

/// Merged category tree
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Taxonomy {
    pub categories: Vec<Category>,
}

impl Taxonomy {
    /// Looks a category up by slug, case-insensitively
    pub fn find(&self, slug: &str) -> Option<&Category> {
        let slug = slug.trim();
        self.categories
            .iter()
            .find(|c| c.slug.eq_ignore_ascii_case(slug))
    }
}

/// Comportement de l'orchestrateur
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct AggregatorSettings {
    /// Serve mock data when an upstream fails
    pub mock_fallback: bool,
    /// Default shuffle seed for the mixed listing
    pub mix_seed: Option<u64>,
}

/// Orders models online first, then by viewer count, keeping ties in place
pub fn sort_online_first(items: &mut [ModelListing]) {
    items.sort_by(|a, b| {
        b.is_online
            .cmp(&a.is_online)
            .then(b.viewer_count.cmp(&a.viewer_count))
    });
}

/// Number of items requested from each provider by the mixed listing
pub fn mixed_share(limit: u32) -> u32 {
    limit.div_ceil(ProviderKind::ALL.len() as u32)
}

#[derive(Debug, Clone)]
pub struct Orchestrator {
    providers: BTreeMap<ProviderKind, Arc<dyn ModelProvider>>,
    settings: AggregatorSettings,
}

impl Orchestrator {
    /// An orchestrator without adapters
    pub fn new(settings: AggregatorSettings) -> Self {
        Self {
            providers: BTreeMap::new(),
            settings,
        }
    }

    /// Registers an adapter, replacing any previous one of the same kind
    pub fn with_provider(mut self, provider: Arc<dyn ModelProvider>) -> Self {
        self.providers.insert(provider.kind(), provider);
        self
    }

    pub fn with_providers(self, providers: impl IntoIterator<Item = Arc<dyn ModelProvider>>) -> Self {
        providers.into_iter().fold(self, Self::with_provider)
    }

    pub fn settings(&self) -> AggregatorSettings {
        self.settings
    }

    pub fn provider_kinds(&self) -> Vec<ProviderKind> {
        self.providers.keys().copied().collect()
    }

    fn provider(&self, kind: ProviderKind) -> Result<&Arc<dyn ModelProvider>> {
        self.providers
            .get(&kind)
            .ok_or(AggregatorError::ProviderUnavailable(kind))
    }

    /// Turns an adapter failure into a fallback page or an error
    fn degrade<T>(
        &self,
        provider: ProviderKind,
        err: SourceError,
        mock: impl FnOnce() -> T,
    ) -> Result<Sourced<T>> {
        if self.settings.mock_fallback && err.is_upstream() {
            warn!(%provider, "Upstream failed, serving mock data: {}", err);
            Ok(Sourced::fallback(mock()))
        } else {
            Err(AggregatorError::Upstream {
                provider,
                source: err,
            })
        }
    }

    /// Models from one provider (AWE when the query names none)
    pub async fn fetch_models(&self, query: &ModelQuery) -> Result<Sourced<ModelPage>> {
        let kind = query.provider.unwrap_or(ProviderKind::Awe);
        let request = query.to_request();

        match self.provider(kind)?.fetch_models(&request).await {
            Ok(mut page) => {
                sort_online_first(&mut page.items);
                Ok(Sourced::live(page))
            }
            Err(e) => self.degrade(kind, e, || mock::mock_models(kind, &request)),
        }
    }

    /// Models from the free-cam feed
    pub async fn fetch_free_models(&self, query: &ModelQuery) -> Result<Sourced<ModelPage>> {
        let query = ModelQuery {
            provider: Some(ProviderKind::Free),
            ..query.clone()
        };
        self.fetch_models(&query).await
    }

    /// Shuffled union of every provider's models
    ///
    /// Each provider is asked for `ceil(limit / 3)` items at the matching page.
    /// Failed providers contribute nothing; the call only fails when all of
    /// them do. Pagination is heuristic since there is no combined total.
    pub async fn fetch_mixed_models(&self, query: &ModelQuery) -> Result<Sourced<ModelPage>> {
        let share = mixed_share(query.limit);
        let share_offset = if query.limit == 0 {
            0
        } else {
            let scaled = query.offset as u64 * share as u64 / query.limit as u64;
            u32::try_from(scaled).unwrap_or(u32::MAX)
        };
        let request = query.request(share, share_offset);

        let calls = self.providers.values().map(|provider| {
            let request = &request;
            async move { (provider.kind(), provider.fetch_models(request).await) }
        });
        let results = join_all(calls).await;

        let mut items = Vec::new();
        let mut failures = Vec::new();
        for (kind, result) in results {
            match result {
                Ok(page) => {
                    debug!(provider = %kind, "Mixed listing: {} items", page.items.len());
                    items.extend(page.items);
                }
                Err(e) => {
                    warn!(provider = %kind, "Mixed listing: provider skipped: {}", e);
                    failures.push(format!("{kind}: {e}"));
                }
            }
        }

        let all_failed = !self.providers.is_empty() && failures.len() == self.providers.len();
        let origin = if all_failed {
            if !self.settings.mock_fallback {
                return Err(AggregatorError::AllProvidersFailed(failures.join("; ")));
            }
            warn!("Every provider failed, serving mock data");
            let full_page = query.to_request();
            items = self
                .providers
                .keys()
                .flat_map(|kind| mock::mock_models(*kind, &full_page).items)
                .collect();
            Origin::Fallback
        } else {
            Origin::Live
        };

        self.shuffle(&mut items, query.seed);
        items.truncate(query.limit as usize);

        let pagination = Pagination::from_page_len(query.limit, query.offset, items.len());
        Ok(Sourced {
            data: ModelPage { items, pagination },
            origin,
        })
    }

    fn shuffle(&self, items: &mut [ModelListing], seed: Option<u64>) {
        match seed.or(self.settings.mix_seed) {
            Some(seed) => items.shuffle(&mut StdRng::seed_from_u64(seed)),
            None => items.shuffle(&mut rand::rng()),
        }
    }

    /// Videos from the video feed
    pub async fn fetch_videos(&self, query: &ModelQuery) -> Result<Sourced<VideoPage>> {
        let kind = ProviderKind::Vpapi;
        let request = query.to_request();

        match self.provider(kind)?.fetch_videos(&request).await {
            Ok(page) => Ok(Sourced::live(page)),
            Err(e) => self.degrade(kind, e, || mock::mock_videos(&request)),
        }
    }

    /// Every provider's categories, merged by slug
    ///
    /// Categories keep the order in which they were first seen; provider
    /// lists and subcategories are unioned. Failed providers are skipped.
    pub async fn fetch_categories(&self) -> Taxonomy {
        let calls = self
            .providers
            .values()
            .map(|provider| async move { (provider.kind(), provider.categories().await) });

        let mut merged: IndexMap<String, Category> = IndexMap::new();
        for (kind, result) in join_all(calls).await {
            let categories = match result {
                Ok(categories) => categories,
                Err(e) => {
                    warn!(provider = %kind, "Categories unavailable: {}", e);
                    continue;
                }
            };

            for category in categories {
                match merged.get_mut(&category.slug) {
                    Some(existing) => merge_category(existing, category),
                    None => {
                        merged.insert(category.slug.clone(), category);
                    }
                }
            }
        }

        Taxonomy {
            categories: merged.into_values().collect(),
        }
    }

    /// One category of the merged taxonomy
    pub async fn fetch_category(&self, slug: &str) -> Result<Category> {
        self.fetch_categories()
            .await
            .find(slug)
            .cloned()
            .ok_or_else(|| AggregatorError::UnknownCategory(slug.to_string()))
    }
}

fn union_providers(into: &mut Vec<ProviderKind>, from: Vec<ProviderKind>) {
    for provider in from {
        if !into.contains(&provider) {
            into.push(provider);
        }
    }
}

fn merge_category(existing: &mut Category, other: Category) {
    union_providers(&mut existing.providers, other.providers);

    for sub in other.subcategories {
        match existing.subcategories.iter_mut().find(|s| s.slug == sub.slug) {
            Some(known) => union_providers(&mut known.providers, sub.providers),
            None => existing.subcategories.push(sub),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use mwsource::{Subcategory, VideoListing};

    /// In-memory adapter returning canned data or a canned failure
    #[derive(Debug)]
    struct FakeProvider {
        kind: ProviderKind,
        models: Vec<ModelListing>,
        categories: Vec<Category>,
        fail: bool,
    }

    impl FakeProvider {
        fn new(kind: ProviderKind, count: usize) -> Self {
            let models = (0..count)
                .map(|i| {
                    let mut m = ModelListing::new(format!("{}-{i}", kind.as_str()), format!("M {i}"), kind);
                    m.is_online = i % 2 == 0;
                    m.viewer_count = (i * 10) as u64;
                    m
                })
                .collect();
            Self {
                kind,
                models,
                categories: Vec::new(),
                fail: false,
            }
        }

        fn failing(kind: ProviderKind) -> Self {
            Self {
                fail: true,
                ..Self::new(kind, 0)
            }
        }

        fn with_categories(mut self, categories: Vec<Category>) -> Self {
            self.categories = categories;
            self
        }
    }

    #[async_trait::async_trait]
    impl ModelProvider for FakeProvider {
        fn kind(&self) -> ProviderKind {
            self.kind
        }

        async fn fetch_models(&self, request: &ModelRequest) -> mwsource::Result<ModelPage> {
            if self.fail {
                return Err(SourceError::from_status_code(500, "boom"));
            }
            let items: Vec<_> = self
                .models
                .iter()
                .skip(request.offset as usize)
                .take(request.limit as usize)
                .cloned()
                .collect();
            let pagination =
                Pagination::from_total(self.models.len() as u64, request.limit, request.offset, items.len());
            Ok(ModelPage { items, pagination })
        }

        async fn fetch_videos(&self, request: &ModelRequest) -> mwsource::Result<VideoPage> {
            if self.fail {
                return Err(SourceError::Timeout);
            }
            let items = vec![VideoListing {
                id: "v1".to_string(),
                title: "Video".to_string(),
                thumbnail: None,
                preview_images: Vec::new(),
                duration: 10,
                tags: Vec::new(),
                performer_name: None,
                quality: None,
                target_url: None,
                provider: self.kind,
            }];
            let pagination = Pagination::from_page_len(request.limit, request.offset, items.len());
            Ok(VideoPage { items, pagination })
        }

        async fn categories(&self) -> mwsource::Result<Vec<Category>> {
            if self.fail {
                return Err(SourceError::Timeout);
            }
            Ok(self.categories.clone())
        }
    }

    fn orchestrator(settings: AggregatorSettings, providers: Vec<FakeProvider>) -> Orchestrator {
        providers.into_iter().fold(Orchestrator::new(settings), |o, p| {
            o.with_provider(Arc::new(p))
        })
    }

    fn category(slug: &str, provider: ProviderKind, subs: &[&str]) -> Category {
        Category {
            slug: slug.to_string(),
            name: slug.to_uppercase(),
            providers: vec![provider],
            subcategories: subs
                .iter()
                .map(|s| Subcategory {
                    slug: s.to_string(),
                    name: s.to_string(),
                    providers: vec![provider],
                })
                .collect(),
        }
    }

    #[test]
    fn test_sort_online_first_is_stable() {
        let mut items: Vec<ModelListing> = [("a", true, 5), ("b", false, 100), ("c", true, 5), ("d", true, 50)]
            .iter()
            .map(|(id, online, viewers)| {
                let mut m = ModelListing::new(*id, *id, ProviderKind::Awe);
                m.is_online = *online;
                m.viewer_count = *viewers;
                m
            })
            .collect();

        sort_online_first(&mut items);

        let ids: Vec<_> = items.iter().map(|m| m.id.as_str()).collect();
        assert_eq!(ids, vec!["d", "a", "c", "b"]);
        let online: Vec<_> = items.iter().filter(|m| m.is_online).collect();
        assert!(online.windows(2).all(|w| w[0].viewer_count >= w[1].viewer_count));
    }

    #[test]
    fn test_mixed_share() {
        assert_eq!(mixed_share(24), 8);
        assert_eq!(mixed_share(10), 4);
        assert_eq!(mixed_share(1), 1);
        assert_eq!(mixed_share(0), 0);
    }

    #[tokio::test]
    async fn test_fetch_models_defaults_to_awe_and_sorts() {
        let o = orchestrator(
            AggregatorSettings::default(),
            vec![FakeProvider::new(ProviderKind::Awe, 6), FakeProvider::new(ProviderKind::Free, 6)],
        );

        let result = o.fetch_models(&ModelQuery::new(4, 0)).await.unwrap();
        assert_eq!(result.origin, Origin::Live);
        assert_eq!(result.data.items.len(), 4);
        assert!(result.data.items.iter().all(|m| m.provider == ProviderKind::Awe));
        assert!(result.data.items[0].is_online);
        assert_eq!(result.data.items[0].viewer_count, 20);

        let free = o.fetch_free_models(&ModelQuery::new(2, 0)).await.unwrap();
        assert!(free.data.items.iter().all(|m| m.provider == ProviderKind::Free));
    }

    #[tokio::test]
    async fn test_fallback_switch() {
        let failing = || vec![FakeProvider::failing(ProviderKind::Awe)];

        let err = orchestrator(AggregatorSettings::default(), failing())
            .fetch_models(&ModelQuery::new(5, 0))
            .await
            .unwrap_err();
        assert!(matches!(err, AggregatorError::Upstream { provider: ProviderKind::Awe, .. }));

        let settings = AggregatorSettings {
            mock_fallback: true,
            mix_seed: None,
        };
        let result = orchestrator(settings, failing())
            .fetch_models(&ModelQuery::new(5, 0))
            .await
            .unwrap();
        assert_eq!(result.origin, Origin::Fallback);
        assert_eq!(result.data.items.len(), 5);
    }

    #[tokio::test]
    async fn test_missing_provider() {
        let err = orchestrator(AggregatorSettings::default(), vec![])
            .fetch_videos(&ModelQuery::new(5, 0))
            .await
            .unwrap_err();
        assert!(matches!(err, AggregatorError::ProviderUnavailable(ProviderKind::Vpapi)));
    }

    #[tokio::test]
    async fn test_mixed_partial_failure_and_seed() {
        let build = || {
            orchestrator(
                AggregatorSettings::default(),
                vec![
                    FakeProvider::new(ProviderKind::Awe, 20),
                    FakeProvider::failing(ProviderKind::Vpapi),
                    FakeProvider::new(ProviderKind::Free, 20),
                ],
            )
        };
        let query = ModelQuery::new(9, 0).with_seed(42);

        let first = build().fetch_mixed_models(&query).await.unwrap();
        let second = build().fetch_mixed_models(&query).await.unwrap();

        assert_eq!(first.origin, Origin::Live);
        // 3 per provider, one provider down
        assert_eq!(first.data.items.len(), 6);
        assert_eq!(first.data, second.data);
        assert!(!first.data.pagination.has_more);
        assert!(first.data.items.iter().any(|m| m.provider == ProviderKind::Awe));
        assert!(first.data.items.iter().any(|m| m.provider == ProviderKind::Free));
    }

    #[tokio::test]
    async fn test_mixed_total_failure() {
        let providers = || {
            vec![
                FakeProvider::failing(ProviderKind::Awe),
                FakeProvider::failing(ProviderKind::Free),
            ]
        };

        let err = orchestrator(AggregatorSettings::default(), providers())
            .fetch_mixed_models(&ModelQuery::new(6, 0))
            .await
            .unwrap_err();
        assert!(matches!(err, AggregatorError::AllProvidersFailed(_)));

        let settings = AggregatorSettings {
            mock_fallback: true,
            mix_seed: Some(7),
        };
        let result = orchestrator(settings, providers())
            .fetch_mixed_models(&ModelQuery::new(6, 0))
            .await
            .unwrap();
        assert_eq!(result.origin, Origin::Fallback);
        assert_eq!(result.data.items.len(), 6);
    }

    #[tokio::test]
    async fn test_categories_merge() {
        let o = orchestrator(
            AggregatorSettings::default(),
            vec![
                FakeProvider::new(ProviderKind::Awe, 0).with_categories(vec![
                    category("girls", ProviderKind::Awe, &["fetish"]),
                    category("boys", ProviderKind::Awe, &[]),
                ]),
                FakeProvider::failing(ProviderKind::Vpapi),
                FakeProvider::new(ProviderKind::Free, 0).with_categories(vec![
                    category("couples", ProviderKind::Free, &[]),
                    category("girls", ProviderKind::Free, &["fetish", "feet"]),
                ]),
            ],
        );

        let taxonomy = o.fetch_categories().await;
        let slugs: Vec<_> = taxonomy.categories.iter().map(|c| c.slug.as_str()).collect();
        assert_eq!(slugs, vec!["girls", "boys", "couples"]);

        let girls = taxonomy.find("Girls").unwrap();
        assert_eq!(girls.providers, vec![ProviderKind::Awe, ProviderKind::Free]);
        assert_eq!(girls.subcategories.len(), 2);
        assert_eq!(
            girls.subcategories[0].providers,
            vec![ProviderKind::Awe, ProviderKind::Free]
        );

        assert!(matches!(
            o.fetch_category("robots").await.unwrap_err(),
            AggregatorError::UnknownCategory(_)
        ));
    }
}
