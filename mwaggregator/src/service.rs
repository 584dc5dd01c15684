//! Orchestrator with the response cache in front
//!
//! Reads hit the cache first unless the caller forces a refresh; only live
//! results are written back, so mock data never outlives the outage that
//! produced it.

use crate::config_ext::AggregatorConfigExt;
use crate::error::{AggregatorError, Result};
use crate::orchestrator::{ModelQuery, Orchestrator, Origin, Sourced, Taxonomy};
use mwcache::{CacheConfigExt, CacheKey, CacheTier, ResponseCache};
use mwconfig::Config;
use mwsource::{providers_from_config, Category, ModelPage, ProviderKind, VideoPage};
use serde::de::DeserializeOwned;
use serde::Serialize;
use std::future::Future;
use std::sync::Arc;
use tracing::debug;

/// Listing endpoints, each with its own cache namespace
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Listing {
    Models,
    FreeModels,
    MixedModels,
    Videos,
}

impl Listing {
    pub fn namespace(&self) -> &'static str {
        match self {
            Listing::Models => "models",
            Listing::FreeModels => "free-models",
            Listing::MixedModels => "mixed-models",
            Listing::Videos => "videos",
        }
    }

    /// TTL class of a listing; `/api/models` follows the requested provider
    pub fn tier(&self, provider: Option<ProviderKind>) -> CacheTier {
        match self {
            Listing::Models if provider == Some(ProviderKind::Free) => CacheTier::Free,
            Listing::Models | Listing::Videos => CacheTier::Premium,
            Listing::FreeModels | Listing::MixedModels => CacheTier::Free,
        }
    }
}

const TAXONOMY_NAMESPACE: &str = "categories";

/// Cache key of a listing query
///
/// Filters are prefixed so that a filter named like a reserved field cannot
/// collide with it.
pub fn listing_key(listing: Listing, query: &ModelQuery) -> CacheKey {
    let key = CacheKey::new(listing.namespace())
        .field("limit", query.limit)
        .field("offset", query.offset)
        .opt_field("category", query.category.as_deref())
        .opt_field("subcategory", query.subcategory.as_deref())
        .fields(query.filters.iter().map(|(k, v)| (format!("filter.{k}"), v)));

    match listing {
        Listing::Models => key.opt_field("provider", query.provider.map(|p| p.as_str())),
        Listing::MixedModels => key.opt_field("seed", query.seed),
        Listing::FreeModels | Listing::Videos => key,
    }
}

#[derive(Debug, Clone)]
pub struct CatalogService {
    orchestrator: Arc<Orchestrator>,
    cache: ResponseCache,
}

impl CatalogService {
    pub fn new(orchestrator: Orchestrator, cache: ResponseCache) -> Self {
        Self {
            orchestrator: Arc::new(orchestrator),
            cache,
        }
    }

    /// Adapters, cache backend and fallback settings from the configuration
    pub fn from_config(config: &Config) -> anyhow::Result<Self> {
        let orchestrator = Orchestrator::new(config.aggregator_settings())
            .with_providers(providers_from_config(config)?);
        let cache = config.build_response_cache()?;
        Ok(Self::new(orchestrator, cache))
    }

    pub fn orchestrator(&self) -> &Orchestrator {
        &self.orchestrator
    }

    pub fn cache(&self) -> &ResponseCache {
        &self.cache
    }

    async fn cached<T, F, Fut>(
        &self,
        key: CacheKey,
        tier: CacheTier,
        force_refresh: bool,
        fetch: F,
    ) -> Result<Sourced<T>>
    where
        T: Serialize + DeserializeOwned,
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<Sourced<T>>>,
    {
        if !force_refresh {
            if let Some(data) = self.cache.get_json::<T>(&key).await {
                return Ok(Sourced {
                    data,
                    origin: Origin::Cache,
                });
            }
        } else {
            debug!("Cache bypassed for {}", key.namespace());
        }

        let result = fetch().await?;
        if result.origin == Origin::Live {
            self.cache.put_json(&key, &result.data, tier).await;
        }
        Ok(result)
    }

    /// One of the model listings, cache first
    pub async fn models(
        &self,
        listing: Listing,
        query: &ModelQuery,
        force_refresh: bool,
    ) -> Result<Sourced<ModelPage>> {
        let key = listing_key(listing, query);
        let tier = listing.tier(query.provider);
        let orchestrator = &self.orchestrator;

        self.cached(key, tier, force_refresh, || async move {
            match listing {
                Listing::Models => orchestrator.fetch_models(query).await,
                Listing::FreeModels => orchestrator.fetch_free_models(query).await,
                Listing::MixedModels => orchestrator.fetch_mixed_models(query).await,
                // served by `videos`
                Listing::Videos => Err(AggregatorError::invalid("listing", listing.namespace())),
            }
        })
        .await
    }

    pub async fn videos(&self, query: &ModelQuery, force_refresh: bool) -> Result<Sourced<VideoPage>> {
        let listing = Listing::Videos;
        let key = listing_key(listing, query);
        let orchestrator = &self.orchestrator;

        self.cached(key, listing.tier(None), force_refresh, || async move {
            orchestrator.fetch_videos(query).await
        })
        .await
    }

    /// Merged taxonomy; an empty merge is not cached
    pub async fn categories(&self, force_refresh: bool) -> Result<Sourced<Taxonomy>> {
        let orchestrator = &self.orchestrator;

        self.cached(
            CacheKey::new(TAXONOMY_NAMESPACE),
            CacheTier::Taxonomy,
            force_refresh,
            || async move {
                let taxonomy = orchestrator.fetch_categories().await;
                let origin = if taxonomy.categories.is_empty() {
                    Origin::Fallback
                } else {
                    Origin::Live
                };
                Ok(Sourced {
                    data: taxonomy,
                    origin,
                })
            },
        )
        .await
    }

    /// One category of the merged taxonomy
    pub async fn category(&self, slug: &str, force_refresh: bool) -> Result<Sourced<Category>> {
        let taxonomy = self.categories(force_refresh).await?;
        let category = taxonomy
            .data
            .find(slug)
            .cloned()
            .ok_or_else(|| AggregatorError::UnknownCategory(slug.to_string()))?;

        Ok(Sourced {
            data: category,
            origin: taxonomy.origin,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_tiers() {
        assert_eq!(Listing::Models.tier(None), CacheTier::Premium);
        assert_eq!(Listing::Models.tier(Some(ProviderKind::Vpapi)), CacheTier::Premium);
        assert_eq!(Listing::Models.tier(Some(ProviderKind::Free)), CacheTier::Free);
        assert_eq!(Listing::FreeModels.tier(None), CacheTier::Free);
        assert_eq!(Listing::MixedModels.tier(None), CacheTier::Free);
        assert_eq!(Listing::Videos.tier(None), CacheTier::Premium);
    }

    #[test]
    fn test_listing_key_separates_namespaces_and_filters() {
        let mut query = ModelQuery::new(24, 0).with_category("girls");
        query.filters.insert("limit".to_string(), "evil".to_string());

        let models = listing_key(Listing::Models, &query).render();
        let free = listing_key(Listing::FreeModels, &query).render();

        assert!(models.starts_with("models:"));
        assert!(free.starts_with("free-models:"));
        assert!(models.contains(r#""filter.limit":"evil""#));
        assert!(models.contains(r#""limit":"24""#));

        let awe = listing_key(Listing::Models, &query.clone().with_provider(ProviderKind::Awe));
        assert_ne!(awe.render(), models);
    }
}
