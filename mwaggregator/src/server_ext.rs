//! Extension de mwserver::Server pour publier le catalogue
//!
//! `mwserver` stays a generic HTTP host; this trait plugs the catalog routes
//! and their Swagger UI into it.

use crate::api_rest::{create_router, ApiDoc, CatalogState};
use crate::service::CatalogService;
use anyhow::Result;
use mwconfig::get_config;
use mwserver::Server;
use std::sync::Arc;
use tracing::info;
use utoipa::OpenApi;

/// Trait d'extension pour ajouter le catalogue à un serveur mwserver
///
/// # Exemple
///
/// ```rust,no_run
/// use mwaggregator::CatalogServerExt;
/// use mwserver::ServerBuilder;
///
/// #[tokio::main]
/// async fn main() -> anyhow::Result<()> {
///     let mut server = ServerBuilder::new_configured().build();
///     server.init_catalog_configured().await?;
///
///     server.start().await?;
///     server.wait().await;
///     Ok(())
/// }
/// ```
pub trait CatalogServerExt {
    /// Enregistre les routes du catalogue
    ///
    /// # Routes enregistrées
    ///
    /// - `GET /api/models` - Models from one provider
    /// - `GET /api/free-models` - Free-cam models
    /// - `GET /api/mixed-models` - Shuffled models from every provider
    /// - `GET /api/videos` - Videos
    /// - `GET /api/categories` - Merged category tree
    /// - `GET /api/categories/{category}` - One category
    /// - `GET /swagger-ui/catalog` - Documentation interactive
    async fn init_catalog(&mut self, service: CatalogService) -> Arc<CatalogService>;

    /// Builds the service from `mwconfig` and registers it
    ///
    /// Adapters come from `providers.*`, the cache from `cache.*` and the
    /// fallback switch from `fallback.mock_data`.
    async fn init_catalog_configured(&mut self) -> Result<Arc<CatalogService>>;
}

impl CatalogServerExt for Server {
    async fn init_catalog(&mut self, service: CatalogService) -> Arc<CatalogService> {
        let state = CatalogState::new(service);
        let service = state.service.clone();

        self.add_openapi("/", create_router(state), ApiDoc::openapi(), "catalog")
            .await;

        info!(
            providers = ?service.orchestrator().provider_kinds(),
            cache = service.cache().backend_name(),
            "Catalog API registered at /api"
        );
        service
    }

    async fn init_catalog_configured(&mut self) -> Result<Arc<CatalogService>> {
        let service = CatalogService::from_config(&get_config())?;
        Ok(self.init_catalog(service).await)
    }
}
