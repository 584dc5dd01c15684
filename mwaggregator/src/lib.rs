//! # mwaggregator - Agrégation du catalogue MistressWorld
//!
//! Ties the provider adapters of `mwsource`, the response cache of `mwcache`
//! and the HTTP host of `mwserver` together:
//!
//! - [`Orchestrator`] routes a listing request to one adapter, fans the mixed
//!   listing out to all of them, and merges the category trees
//! - [`CatalogService`] puts the response cache in front of it
//! - [`api_rest`] exposes the JSON routes under `/api`
//! - [`CatalogServerExt`] registers everything on a [`mwserver::Server`]
//!
//! ## Utilisation
//!
//! ```rust,no_run
//! use mwaggregator::{AggregatorSettings, CatalogService, ModelQuery, Orchestrator};
//! use mwcache::ResponseCache;
//! use mwsource::FreeClient;
//! use std::sync::Arc;
//!
//! # async fn example() -> anyhow::Result<()> {
//! let orchestrator = Orchestrator::new(AggregatorSettings::default())
//!     .with_provider(Arc::new(FreeClient::builder().wm("abc").build()?));
//! let service = CatalogService::new(orchestrator, ResponseCache::memory(1000));
//!
//! let page = service.orchestrator().fetch_free_models(&ModelQuery::new(24, 0)).await?;
//! println!("{} models", page.data.items.len());
//! # Ok(())
//! # }
//! ```

pub mod api_rest;
pub mod config_ext;
pub mod error;
pub mod orchestrator;
pub mod server_ext;
pub mod service;

pub use api_rest::{create_router, ApiDoc, AppError, CatalogState, ListingParams};
pub use config_ext::AggregatorConfigExt;
pub use error::{AggregatorError, Result};
pub use orchestrator::{
    sort_online_first, AggregatorSettings, ModelQuery, Orchestrator, Origin, Sourced, Taxonomy,
};
pub use server_ext::CatalogServerExt;
pub use service::{CatalogService, Listing};
