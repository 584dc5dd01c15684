//! # mwsource - Affiliate provider adapters
//!
//! Normalized access to the three upstream feeds aggregated by MistressWorld:
//!
//! - **AWE**: premium model feed ([`AweClient`])
//! - **VPAPI**: premium video feed ([`VpapiClient`])
//! - **FREE**: free-cam feed ([`FreeClient`])
//!
//! Each adapter implements [`ModelProvider`]: it takes a canonical
//! [`ModelRequest`], translates it into the provider's own query dialect
//! (including canonical filters through [`FILTER_MAP`]), issues a single GET
//! and maps the payload into [`ModelListing`] / [`VideoListing`] pages with
//! [`Pagination`] metadata.
//!
//! ## Usage
//!
//! ```rust,ignore
//! use mwsource::{AweClient, ModelProvider, ModelRequest};
//!
//! let awe = AweClient::builder()
//!     .site_id("1234")
//!     .ps_id("me")
//!     .access_key("secret")
//!     .build()?;
//!
//! let page = awe
//!     .fetch_models(&ModelRequest::new(24, 0).with_category("girls"))
//!     .await?;
//! println!("{} models, more: {}", page.items.len(), page.pagination.has_more);
//! ```
//!
//! The [`mock`] module produces deterministic placeholder pages used when an
//! upstream is down and the fallback is enabled.

pub mod config_ext;
pub mod error;
pub mod filters;
pub mod http;
pub mod mock;
pub mod models;
pub mod pagination;
pub mod provider;
pub mod providers;

pub use config_ext::ProviderConfigExt;
pub use error::{Result, SourceError};
pub use filters::{map_filters_to_provider, FilterRule, ProviderParam, FILTER_MAP};
pub use models::{
    slugify, Category, Filters, ModelListing, ModelPage, ModelRequest, ProviderKind, Subcategory,
    UnknownProvider, VideoListing, VideoPage,
};
pub use pagination::Pagination;
pub use provider::ModelProvider;
pub use providers::{
    provider_from_config, providers_from_config, AweClient, FreeClient, VpapiClient,
};
