//! The adapter trait implemented by every upstream provider

use crate::error::{Result, SourceError};
use crate::models::{Category, ModelPage, ModelRequest, ProviderKind, VideoPage};
use std::fmt::Debug;

/// An upstream affiliate feed
///
/// Implementations translate a canonical [`ModelRequest`] into their own
/// query dialect, issue a single HTTP call and normalize the answer. They must
/// be `Send + Sync` to be shared across request tasks behind an `Arc`.
///
/// # Example
///
/// ```rust,ignore
/// use mwsource::{ModelProvider, ModelRequest};
///
/// let page = provider.fetch_models(&ModelRequest::new(24, 0).with_category("girls")).await?;
/// for model in &page.items {
///     println!("{} ({} viewers)", model.name, model.viewer_count);
/// }
/// ```
#[async_trait::async_trait]
pub trait ModelProvider: Debug + Send + Sync {
    /// Which provider this adapter talks to
    fn kind(&self) -> ProviderKind;

    /// Fetches one page of models
    async fn fetch_models(&self, request: &ModelRequest) -> Result<ModelPage>;

    /// Fetches one page of videos
    ///
    /// Only the video feed offers this; others keep the default.
    async fn fetch_videos(&self, _request: &ModelRequest) -> Result<VideoPage> {
        Err(SourceError::Unsupported {
            provider: self.kind().label(),
            operation: "fetch_videos",
        })
    }

    /// Categories this provider can serve
    async fn categories(&self) -> Result<Vec<Category>>;
}
