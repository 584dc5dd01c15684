//! Couche HTTP commune aux adaptateurs
//!
//! Every provider issues exactly one GET per listing call. This module holds
//! the query builder and the request/response handling they share.

use crate::error::{Result, SourceError};
use crate::models::ProviderKind;
use reqwest::{Client, Response};
use serde::de::DeserializeOwned;
use std::time::Duration;
use tracing::{debug, warn};

/// Default timeout for upstream calls
pub const DEFAULT_TIMEOUT_SECS: u64 = 15;

/// User-Agent sent to the affiliate APIs
pub const DEFAULT_USER_AGENT: &str = concat!("mistressworld/", env!("CARGO_PKG_VERSION"));

/// Ordered list of query parameters
///
/// Parameters may repeat (`tag=a&tag=b`), which a map would not allow.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct QueryParams(Vec<(String, String)>);

impl QueryParams {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, name: impl Into<String>, value: impl ToString) -> &mut Self {
        self.0.push((name.into(), value.to_string()));
        self
    }

    /// Pushes only when `value` is present
    pub fn push_opt(&mut self, name: impl Into<String>, value: Option<impl ToString>) -> &mut Self {
        if let Some(value) = value {
            self.push(name, value);
        }
        self
    }

    /// Pushes one comma-joined parameter, skipped when `values` is empty
    pub fn push_list(&mut self, name: impl Into<String>, values: &[String]) -> &mut Self {
        if !values.is_empty() {
            self.push(name, values.join(","));
        }
        self
    }

    /// Appends already-translated filter parameters
    pub fn extend(&mut self, params: impl IntoIterator<Item = (String, String)>) -> &mut Self {
        self.0.extend(params);
        self
    }

    pub fn get(&self, name: &str) -> Option<&str> {
        self.0
            .iter()
            .find(|(n, _)| n == name)
            .map(|(_, v)| v.as_str())
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn as_slice(&self) -> &[(String, String)] {
        &self.0
    }
}

/// Builds the shared reqwest client used by an adapter
pub(crate) fn build_client(timeout: Duration) -> Result<Client> {
    Ok(Client::builder()
        .timeout(timeout)
        .user_agent(DEFAULT_USER_AGENT)
        .build()?)
}

/// Effectue une requête GET et décode la réponse JSON
///
/// Only the number of parameters is logged: they carry access keys.
pub(crate) async fn get_json<T: DeserializeOwned>(
    client: &Client,
    provider: ProviderKind,
    url: &str,
    params: &QueryParams,
) -> Result<T> {
    debug!(%provider, "GET {} with {} params", url, params.len());

    let response = client
        .get(url)
        .query(params.as_slice())
        .send()
        .await
        .map_err(SourceError::from_transport)?;

    handle_response(provider, response).await
}

/// Traite la réponse HTTP
async fn handle_response<T: DeserializeOwned>(provider: ProviderKind, response: Response) -> Result<T> {
    let status = response.status();

    debug!(%provider, "Response status: {}", status);

    if !status.is_success() {
        let error_text = response.text().await.unwrap_or_default();
        warn!(%provider, "API error ({}): {}", status.as_u16(), truncate(&error_text, 200));
        return Err(SourceError::from_status_code(status.as_u16(), error_text));
    }

    let text = response.text().await.map_err(SourceError::from_transport)?;

    serde_json::from_str(&text).map_err(|e| {
        warn!(%provider, "Failed to parse response: {}", e);
        SourceError::Payload(e.to_string())
    })
}

fn truncate(text: &str, max: usize) -> &str {
    match text.char_indices().nth(max) {
        Some((idx, _)) => &text[..idx],
        None => text,
    }
}

/// Joins a base URL and a path without doubling slashes
pub(crate) fn join_url(base: &str, path: &str) -> String {
    if path.is_empty() {
        return base.to_string();
    }
    format!(
        "{}/{}",
        base.trim_end_matches('/'),
        path.trim_start_matches('/')
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_query_params() {
        let mut params = QueryParams::new();
        params
            .push("limit", 10)
            .push_opt("tag", None::<&str>)
            .push_list("tags", &["a".to_string(), "b".to_string()])
            .push_list("empty", &[]);

        assert_eq!(params.len(), 2);
        assert_eq!(params.get("limit"), Some("10"));
        assert_eq!(params.get("tags"), Some("a,b"));
        assert_eq!(params.get("tag"), None);
    }

    #[test]
    fn test_join_url() {
        assert_eq!(join_url("http://x/api/", "/list"), "http://x/api/list");
        assert_eq!(join_url("http://x/api", "model/feed"), "http://x/api/model/feed");
        assert_eq!(join_url("http://x/rooms/", ""), "http://x/rooms/");
    }

    #[test]
    fn test_truncate() {
        assert_eq!(truncate("héllo", 2), "hé");
        assert_eq!(truncate("hi", 10), "hi");
    }
}
