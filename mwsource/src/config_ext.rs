//! Extension pour lire les paramètres des fournisseurs depuis mwconfig
//!
//! Settings live under `providers.<tag>` in the YAML configuration:
//!
//! ```yaml
//! providers:
//!   awe:
//!     base_url: "https://pt.ptawe.com/api"
//!     site_id: "1234"
//!     ps_id: "me"
//!     access_key: "secret"
//!     timeout_secs: 15
//! ```

use crate::http::DEFAULT_TIMEOUT_SECS;
use crate::models::ProviderKind;
use anyhow::Result;
use mwconfig::Config;
use serde_yaml::Value;
use std::time::Duration;

/// Credential keys each provider needs before it can be called
fn required_keys(provider: ProviderKind) -> &'static [&'static str] {
    match provider {
        ProviderKind::Awe => &["site_id", "ps_id", "access_key"],
        ProviderKind::Vpapi => &["ps_id", "access_key"],
        ProviderKind::Free => &["wm"],
    }
}

/// Trait d'extension pour la configuration des fournisseurs
///
/// # Exemple
///
/// ```rust,ignore
/// use mwconfig::get_config;
/// use mwsource::{ProviderConfigExt, ProviderKind};
///
/// let config = get_config();
/// let timeout = config.get_provider_timeout(ProviderKind::Free);
/// ```
pub trait ProviderConfigExt {
    /// Base URL of the provider API, if configured
    fn get_provider_base_url(&self, provider: ProviderKind) -> Option<String>;

    /// Request timeout, 15 s when unset or zero
    fn get_provider_timeout(&self, provider: ProviderKind) -> Duration;

    /// Any string setting under `providers.<tag>`
    fn get_provider_setting(&self, provider: ProviderKind, key: &str) -> Option<String>;

    /// Writes a setting under `providers.<tag>` and persists the config
    fn set_provider_setting(&self, provider: ProviderKind, key: &str, value: &str) -> Result<()>;

    /// True when every credential the provider requires is set
    fn is_provider_configured(&self, provider: ProviderKind) -> bool;
}

impl ProviderConfigExt for Config {
    fn get_provider_base_url(&self, provider: ProviderKind) -> Option<String> {
        self.get_provider_setting(provider, "base_url")
    }

    fn get_provider_timeout(&self, provider: ProviderKind) -> Duration {
        let secs = self
            .get_u64(&["providers", provider.as_str(), "timeout_secs"])
            .filter(|&s| s > 0)
            .unwrap_or(DEFAULT_TIMEOUT_SECS);
        Duration::from_secs(secs)
    }

    fn get_provider_setting(&self, provider: ProviderKind, key: &str) -> Option<String> {
        self.get_string(&["providers", provider.as_str(), key])
    }

    fn set_provider_setting(&self, provider: ProviderKind, key: &str, value: &str) -> Result<()> {
        self.set_value(
            &["providers", provider.as_str(), key],
            Value::String(value.to_string()),
        )
    }

    fn is_provider_configured(&self, provider: ProviderKind) -> bool {
        required_keys(provider)
            .iter()
            .all(|key| self.get_provider_setting(provider, key).is_some())
    }
}
