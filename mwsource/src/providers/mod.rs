//! The three upstream adapters

pub mod awe;
pub mod free;
pub mod vpapi;

pub use awe::{AweClient, AweClientBuilder};
pub use free::{FreeClient, FreeClientBuilder};
pub use vpapi::{VpapiClient, VpapiClientBuilder};

use crate::config_ext::ProviderConfigExt;
use crate::error::Result;
use crate::models::ProviderKind;
use crate::provider::ModelProvider;
use mwconfig::Config;
use std::sync::Arc;
use tracing::warn;

/// Builds the adapter for `kind` from `providers.<tag>`
pub fn provider_from_config(kind: ProviderKind, config: &Config) -> Result<Arc<dyn ModelProvider>> {
    Ok(match kind {
        ProviderKind::Awe => Arc::new(AweClient::from_config(config)?),
        ProviderKind::Vpapi => Arc::new(VpapiClient::from_config(config)?),
        ProviderKind::Free => Arc::new(FreeClient::from_config(config)?),
    })
}

/// Builds the adapter of every configured provider, in [`ProviderKind::ALL`] order
///
/// A provider missing one of its credentials is left out, so requests routed
/// to it answer "unavailable" instead of hitting upstream with a bad query.
pub fn providers_from_config(config: &Config) -> Result<Vec<Arc<dyn ModelProvider>>> {
    let mut providers = Vec::with_capacity(ProviderKind::ALL.len());
    for kind in ProviderKind::ALL {
        if !config.is_provider_configured(kind) {
            warn!(provider = %kind, "Credentials missing, provider not registered");
            continue;
        }
        providers.push(provider_from_config(kind, config)?);
    }
    Ok(providers)
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn config_in(dir: &TempDir, yaml: &str) -> Config {
        std::fs::write(dir.path().join("config.yaml"), yaml).unwrap();
        Config::load_config(dir.path().to_str().unwrap()).unwrap()
    }

    fn kinds(providers: &[Arc<dyn ModelProvider>]) -> Vec<ProviderKind> {
        providers.iter().map(|p| p.kind()).collect()
    }

    #[test]
    fn test_unconfigured_providers_are_skipped() {
        let dir = TempDir::new().unwrap();
        let config = config_in(&dir, "{}\n");
        assert!(providers_from_config(&config).unwrap().is_empty());

        config
            .set_provider_setting(ProviderKind::Free, "wm", "abc12")
            .unwrap();
        config
            .set_provider_setting(ProviderKind::Vpapi, "ps_id", "me")
            .unwrap();
        assert_eq!(
            kinds(&providers_from_config(&config).unwrap()),
            vec![ProviderKind::Free]
        );

        config
            .set_provider_setting(ProviderKind::Vpapi, "access_key", "k")
            .unwrap();
        assert_eq!(
            kinds(&providers_from_config(&config).unwrap()),
            vec![ProviderKind::Vpapi, ProviderKind::Free]
        );
    }
}
