//! Extension pour la configuration de l'agrégateur
//!
//! ```yaml
//! fallback:
//!   mock_data: false
//! aggregator:
//!   mix_seed: ~
//! ```

use crate::orchestrator::AggregatorSettings;
use anyhow::Result;
use mwconfig::Config;
use serde_yaml::Value;

pub trait AggregatorConfigExt {
    /// Serve mock data when an upstream fails (`fallback.mock_data`)
    fn get_mock_fallback(&self) -> bool;

    fn set_mock_fallback(&self, enabled: bool) -> Result<()>;

    /// Default shuffle seed of the mixed listing, if pinned
    fn get_mix_seed(&self) -> Option<u64>;

    /// Both settings at once
    fn aggregator_settings(&self) -> AggregatorSettings {
        AggregatorSettings {
            mock_fallback: self.get_mock_fallback(),
            mix_seed: self.get_mix_seed(),
        }
    }
}

impl AggregatorConfigExt for Config {
    fn get_mock_fallback(&self) -> bool {
        self.get_bool(&["fallback", "mock_data"]).unwrap_or(false)
    }

    fn set_mock_fallback(&self, enabled: bool) -> Result<()> {
        self.set_value(&["fallback", "mock_data"], Value::Bool(enabled))
    }

    fn get_mix_seed(&self) -> Option<u64> {
        self.get_u64(&["aggregator", "mix_seed"])
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_defaults_and_override() {
        let dir = TempDir::new().unwrap();
        let config = Config::load_config(dir.path().to_str().unwrap()).unwrap();

        assert_eq!(config.aggregator_settings(), AggregatorSettings::default());

        config.set_mock_fallback(true).unwrap();
        config
            .set_value(&["aggregator", "mix_seed"], Value::Number(42.into()))
            .unwrap();

        let settings = config.aggregator_settings();
        assert!(settings.mock_fallback);
        assert_eq!(settings.mix_seed, Some(42));
    }
}
