//! Layered configuration for pipeline runs.

use poise_core::{Error, Result};
use serde::{Deserialize, Serialize};

use crate::aggregator::AggregatorConfig;
use crate::pipeline::PipelineConfig;

/// Prefix of environment overrides, e.g. `POISE_PIPELINE__SKIP_FRAMES=2`
pub const ENV_PREFIX: &str = "POISE";

/// Complete run configuration
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct PoiseConfig {
    /// Frame sampling and prefetching
    pub pipeline: PipelineConfig,

    /// Temporal aggregation
    pub aggregator: AggregatorConfig,
}

fn environment() -> config::Environment {
    config::Environment::with_prefix(ENV_PREFIX)
        .prefix_separator("_")
        .separator("__")
        .try_parsing(true)
}

impl PoiseConfig {
    /// Load configuration from file, overridden by the environment
    pub fn from_file(path: &str) -> Result<Self> {
        let settings = config::Config::builder()
            .add_source(config::File::with_name(path))
            .add_source(environment())
            .build()
            .map_err(|e| Error::Config(e.to_string()))?;

        settings
            .try_deserialize()
            .map_err(|e| Error::Config(e.to_string()))
    }

    /// Load from environment variables
    pub fn from_env() -> Result<Self> {
        let settings = config::Config::builder()
            .add_source(environment())
            .build()
            .map_err(|e| Error::Config(e.to_string()))?;

        settings
            .try_deserialize()
            .map_err(|e| Error::Config(e.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = PoiseConfig::default();
        assert_eq!(config.pipeline.skip_frames, 0);
        assert_eq!(config.pipeline.prefetch_depth, 8);
        assert_eq!(config.aggregator.processing_method, "division_5_groupes");
    }

    #[test]
    fn test_missing_file_is_config_error() {
        let err = PoiseConfig::from_file("does/not/exist/poise").unwrap_err();
        assert!(matches!(err, Error::Config(_)));
    }

    #[test]
    fn test_partial_file_keeps_defaults() {
        let path = std::env::temp_dir().join("poise_partial_config.json");
        std::fs::write(&path, r#"{ "pipeline": { "skip_frames": 3 } }"#).unwrap();

        let config = PoiseConfig::from_file(path.to_str().unwrap()).unwrap();
        assert_eq!(config.pipeline.skip_frames, 3);
        assert_eq!(config.pipeline.progress_interval, 20);
        assert_eq!(config.aggregator, AggregatorConfig::default());

        std::fs::remove_file(&path).unwrap();
    }
}
