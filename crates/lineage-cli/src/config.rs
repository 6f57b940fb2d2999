use std::fs;
use std::path::Path;

use lineage_core::{ErrorInfo, LineageError};
use lineage_forest::SamplerConfig;
use lineage_trace::ParserConfig;
use serde::{Deserialize, Serialize};

/// YAML-configurable settings shared by every subcommand.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct AnalysisConfig {
    /// Trace parsing options.
    #[serde(default)]
    pub parser: ParserConfig,
    /// Sampler options for `sample`.
    #[serde(default)]
    pub sampler: SamplerConfig,
    /// Worker threads for `batch`; 0 lets rayon decide.
    #[serde(default)]
    pub concurrency: usize,
}

impl AnalysisConfig {
    /// Loads the configuration at `path`, or the defaults when no path is given.
    pub fn load(path: Option<&Path>) -> Result<Self, LineageError> {
        let Some(path) = path else {
            return Ok(Self::default());
        };
        let text = fs::read_to_string(path)
            .map_err(|err| LineageError::io("read-config", err).with_context("path", path.display()))?;
        let config = Self::from_yaml(&text).map_err(|err| err.with_context("path", path.display()))?;
        config.sampler.validate()?;
        Ok(config)
    }

    /// Parses a YAML document. An empty document yields the defaults.
    pub fn from_yaml(text: &str) -> Result<Self, LineageError> {
        if text.trim().is_empty() {
            return Ok(Self::default());
        }
        serde_yaml::from_str(text).map_err(|err| {
            LineageError::Config(
                ErrorInfo::new("parse-config", err.to_string())
                    .with_hint("expected keys: parser, sampler, concurrency"),
            )
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_document_is_default() {
        assert_eq!(AnalysisConfig::from_yaml("").unwrap(), AnalysisConfig::default());
    }

    #[test]
    fn partial_sections_keep_defaults() {
        let config = AnalysisConfig::from_yaml("sampler:\n  max_nodes: 40\n  seed: 3\nconcurrency: 2\n")
            .unwrap();
        assert_eq!(config.sampler.max_nodes, 40);
        assert_eq!(config.sampler.seed, 3);
        assert_eq!(config.sampler.sample_rate, None);
        assert!(config.parser.kernel_address_filter);
        assert_eq!(config.concurrency, 2);
    }

    #[test]
    fn out_of_range_rate_fails_on_load() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("bad.yaml");
        fs::write(&path, "sampler:\n  sample_rate: 3.0\n").unwrap();
        let err = AnalysisConfig::load(Some(&path)).unwrap_err();
        assert_eq!(err.info().code, "rate-out-of-range");
    }

    #[test]
    fn unknown_shape_is_a_config_error() {
        let err = AnalysisConfig::from_yaml("sampler: [1, 2]").unwrap_err();
        assert!(matches!(err, LineageError::Config(_)));
    }
}
