use lineage_core::{ErrorInfo, LineageError};
use serde::{Deserialize, Serialize};

/// Options for the size-bounded sampler.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SamplerConfig {
    /// Upper bound on the number of rendered nodes.
    #[serde(default = "default_max_nodes")]
    pub max_nodes: usize,
    /// Fixed sampling probability; derived from `max_nodes` when unset.
    #[serde(default)]
    pub sample_rate: Option<f64>,
    /// Fraction of children kept per node while rendering.
    #[serde(default)]
    pub prune_rate: Option<f64>,
    /// Deepest level rendered.
    #[serde(default)]
    pub max_level: Option<usize>,
    /// Master seed for the sampling and pruning substreams.
    #[serde(default)]
    pub seed: u64,
}

fn default_max_nodes() -> usize {
    500
}

impl Default for SamplerConfig {
    fn default() -> Self {
        Self {
            max_nodes: default_max_nodes(),
            sample_rate: None,
            prune_rate: None,
            max_level: None,
            seed: 0,
        }
    }
}

impl SamplerConfig {
    /// Checks that both rates are probabilities.
    pub fn validate(&self) -> Result<(), LineageError> {
        for (name, rate) in [("sample_rate", self.sample_rate), ("prune_rate", self.prune_rate)] {
            if let Some(rate) = rate {
                if !(0.0..=1.0).contains(&rate) {
                    return Err(LineageError::Config(
                        ErrorInfo::new("rate-out-of-range", "rates must lie in [0, 1]")
                            .with_context("field", name)
                            .with_context("value", rate),
                    ));
                }
            }
        }
        Ok(())
    }

    /// Sampling probability for a forest of `nodes` nodes. Oversamples by a
    /// factor of two to make up for nodes lost to pruning.
    pub fn effective_sample_rate(&self, nodes: usize) -> f64 {
        match self.sample_rate {
            Some(rate) => rate,
            None if nodes == 0 => 1.0,
            None => (2.0 * self.max_nodes as f64 / nodes as f64).min(1.0),
        }
    }
}
