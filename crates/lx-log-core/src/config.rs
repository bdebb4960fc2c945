//! Engine tuning knobs. Every field has a default, so an empty TOML table
//! (or no table at all) yields the stock behaviour.

use serde::Deserialize;

/// Top-level engine configuration.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct EngineConfig {
    #[serde(default)]
    pub detector: DetectorConfig,
    #[serde(default)]
    pub stats: StatsConfig,
}

/// Format detector settings.
#[derive(Debug, Clone, Deserialize)]
pub struct DetectorConfig {
    /// Number of non-empty lines sampled from the head of the file.
    #[serde(default = "default_sample_size")]
    pub sample_size: usize,
    /// Minimum fraction of sampled lines a format must fully match.
    /// Below it the `unstructured` fallback is chosen.
    #[serde(default = "default_min_match_ratio")]
    pub min_match_ratio: f64,
}

fn default_sample_size() -> usize {
    50
}

fn default_min_match_ratio() -> f64 {
    0.5
}

impl Default for DetectorConfig {
    fn default() -> Self {
        Self {
            sample_size: default_sample_size(),
            min_match_ratio: default_min_match_ratio(),
        }
    }
}

/// Stats aggregator settings.
#[derive(Debug, Clone, Deserialize)]
pub struct StatsConfig {
    /// Number of fixed-width buckets the primary-timestamp span is cut into.
    #[serde(default = "default_histogram_buckets")]
    pub histogram_buckets: usize,
}

fn default_histogram_buckets() -> usize {
    50
}

impl Default for StatsConfig {
    fn default() -> Self {
        Self {
            histogram_buckets: default_histogram_buckets(),
        }
    }
}
