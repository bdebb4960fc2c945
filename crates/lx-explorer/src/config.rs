//! Explorer configuration, loadable from TOML.

use lx_log_core::EngineConfig;
use serde::Deserialize;

/// Top-level configuration for the explorer binary.
#[derive(Debug, Clone, Deserialize)]
pub struct ExplorerConfig {
    /// Engine tuning (`[engine.detector]`, `[engine.stats]`).
    #[serde(default)]
    pub engine: EngineConfig,
    /// Tracing filter used when `RUST_LOG` is unset.
    #[serde(default = "default_log_level")]
    pub log_level: String,
}

fn default_log_level() -> String {
    "info".to_string()
}

impl Default for ExplorerConfig {
    fn default() -> Self {
        Self {
            engine: EngineConfig::default(),
            log_level: default_log_level(),
        }
    }
}

impl ExplorerConfig {
    /// Load config from a TOML file path.
    pub fn from_file(path: &str) -> anyhow::Result<Self> {
        let contents = std::fs::read_to_string(path)?;
        let config: Self = toml::from_str(&contents)?;
        Ok(config)
    }
}
