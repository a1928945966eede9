//! # Engine Configuration
//!
//! One YAML document configures the whole engine: the dedup similarity
//! threshold and stopword additions, and the scoring thresholds and
//! weights. Missing sections fall back to defaults, so an empty document
//! is a valid configuration.

use serde::{Deserialize, Serialize};

use grc_catalog::DedupConfig;
use grc_core::EngineError;
use grc_score::ScoringConfig;

/// Top-level engine configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    /// Deduplication resolver settings.
    pub dedup: DedupConfig,
    /// Scoring engine settings.
    pub scoring: ScoringConfig,
}

impl EngineConfig {
    /// Load configuration from a YAML document.
    pub fn from_yaml(source: &str) -> Result<Self, EngineError> {
        let config: Self = serde_yaml::from_str(source)
            .map_err(|e| EngineError::Validation(format!("invalid engine config: {e}")))?;
        config.scoring.validate()?;
        Ok(config)
    }
}
