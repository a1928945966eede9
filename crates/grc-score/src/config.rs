//! # Scoring Configuration
//!
//! Thresholds and weights are deployment configuration. The defaults
//! match the shipped policy (compliant at 85, partial at 60, weight 1.0
//! per requirement), and a deployment overrides them with a YAML
//! document, not a code change.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use grc_core::{EngineError, TemplateId};

use crate::snapshot::ScoreStatus;

/// Scoring thresholds and per-requirement weights.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ScoringConfig {
    /// Scores at or above this are COMPLIANT.
    pub compliant_threshold: u8,
    /// Scores at or above this (and below compliant) are PARTIAL.
    pub partial_threshold: u8,
    /// Weight applied to requirements without an explicit override.
    pub default_weight: f64,
    /// Per-template weight overrides, for critical-control weighting.
    pub weights: HashMap<TemplateId, f64>,
}

impl Default for ScoringConfig {
    fn default() -> Self {
        Self {
            compliant_threshold: 85,
            partial_threshold: 60,
            default_weight: 1.0,
            weights: HashMap::new(),
        }
    }
}

impl ScoringConfig {
    /// Load configuration from a YAML document.
    pub fn from_yaml(source: &str) -> Result<Self, EngineError> {
        let config: Self = serde_yaml::from_str(source)
            .map_err(|e| EngineError::Validation(format!("invalid scoring config: {e}")))?;
        config.validate()?;
        Ok(config)
    }

    /// Validate threshold ordering and weight sanity.
    pub fn validate(&self) -> Result<(), EngineError> {
        if self.compliant_threshold > 100 {
            return Err(EngineError::Validation(format!(
                "compliant threshold {} exceeds 100",
                self.compliant_threshold
            )));
        }
        if self.partial_threshold > self.compliant_threshold {
            return Err(EngineError::Validation(format!(
                "partial threshold {} exceeds compliant threshold {}",
                self.partial_threshold, self.compliant_threshold
            )));
        }
        if !weight_ok(self.default_weight) {
            return Err(EngineError::Validation(format!(
                "default weight {} must be finite and positive",
                self.default_weight
            )));
        }
        for (template_id, weight) in &self.weights {
            if !weight_ok(*weight) {
                return Err(EngineError::Validation(format!(
                    "weight {weight} for {template_id} must be finite and positive"
                )));
            }
        }
        Ok(())
    }

    /// The weight for one requirement.
    pub fn weight_for(&self, template_id: &TemplateId) -> f64 {
        self.weights
            .get(template_id)
            .copied()
            .unwrap_or(self.default_weight)
    }

    /// Derive a status from a computed score. `None` (empty scope) is
    /// always UNKNOWN.
    pub fn status_for(&self, score: Option<u8>) -> ScoreStatus {
        match score {
            None => ScoreStatus::Unknown,
            Some(s) if s >= self.compliant_threshold => ScoreStatus::Compliant,
            Some(s) if s >= self.partial_threshold => ScoreStatus::Partial,
            Some(_) => ScoreStatus::NonCompliant,
        }
    }
}

fn weight_ok(w: f64) -> bool {
    w.is_finite() && w > 0.0
}
