//! # Scoring Engine — Scope Resolution and Weighted Credit
//!
//! For a scope, resolve the applicable templates, read each tenant
//! status from the ledger, and fold the weighted credits:
//!
//! ```text
//! score = round(100 · Σ wᵢ·creditᵢ / Σ wᵢ)     over applicable rows
//! credit: fulfilled = 1.0, in-progress = 0.5, not-started = 0.0
//! not-applicable: excluded from numerator AND denominator
//! ```
//!
//! An empty denominator yields score `None` / status UNKNOWN, never a
//! crash and never a misleading number. A framework code or category
//! that resolves to nothing known is `UnknownScope`, never silently
//! treated as zero.

use std::collections::{BTreeMap, BTreeSet};

use serde::Serialize;

use grc_catalog::{CatalogStore, MappingIndex};
use grc_core::{EngineError, OrgId, TemplateId, Timestamp};
use grc_ledger::{FulfillmentLedger, FulfillmentStatus, OrgScope};

use crate::config::ScoringConfig;
use crate::snapshot::{ScoreScope, ScoreSnapshot};

/// The full scorecard surface consumed by dashboards.
#[derive(Debug, Clone, Serialize)]
pub struct Scorecard {
    /// Score over every active requirement.
    pub overall: ScoreSnapshot,
    /// Score per category.
    pub by_category: BTreeMap<String, ScoreSnapshot>,
    /// Score per framework code.
    pub by_framework: BTreeMap<String, ScoreSnapshot>,
}

/// The scoring engine. Holds only configuration; all state is read from
/// the catalog, mapping index, and ledger at computation time.
#[derive(Debug, Clone, Default)]
pub struct ScoringEngine {
    config: ScoringConfig,
}

impl ScoringEngine {
    /// Create an engine with the given configuration.
    pub fn new(config: ScoringConfig) -> Self {
        Self { config }
    }

    /// The active configuration.
    pub fn config(&self) -> &ScoringConfig {
        &self.config
    }

    /// Resolve a scope to the set of applicable template ids.
    ///
    /// # Errors
    ///
    /// `UnknownScope` for a framework code with no mapping or a category
    /// no active template carries.
    pub fn resolve_scope(
        &self,
        store: &CatalogStore,
        mapping: &MappingIndex,
        scope: &ScoreScope,
    ) -> Result<BTreeSet<TemplateId>, EngineError> {
        match scope {
            ScoreScope::Overall => Ok(store.iter_active().map(|t| t.id).collect()),
            ScoreScope::Framework(code) => {
                let template_id = mapping.resolve_code(code).map_err(|_| {
                    EngineError::UnknownScope {
                        scope: format!("framework:{code}"),
                    }
                })?;
                Ok(BTreeSet::from([template_id]))
            }
            ScoreScope::Category(category) => {
                let ids: BTreeSet<TemplateId> = store
                    .iter_active()
                    .filter(|t| &t.category == category)
                    .map(|t| t.id)
                    .collect();
                if ids.is_empty() {
                    return Err(EngineError::UnknownScope {
                        scope: format!("category:{category}"),
                    });
                }
                Ok(ids)
            }
        }
    }

    /// Compute one score snapshot. Read-only over every store.
    pub fn score(
        &self,
        store: &CatalogStore,
        mapping: &MappingIndex,
        ledger: &FulfillmentLedger,
        scope: &OrgScope,
        org: &OrgId,
        score_scope: ScoreScope,
    ) -> Result<ScoreSnapshot, EngineError> {
        let templates = self.resolve_scope(store, mapping, &score_scope)?;

        let mut numerator = 0.0;
        let mut denominator = 0.0;
        let mut contributing = 0usize;
        let mut fulfilled = 0usize;

        for template_id in &templates {
            let record = ledger.get(scope, org, template_id)?;
            let Some(credit) = record.status.credit() else {
                continue;
            };
            let weight = self.config.weight_for(template_id);
            numerator += weight * credit;
            denominator += weight;
            contributing += 1;
            if record.status == FulfillmentStatus::Fulfilled {
                fulfilled += 1;
            }
        }

        let score = if denominator > 0.0 {
            let raw = (100.0 * numerator / denominator).round();
            Some(raw.clamp(0.0, 100.0) as u8)
        } else {
            None
        };
        let status = self.config.status_for(score);

        tracing::debug!(
            %org,
            scope = %score_scope,
            ?score,
            %status,
            contributing,
            "score computed"
        );

        Ok(ScoreSnapshot {
            org: org.clone(),
            scope: score_scope,
            computed_at: Timestamp::now(),
            score,
            status,
            contributing_count: contributing,
            fulfilled_count: fulfilled,
        })
    }

    /// Compute the full scorecard: overall, per category, per framework
    /// code.
    pub fn scorecard(
        &self,
        store: &CatalogStore,
        mapping: &MappingIndex,
        ledger: &FulfillmentLedger,
        scope: &OrgScope,
        org: &OrgId,
    ) -> Result<Scorecard, EngineError> {
        let overall = self.score(store, mapping, ledger, scope, org, ScoreScope::Overall)?;

        let mut by_category = BTreeMap::new();
        for category in store.categories() {
            let snapshot = self.score(
                store,
                mapping,
                ledger,
                scope,
                org,
                ScoreScope::Category(category.clone()),
            )?;
            by_category.insert(category.as_str().to_string(), snapshot);
        }

        let mut by_framework = BTreeMap::new();
        for record in mapping.iter() {
            let snapshot = self.score(
                store,
                mapping,
                ledger,
                scope,
                org,
                ScoreScope::Framework(record.code.clone()),
            )?;
            by_framework.insert(record.code.as_str().to_string(), snapshot);
        }

        Ok(Scorecard {
            overall,
            by_category,
            by_framework,
        })
    }
}
