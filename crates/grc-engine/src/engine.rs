//! # Compliance Engine — Facade and Transaction Boundary
//!
//! Owns the catalog store, mapping index, dedup resolver, fulfillment
//! ledger, scoring engine, audit trail, and snapshot history, and
//! exposes the operations the outer layers consume. Each mutating
//! operation performs its domain writes and audit appends under one
//! `&mut self` borrow; a failure anywhere surfaces as a typed error and
//! leaves no half-audited mutation behind.

use serde::{Deserialize, Serialize};
use serde_json::Value;

use grc_audit::{
    creation_draft, mutation_draft, AuditAction, AuditEvent, AuditFilter, AuditSink, AuditTrail,
    EntityKind,
};
use grc_catalog::normalize::repair_artifacts;
use grc_catalog::{
    CatalogStore, DedupDecision, DedupResolver, MappingIndex, MergeCandidate, RequirementTemplate,
    ReviewDisposition, TemplateContent,
};
use grc_core::{
    ActorId, CanonicalizationError, Category, EngineError, FrameworkCode, OrgId, TemplateId,
};
use grc_ledger::{FulfillmentLedger, FulfillmentPatch, OrgScope, TenantFulfillment};
use grc_score::{Scorecard, ScoreScope, ScoreSnapshot, ScoringEngine, SnapshotLog};

use crate::config::EngineConfig;

/// One requirement arriving from the content source.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct IngestRequest {
    /// The framework code citing this requirement.
    pub code: FrameworkCode,
    /// Human-readable framework name, e.g. "CIS Controls IG2".
    pub framework_display_name: String,
    /// Requirement title as published by the framework.
    pub title: String,
    /// Why the control matters.
    pub purpose: String,
    /// Raw implementation steps. Encoding artifacts are repaired here.
    pub steps: Vec<String>,
    /// Canonical category from the taxonomy mapping.
    pub category: Category,
}

/// What ingestion did with a requirement.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct IngestOutcome {
    /// The canonical template the framework code now resolves to.
    pub template_id: TemplateId,
    /// Whether a new template was created.
    pub created: bool,
    /// Whether the template was flagged for operator merge review.
    pub merge_candidate: bool,
}

/// Catalog listing filter. Fields are conjunctive.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct CatalogFilter {
    /// Restrict to one category.
    pub category: Option<Category>,
    /// Restrict to the template one framework code resolves to.
    pub framework_code: Option<FrameworkCode>,
}

/// Pagination window for catalog listings.
#[derive(Debug, Clone, Copy, Deserialize)]
#[serde(default)]
pub struct Page {
    /// Items to skip.
    pub offset: usize,
    /// Maximum items to return.
    pub limit: usize,
}

impl Default for Page {
    fn default() -> Self {
        Self {
            offset: 0,
            limit: 50,
        }
    }
}

/// The readiness engine.
#[derive(Debug)]
pub struct ComplianceEngine {
    store: CatalogStore,
    mapping: MappingIndex,
    dedup: DedupResolver,
    ledger: FulfillmentLedger,
    scoring: ScoringEngine,
    trail: AuditTrail,
    snapshots: SnapshotLog,
}

impl ComplianceEngine {
    /// Create an engine from configuration.
    pub fn new(config: EngineConfig) -> Self {
        Self {
            store: CatalogStore::new(),
            mapping: MappingIndex::new(),
            dedup: DedupResolver::new(&config.dedup),
            ledger: FulfillmentLedger::new(),
            scoring: ScoringEngine::new(config.scoring),
            trail: AuditTrail::new(),
            snapshots: SnapshotLog::new(),
        }
    }

    /// The catalog store, read-only.
    pub fn catalog(&self) -> &CatalogStore {
        &self.store
    }

    /// The mapping index, read-only.
    pub fn mappings(&self) -> &MappingIndex {
        &self.mapping
    }

    /// The audit trail, read-only.
    pub fn audit(&self) -> &AuditTrail {
        &self.trail
    }

    /// The retained snapshot history, read-only.
    pub fn snapshots(&self) -> &SnapshotLog {
        &self.snapshots
    }

    // ─── Ingestion ───────────────────────────────────────────────────

    /// Ingest one requirement under a framework code.
    ///
    /// Runs the three-tier dedup decision: exact normalized match maps
    /// the code onto the existing template; a near duplicate is stored
    /// but flagged for operator review; anything else becomes a new
    /// canonical template. Idempotent per (code, content) pair, so a
    /// partially failed bulk import can be re-run safely.
    pub fn ingest(
        &mut self,
        actor: &ActorId,
        request: IngestRequest,
    ) -> Result<IngestOutcome, EngineError> {
        let IngestRequest {
            code,
            framework_display_name,
            title,
            purpose,
            steps,
            category,
        } = request;

        // Repair encoding artifacts before anything is hashed or stored.
        let content = TemplateContent::new(
            repair_artifacts(&title),
            repair_artifacts(&purpose),
            steps.iter().map(|s| repair_artifacts(s)).collect(),
        )?;

        match self.dedup.decide(&content.title, &content.steps)? {
            DedupDecision::ExactMatch(existing) => {
                tracing::info!(%code, template_id = %existing, "ingest: exact duplicate collapsed");
                self.map_code_audited(actor, code, framework_display_name, existing)?;
                Ok(IngestOutcome {
                    template_id: existing,
                    created: false,
                    merge_candidate: false,
                })
            }
            DedupDecision::NearDuplicate { closest, similarity } => {
                tracing::info!(
                    %code,
                    closest = %closest,
                    similarity,
                    "ingest: near duplicate, flagging for review"
                );
                let template_id = self.create_template_audited(actor, content.clone(), category)?;
                let candidate =
                    self.dedup
                        .flag_candidate(template_id, closest, similarity, code.clone());
                self.trail.record(creation_draft(
                    actor,
                    EntityKind::MergeCandidate,
                    template_id.to_string(),
                    AuditAction::MergeCandidateFlagged,
                    state_json(&candidate)?,
                ));
                self.map_code_audited(actor, code, framework_display_name, template_id)?;
                Ok(IngestOutcome {
                    template_id,
                    created: true,
                    merge_candidate: true,
                })
            }
            DedupDecision::New => {
                tracing::debug!(%code, "ingest: new canonical requirement");
                let template_id = self.create_template_audited(actor, content, category)?;
                self.map_code_audited(actor, code, framework_display_name, template_id)?;
                Ok(IngestOutcome {
                    template_id,
                    created: true,
                    merge_candidate: false,
                })
            }
        }
    }

    fn create_template_audited(
        &mut self,
        actor: &ActorId,
        content: TemplateContent,
        category: Category,
    ) -> Result<TemplateId, EngineError> {
        let title = content.title.clone();
        let steps = content.steps.clone();
        let put = self.store.put_template(content, category)?;
        if put.created {
            let after = state_json(self.store.get_template(&put.id)?)?;
            self.dedup.register(put.id, &title, &steps)?;
            self.trail.record(creation_draft(
                actor,
                EntityKind::Template,
                put.id.to_string(),
                AuditAction::TemplateCreated,
                after,
            ));
        }
        Ok(put.id)
    }

    fn map_code_audited(
        &mut self,
        actor: &ActorId,
        code: FrameworkCode,
        framework_display_name: String,
        template_id: TemplateId,
    ) -> Result<(), EngineError> {
        let outcome =
            self.mapping
                .map_code(&self.store, code.clone(), framework_display_name, template_id)?;
        if !outcome.changed {
            // The code already pointed here; nothing mutated, nothing to audit.
            return Ok(());
        }
        let after = state_json(self.mapping.get_mapping(&code)?)?;
        let draft = match outcome.replaced {
            Some(old) => mutation_draft(
                actor,
                EntityKind::Mapping,
                code.to_string(),
                AuditAction::CodeRemapped,
                serde_json::json!({ "code": code.as_str(), "template_id": old }),
                after,
            ),
            None => creation_draft(
                actor,
                EntityKind::Mapping,
                code.to_string(),
                AuditAction::CodeMapped,
                after,
            ),
        };
        self.trail.record(draft);
        Ok(())
    }

    // ─── Catalog queries ─────────────────────────────────────────────

    /// Fetch one template (active or superseded).
    pub fn get_template(&self, id: &TemplateId) -> Result<RequirementTemplate, EngineError> {
        Ok(self.store.get_template(id)?.clone())
    }

    /// List active templates matching a filter, paginated, in a stable
    /// (category, title, id) order.
    pub fn list_catalog(
        &self,
        filter: &CatalogFilter,
        page: Page,
    ) -> Result<Vec<RequirementTemplate>, EngineError> {
        let code_target = match &filter.framework_code {
            Some(code) => Some(self.mapping.resolve_code(code)?),
            None => None,
        };
        let mut items: Vec<&RequirementTemplate> = self
            .store
            .iter_active()
            .filter(|t| {
                filter
                    .category
                    .as_ref()
                    .map_or(true, |category| &t.category == category)
            })
            .filter(|t| code_target.map_or(true, |id| t.id == id))
            .collect();
        items.sort_by(|a, b| {
            (&a.category, &a.content.title, a.id).cmp(&(&b.category, &b.content.title, b.id))
        });
        Ok(items
            .into_iter()
            .skip(page.offset)
            .take(page.limit)
            .cloned()
            .collect())
    }

    /// Replace a template's content with a new version.
    ///
    /// The old version is retained and every framework code pointing at
    /// it is re-pointed to the successor, each re-point audited. The
    /// caller supplies the version it edited; a stale version loses with
    /// `Conflict` and must re-read.
    pub fn supersede_template(
        &mut self,
        actor: &ActorId,
        old_id: &TemplateId,
        expected_version: u64,
        title: &str,
        purpose: &str,
        steps: Vec<String>,
        new_category: Option<Category>,
    ) -> Result<TemplateId, EngineError> {
        let content = TemplateContent::new(
            repair_artifacts(title),
            repair_artifacts(purpose),
            steps.iter().map(|s| repair_artifacts(s)).collect(),
        )?;
        let before = self.store.get_template(old_id)?.clone();
        let outcome = self
            .store
            .supersede(old_id, expected_version, content.clone(), new_category)?;

        self.dedup
            .unregister(old_id, &before.content.title, &before.content.steps)?;
        self.dedup
            .register(outcome.new_id, &content.title, &content.steps)?;

        let after = state_json(self.store.get_template(old_id)?)?;
        self.trail.record(mutation_draft(
            actor,
            EntityKind::Template,
            old_id.to_string(),
            AuditAction::TemplateSuperseded,
            state_json(&before)?,
            after,
        ));

        self.repoint_codes_audited(actor, old_id, outcome.new_id)?;
        tracing::info!(old = %old_id, new = %outcome.new_id, version = outcome.new_version, "template superseded");
        Ok(outcome.new_id)
    }

    fn repoint_codes_audited(
        &mut self,
        actor: &ActorId,
        from: &TemplateId,
        to: TemplateId,
    ) -> Result<(), EngineError> {
        for code in self.mapping.repoint_all(from, to) {
            let after = state_json(self.mapping.get_mapping(&code)?)?;
            self.trail.record(mutation_draft(
                actor,
                EntityKind::Mapping,
                code.to_string(),
                AuditAction::CodeRemapped,
                serde_json::json!({ "code": code.as_str(), "template_id": from }),
                after,
            ));
        }
        Ok(())
    }

    // ─── Merge review ────────────────────────────────────────────────

    /// Merge candidates awaiting operator review.
    pub fn review_queue(&self) -> Vec<MergeCandidate> {
        self.dedup.open_candidates().cloned().collect()
    }

    /// Resolve an open merge candidate.
    ///
    /// `Merged` absorbs the candidate template into its canonical
    /// counterpart and re-points its framework codes; `Dismissed` keeps
    /// both templates as intentional duplicates. Either way the queue
    /// entry closes and the decision is audited.
    pub fn resolve_merge_candidate(
        &mut self,
        actor: &ActorId,
        template_id: &TemplateId,
        disposition: ReviewDisposition,
    ) -> Result<MergeCandidate, EngineError> {
        // Store-side effects must succeed before the queue entry closes,
        // so peek the open candidate first.
        let pending = self
            .dedup
            .open_candidates()
            .find(|c| &c.template_id == template_id)
            .cloned()
            .ok_or_else(|| EngineError::not_found("merge_candidate", template_id))?;

        if disposition == ReviewDisposition::Merged {
            // The canonical counterpart may itself have been superseded
            // since the candidate was flagged; merge into the chain head.
            let target = self.store.resolve_current(&pending.canonical_id)?;
            let before = self.store.get_template(template_id)?.clone();
            self.store.absorb(template_id, &target)?;
            self.dedup
                .unregister(template_id, &before.content.title, &before.content.steps)?;
            let after = state_json(self.store.get_template(template_id)?)?;
            self.trail.record(mutation_draft(
                actor,
                EntityKind::Template,
                template_id.to_string(),
                AuditAction::TemplateSuperseded,
                state_json(&before)?,
                after,
            ));
            self.repoint_codes_audited(actor, template_id, target)?;
        }

        let resolved = self.dedup.resolve_candidate(template_id, disposition)?;
        let action = match disposition {
            ReviewDisposition::Merged => AuditAction::MergeCandidateMerged,
            ReviewDisposition::Dismissed => AuditAction::MergeCandidateDismissed,
            ReviewDisposition::Open => unreachable!("resolver rejects Open"),
        };
        self.trail.record(mutation_draft(
            actor,
            EntityKind::MergeCandidate,
            template_id.to_string(),
            action,
            state_json(&pending)?,
            state_json(&resolved)?,
        ));
        Ok(resolved)
    }

    // ─── Tenant ledger ───────────────────────────────────────────────

    /// Read a tenant's fulfillment record for a template. Untouched
    /// pairs yield the implicit not-started record.
    pub fn get_fulfillment(
        &self,
        scope: &OrgScope,
        org: &OrgId,
        template_id: &TemplateId,
    ) -> Result<TenantFulfillment, EngineError> {
        self.store.get_template(template_id)?;
        self.ledger.get(scope, org, template_id)
    }

    /// Apply a patch to a tenant's fulfillment record.
    ///
    /// `expected_version: Some(v)` is compare-and-set; `None` is
    /// last-writer-wins. The write and its audit event commit together.
    pub fn update_fulfillment(
        &mut self,
        scope: &OrgScope,
        org: &OrgId,
        template_id: &TemplateId,
        patch: &FulfillmentPatch,
        expected_version: Option<u64>,
    ) -> Result<TenantFulfillment, EngineError> {
        let template = self.store.get_template(template_id)?;
        if !template.is_active() {
            return Err(EngineError::Validation(format!(
                "template {template_id} is superseded; track against its successor"
            )));
        }

        let write = self
            .ledger
            .update(scope, org, template_id, patch, expected_version)?;

        let before = match &write.before {
            Some(record) => Some(state_json(record)?),
            None => None,
        };
        self.trail.record(grc_audit::EventDraft {
            actor: scope.actor.clone(),
            entity_kind: EntityKind::Fulfillment,
            entity_id: format!("{}/{}", org, template_id),
            action: AuditAction::FulfillmentUpdated,
            before,
            after: state_json(&write.after)?,
        });
        Ok(write.after)
    }

    // ─── Scoring ─────────────────────────────────────────────────────

    /// Compute the full scorecard for an organization: overall, per
    /// category, per framework code. Snapshots are retained for trends.
    pub fn get_org_scorecard(
        &mut self,
        scope: &OrgScope,
        org: &OrgId,
    ) -> Result<Scorecard, EngineError> {
        let card = self
            .scoring
            .scorecard(&self.store, &self.mapping, &self.ledger, scope, org)?;
        self.snapshots.push(card.overall.clone());
        for snapshot in card.by_category.values().chain(card.by_framework.values()) {
            self.snapshots.push(snapshot.clone());
        }
        Ok(card)
    }

    /// Compute one score snapshot for a specific scope.
    pub fn score_scope(
        &mut self,
        scope: &OrgScope,
        org: &OrgId,
        score_scope: ScoreScope,
    ) -> Result<ScoreSnapshot, EngineError> {
        let snapshot =
            self.scoring
                .score(&self.store, &self.mapping, &self.ledger, scope, org, score_scope)?;
        self.snapshots.push(snapshot.clone());
        Ok(snapshot)
    }

    // ─── Audit ───────────────────────────────────────────────────────

    /// Query the audit trail, ordered by (timestamp, sequence) ascending.
    pub fn get_audit_trail(&self, filter: &AuditFilter) -> Vec<AuditEvent> {
        self.trail.query(filter).cloned().collect()
    }
}

impl Default for ComplianceEngine {
    fn default() -> Self {
        Self::new(EngineConfig::default())
    }
}

/// Serialize an entity state for an audit event.
fn state_json<T: Serialize>(value: &T) -> Result<Value, EngineError> {
    serde_json::to_value(value)
        .map_err(|e| EngineError::Canonicalization(CanonicalizationError::SerializationFailed(e)))
}
