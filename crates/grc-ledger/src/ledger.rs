//! # Fulfillment Ledger — Org-Scoped Store
//!
//! Every call carries an authenticated `OrgScope`. The scope's
//! organization must equal the target organization of the row being
//! read or written; anything else is an authorization failure before a
//! single row is inspected, so a caller can never learn whether another
//! tenant has touched a template.
//!
//! Writes take `expected_version: Option<u64>`. `Some(v)` is a
//! compare-and-set that loses with `Conflict` when the stored version
//! moved; `None` is last-writer-wins, acceptable for human-paced edits
//! because the audit trail preserves the full history either way.

use std::collections::HashMap;

use grc_core::{ActorId, EngineError, OrgId, TemplateId, Timestamp};

use crate::fulfillment::{FulfillmentPatch, TenantFulfillment};

/// An authenticated organization scope, supplied by the identity
/// provider for every ledger call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OrgScope {
    /// The organization the caller is authenticated for.
    pub org: OrgId,
    /// The acting user or service.
    pub actor: ActorId,
}

impl OrgScope {
    /// Construct a scope.
    pub fn new(org: OrgId, actor: ActorId) -> Self {
        Self { org, actor }
    }

    /// Enforce that this scope may touch rows of `target` org.
    fn authorize(&self, target: &OrgId) -> Result<(), EngineError> {
        if &self.org != target {
            tracing::warn!(
                scope = %self.org,
                "cross-tenant ledger access rejected"
            );
            return Err(EngineError::Authorization {
                scope_org: self.org.to_string(),
            });
        }
        Ok(())
    }
}

/// Outcome of a ledger write: the state before (None when the row was
/// implicit) and after, for auditing.
#[derive(Debug, Clone)]
pub struct LedgerWrite {
    /// Persisted state before the write; `None` on first materialization.
    pub before: Option<TenantFulfillment>,
    /// State after the write.
    pub after: TenantFulfillment,
}

/// The tenant fulfillment ledger.
#[derive(Debug, Default)]
pub struct FulfillmentLedger {
    records: HashMap<(OrgId, TemplateId), TenantFulfillment>,
}

impl FulfillmentLedger {
    /// Create an empty ledger.
    pub fn new() -> Self {
        Self::default()
    }

    /// Read a fulfillment record.
    ///
    /// Untouched (org, template) pairs yield the implicit not-started
    /// record without persisting anything, so the ledger does not bloat
    /// with rows for requirements no one has looked at.
    pub fn get(
        &self,
        scope: &OrgScope,
        org: &OrgId,
        template_id: &TemplateId,
    ) -> Result<TenantFulfillment, EngineError> {
        scope.authorize(org)?;
        Ok(self
            .records
            .get(&(org.clone(), *template_id))
            .cloned()
            .unwrap_or_else(|| TenantFulfillment::default_for(org.clone(), *template_id)))
    }

    /// Apply a patch to a fulfillment record, materializing it on first
    /// write.
    ///
    /// # Errors
    ///
    /// - `Authorization` when `scope` does not own `org`.
    /// - `Validation` for an empty or malformed patch.
    /// - `Conflict` when `expected_version` is stale.
    pub fn update(
        &mut self,
        scope: &OrgScope,
        org: &OrgId,
        template_id: &TemplateId,
        patch: &FulfillmentPatch,
        expected_version: Option<u64>,
    ) -> Result<LedgerWrite, EngineError> {
        scope.authorize(org)?;
        patch.validate()?;

        let key = (org.clone(), *template_id);
        let before = self.records.get(&key).cloned();
        let current = before
            .clone()
            .unwrap_or_else(|| TenantFulfillment::default_for(org.clone(), *template_id));

        if let Some(expected) = expected_version {
            if current.version != expected {
                return Err(EngineError::Conflict {
                    entity: "fulfillment",
                    id: format!("{}/{}", org, template_id),
                    expected_version: expected,
                    current_version: current.version,
                });
            }
        }

        let mut after = current;
        if let Some(status) = patch.status {
            after.status = status;
        }
        for evidence in &patch.attach_evidence {
            after.evidence.insert(evidence.clone());
        }
        for evidence in &patch.detach_evidence {
            after.evidence.remove(evidence);
        }
        for tag in &patch.add_tags {
            after.tags.insert(tag.clone());
        }
        for tag in &patch.remove_tags {
            after.tags.remove(tag);
        }
        if let Some(notes) = &patch.notes {
            after.notes = notes.clone();
        }
        after.last_modified_by = Some(scope.actor.clone());
        after.last_modified_at = Some(Timestamp::now());
        after.version += 1;

        self.records.insert(key, after.clone());
        Ok(LedgerWrite { before, after })
    }

    /// Iterate the persisted records of one organization.
    pub fn iter_org<'a>(
        &'a self,
        scope: &OrgScope,
        org: &'a OrgId,
    ) -> Result<impl Iterator<Item = &'a TenantFulfillment>, EngineError> {
        scope.authorize(org)?;
        Ok(self
            .records
            .iter()
            .filter(move |((record_org, _), _)| record_org == org)
            .map(|(_, record)| record))
    }

    /// Number of persisted records across all organizations.
    pub fn len(&self) -> usize {
        self.records.len()
    }

    /// Whether no records have been persisted.
    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fulfillment::FulfillmentStatus;

    fn org(slug: &str) -> OrgId {
        OrgId::new(slug).unwrap()
    }

    fn scope(slug: &str) -> OrgScope {
        OrgScope::new(org(slug), ActorId::new(format!("user@{slug}")).unwrap())
    }

    #[test]
    fn test_get_untouched_returns_default_without_persisting() {
        let ledger = FulfillmentLedger::new();
        let tid = TemplateId::new();
        let record = ledger.get(&scope("acme"), &org("acme"), &tid).unwrap();
        assert_eq!(record.status, FulfillmentStatus::NotStarted);
        assert_eq!(record.version, 0);
        assert!(ledger.is_empty());
    }

    #[test]
    fn test_first_write_materializes_record() {
        let mut ledger = FulfillmentLedger::new();
        let tid = TemplateId::new();
        let write = ledger
            .update(
                &scope("acme"),
                &org("acme"),
                &tid,
                &FulfillmentPatch::set_status(FulfillmentStatus::InProgress),
                None,
            )
            .unwrap();
        assert!(write.before.is_none());
        assert_eq!(write.after.status, FulfillmentStatus::InProgress);
        assert_eq!(write.after.version, 1);
        assert_eq!(ledger.len(), 1);
    }

    #[test]
    fn test_update_records_actor_and_time() {
        let mut ledger = FulfillmentLedger::new();
        let tid = TemplateId::new();
        let write = ledger
            .update(
                &scope("acme"),
                &org("acme"),
                &tid,
                &FulfillmentPatch::set_status(FulfillmentStatus::Fulfilled),
                None,
            )
            .unwrap();
        assert_eq!(
            write.after.last_modified_by,
            Some(ActorId::new("user@acme").unwrap())
        );
        assert!(write.after.last_modified_at.is_some());
    }

    #[test]
    fn test_evidence_and_tags_patch() {
        let mut ledger = FulfillmentLedger::new();
        let tid = TemplateId::new();
        let s = scope("acme");
        ledger
            .update(
                &s,
                &org("acme"),
                &tid,
                &FulfillmentPatch {
                    attach_evidence: vec!["doc://policy-v2".into(), "doc://scan-report".into()],
                    add_tags: vec!["q3-review".into()],
                    notes: Some("Pending CISO signoff".into()),
                    ..Default::default()
                },
                None,
            )
            .unwrap();
        let write = ledger
            .update(
                &s,
                &org("acme"),
                &tid,
                &FulfillmentPatch {
                    detach_evidence: vec!["doc://scan-report".into()],
                    remove_tags: vec!["q3-review".into()],
                    ..Default::default()
                },
                None,
            )
            .unwrap();
        assert_eq!(write.after.evidence.len(), 1);
        assert!(write.after.evidence.contains("doc://policy-v2"));
        assert!(write.after.tags.is_empty());
        assert_eq!(write.after.notes, "Pending CISO signoff");
        assert_eq!(write.after.version, 2);
    }

    #[test]
    fn test_compare_and_set_conflict() {
        let mut ledger = FulfillmentLedger::new();
        let tid = TemplateId::new();
        let s = scope("acme");
        ledger
            .update(&s, &org("acme"), &tid, &FulfillmentPatch::set_status(FulfillmentStatus::InProgress), Some(0))
            .unwrap();
        // A second writer based on version 0 loses the race.
        let result = ledger.update(
            &s,
            &org("acme"),
            &tid,
            &FulfillmentPatch::set_status(FulfillmentStatus::Fulfilled),
            Some(0),
        );
        match result {
            Err(EngineError::Conflict { current_version, .. }) => assert_eq!(current_version, 1),
            other => panic!("expected Conflict, got {other:?}"),
        }
    }

    #[test]
    fn test_last_writer_wins_without_version() {
        let mut ledger = FulfillmentLedger::new();
        let tid = TemplateId::new();
        let s = scope("acme");
        ledger
            .update(&s, &org("acme"), &tid, &FulfillmentPatch::set_status(FulfillmentStatus::InProgress), None)
            .unwrap();
        let write = ledger
            .update(&s, &org("acme"), &tid, &FulfillmentPatch::set_status(FulfillmentStatus::Fulfilled), None)
            .unwrap();
        assert_eq!(write.after.status, FulfillmentStatus::Fulfilled);
        assert_eq!(write.after.version, 2);
    }

    #[test]
    fn test_cross_tenant_read_rejected() {
        let mut ledger = FulfillmentLedger::new();
        let tid = TemplateId::new();
        ledger
            .update(
                &scope("globex"),
                &org("globex"),
                &tid,
                &FulfillmentPatch::set_status(FulfillmentStatus::Fulfilled),
                None,
            )
            .unwrap();
        // acme's scope cannot read globex's row, even with the template id.
        let result = ledger.get(&scope("acme"), &org("globex"), &tid);
        assert!(matches!(result, Err(EngineError::Authorization { .. })));
    }

    #[test]
    fn test_cross_tenant_write_rejected() {
        let mut ledger = FulfillmentLedger::new();
        let tid = TemplateId::new();
        let result = ledger.update(
            &scope("acme"),
            &org("globex"),
            &tid,
            &FulfillmentPatch::set_status(FulfillmentStatus::Fulfilled),
            None,
        );
        assert!(matches!(result, Err(EngineError::Authorization { .. })));
        assert!(ledger.is_empty());
    }

    #[test]
    fn test_orgs_with_same_template_are_isolated_rows() {
        let mut ledger = FulfillmentLedger::new();
        let tid = TemplateId::new();
        ledger
            .update(&scope("acme"), &org("acme"), &tid, &FulfillmentPatch::set_status(FulfillmentStatus::Fulfilled), None)
            .unwrap();
        ledger
            .update(&scope("globex"), &org("globex"), &tid, &FulfillmentPatch::set_status(FulfillmentStatus::InProgress), None)
            .unwrap();

        let acme = ledger.get(&scope("acme"), &org("acme"), &tid).unwrap();
        let globex = ledger.get(&scope("globex"), &org("globex"), &tid).unwrap();
        assert_eq!(acme.status, FulfillmentStatus::Fulfilled);
        assert_eq!(globex.status, FulfillmentStatus::InProgress);
    }

    #[test]
    fn test_iter_org_lists_only_own_rows() {
        let mut ledger = FulfillmentLedger::new();
        let t1 = TemplateId::new();
        let t2 = TemplateId::new();
        ledger
            .update(&scope("acme"), &org("acme"), &t1, &FulfillmentPatch::set_status(FulfillmentStatus::Fulfilled), None)
            .unwrap();
        ledger
            .update(&scope("globex"), &org("globex"), &t2, &FulfillmentPatch::set_status(FulfillmentStatus::Fulfilled), None)
            .unwrap();

        let acme_org = org("acme");
        let rows: Vec<_> = ledger.iter_org(&scope("acme"), &acme_org).unwrap().collect();
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].template_id, t1);
    }
}
