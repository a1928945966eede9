//! # Engine Property Integration Tests
//!
//! End-to-end exercises of the readiness engine across ingestion,
//! mapping, fulfillment, scoring, and audit:
//! - Idempotent ingest collapses identical guidance across codes
//! - No mapping ever dangles
//! - Scores move monotonically with status improvements
//! - All-not-applicable scopes report UNKNOWN, never zero
//! - Tenants cannot see or touch each other's ledgers
//! - Every mutation leaves exactly one audit event

use grc_audit::{AuditAction, AuditFilter, EntityKind};
use grc_catalog::ReviewDisposition;
use grc_core::{ActorId, Category, EngineError, FrameworkCode, OrgId};
use grc_engine::{CatalogFilter, ComplianceEngine, IngestRequest, Page};
use grc_ledger::{FulfillmentPatch, FulfillmentStatus, OrgScope};
use grc_score::{ScoreScope, ScoreStatus};

fn operator() -> ActorId {
    ActorId::new("importer@platform").unwrap()
}

fn org_scope(slug: &str) -> (OrgScope, OrgId) {
    let org = OrgId::new(slug).unwrap();
    (
        OrgScope::new(org.clone(), ActorId::new(format!("analyst@{slug}")).unwrap()),
        org,
    )
}

fn request(code: &str, title: &str, steps: &[&str], category: &str) -> IngestRequest {
    IngestRequest {
        code: FrameworkCode::new(code).unwrap(),
        framework_display_name: "Test Framework".to_string(),
        title: title.to_string(),
        purpose: "Reduce exposure from unmanaged assets.".to_string(),
        steps: steps.iter().map(|s| s.to_string()).collect(),
        category: Category::new(category).unwrap(),
    }
}

// ---------------------------------------------------------------------------
// 1. Idempotent ingest
// ---------------------------------------------------------------------------

#[test]
fn identical_guidance_under_two_codes_yields_one_template_two_mappings() {
    let mut engine = ComplianceEngine::default();
    let steps = ["Establish and maintain a detailed enterprise asset inventory"];

    let first = engine
        .ingest(&operator(), request("cis-ig1-1.1", "Asset inventory", &steps, "Asset Management"))
        .unwrap();
    let second = engine
        .ingest(&operator(), request("cis-ig2-1.1", "Asset inventory", &steps, "Asset Management"))
        .unwrap();

    assert!(first.created);
    assert!(!second.created);
    assert!(!second.merge_candidate);
    assert_eq!(first.template_id, second.template_id);

    assert_eq!(engine.catalog().len(), 1);
    assert_eq!(engine.mappings().len(), 2);
    assert_eq!(engine.mappings().codes_for(&first.template_id).len(), 2);
}

#[test]
fn reingesting_the_same_code_and_content_changes_nothing() {
    let mut engine = ComplianceEngine::default();
    let steps = ["Establish and maintain a software allowlist"];

    engine
        .ingest(&operator(), request("cis-ig1-2.5", "Software allowlist", &steps, "Software"))
        .unwrap();
    let events_before = engine.get_audit_trail(&AuditFilter::default()).len();

    // A resumed bulk import replays the same item.
    let replay = engine
        .ingest(&operator(), request("cis-ig1-2.5", "Software allowlist", &steps, "Software"))
        .unwrap();

    assert!(!replay.created);
    assert_eq!(engine.catalog().len(), 1);
    assert_eq!(engine.mappings().len(), 1);
    // No extra audit noise from the no-op replay.
    assert_eq!(engine.get_audit_trail(&AuditFilter::default()).len(), events_before);
}

#[test]
fn escaped_newline_artifacts_do_not_defeat_dedup() {
    let mut engine = ComplianceEngine::default();

    let clean = engine
        .ingest(
            &operator(),
            request(
                "iso-27001-a.5.9",
                "Asset inventory",
                &["Maintain an inventory of assets.\nReview it quarterly."],
                "Asset Management",
            ),
        )
        .unwrap();
    // The same guidance arrives from another framework export with a
    // literal backslash-n sequence inside the text.
    let glitched = engine
        .ingest(
            &operator(),
            request(
                "cis-ig1-1.1",
                "Asset inventory",
                &["Maintain an inventory of assets.\\nReview it quarterly."],
                "Asset Management",
            ),
        )
        .unwrap();

    assert_eq!(clean.template_id, glitched.template_id);
    assert!(!glitched.created);
    assert_eq!(engine.catalog().len(), 1);
}

// ---------------------------------------------------------------------------
// 2. No dangling mappings
// ---------------------------------------------------------------------------

#[test]
fn mappings_never_dangle_across_ingest_supersede_and_merge() {
    let mut engine = ComplianceEngine::default();
    let actor = operator();

    let a = engine
        .ingest(&actor, request("cis-ig1-1.1", "Asset inventory", &["Establish and maintain a detailed accurate inventory of all organizational hardware assets"], "Asset Management"))
        .unwrap();
    // Near duplicate lands in the review queue.
    let b = engine
        .ingest(&actor, request("cis-ig2-1.1", "Asset inventory", &["Establish and maintain a detailed inventory of all organizational hardware assets"], "Asset Management"))
        .unwrap();
    assert!(b.merge_candidate);

    // Supersede the first template.
    engine
        .supersede_template(
            &actor,
            &a.template_id,
            1,
            "Asset inventory",
            "Reduce exposure from unmanaged assets.",
            vec!["Establish, maintain, and continuously reconcile the asset inventory".into()],
            None,
        )
        .unwrap();

    // Merge the candidate into its canonical counterpart.
    engine
        .resolve_merge_candidate(&actor, &b.template_id, ReviewDisposition::Merged)
        .unwrap();

    for record in engine.mappings().iter() {
        let template = engine.get_template(&record.template_id).unwrap();
        assert!(
            template.is_active(),
            "code {} resolves to non-active template {}",
            record.code,
            record.template_id
        );
    }
}

// ---------------------------------------------------------------------------
// 3. Score monotonicity and exclusion
// ---------------------------------------------------------------------------

#[test]
fn score_never_decreases_as_statuses_improve() {
    let mut engine = ComplianceEngine::default();
    let actor = operator();
    let (scope, org) = org_scope("acme");

    let a = engine
        .ingest(&actor, request("cis-ig1-1.1", "Asset inventory", &["Maintain the asset inventory"], "Asset Management"))
        .unwrap();
    engine
        .ingest(&actor, request("cis-ig1-5.1", "Account inventory", &["Maintain the account inventory"], "Access Control"))
        .unwrap();

    let mut last = engine
        .score_scope(&scope, &org, ScoreScope::Overall)
        .unwrap()
        .score
        .unwrap();

    for status in [FulfillmentStatus::InProgress, FulfillmentStatus::Fulfilled] {
        engine
            .update_fulfillment(&scope, &org, &a.template_id, &FulfillmentPatch::set_status(status), None)
            .unwrap();
        let next = engine
            .score_scope(&scope, &org, ScoreScope::Overall)
            .unwrap()
            .score
            .unwrap();
        assert!(next >= last, "score regressed {last} -> {next} on {status}");
        last = next;
    }
}

#[test]
fn all_not_applicable_scope_is_unknown_not_zero() {
    let mut engine = ComplianceEngine::default();
    let actor = operator();
    let (scope, org) = org_scope("acme");

    let a = engine
        .ingest(&actor, request("cis-ig1-1.1", "Asset inventory", &["Maintain the asset inventory"], "Asset Management"))
        .unwrap();
    engine
        .update_fulfillment(
            &scope,
            &org,
            &a.template_id,
            &FulfillmentPatch::set_status(FulfillmentStatus::NotApplicable),
            None,
        )
        .unwrap();

    let snapshot = engine
        .score_scope(&scope, &org, ScoreScope::Category(Category::new("Asset Management").unwrap()))
        .unwrap();
    assert_eq!(snapshot.score, None);
    assert_eq!(snapshot.status, ScoreStatus::Unknown);
    assert_eq!(snapshot.contributing_count, 0);
}

#[test]
fn unknown_framework_scope_is_a_typed_error() {
    let mut engine = ComplianceEngine::default();
    let (scope, org) = org_scope("acme");
    let result = engine.score_scope(
        &scope,
        &org,
        ScoreScope::Framework(FrameworkCode::new("nist-800-53-ac-2").unwrap()),
    );
    assert!(matches!(result, Err(EngineError::UnknownScope { .. })));
}

// ---------------------------------------------------------------------------
// 4. Tenant isolation
// ---------------------------------------------------------------------------

#[test]
fn tenants_cannot_read_or_write_each_other() {
    let mut engine = ComplianceEngine::default();
    let actor = operator();
    let (acme_scope, acme) = org_scope("acme");
    let (globex_scope, globex) = org_scope("globex");

    let a = engine
        .ingest(&actor, request("cis-ig1-1.1", "Asset inventory", &["Maintain the asset inventory"], "Asset Management"))
        .unwrap();

    engine
        .update_fulfillment(
            &globex_scope,
            &globex,
            &a.template_id,
            &FulfillmentPatch::set_status(FulfillmentStatus::Fulfilled),
            None,
        )
        .unwrap();

    // acme holds the template id but not globex's scope.
    let read = engine.get_fulfillment(&acme_scope, &globex, &a.template_id);
    assert!(matches!(read, Err(EngineError::Authorization { .. })));

    let write = engine.update_fulfillment(
        &acme_scope,
        &globex,
        &a.template_id,
        &FulfillmentPatch::set_status(FulfillmentStatus::NotStarted),
        None,
    );
    assert!(matches!(write, Err(EngineError::Authorization { .. })));

    // globex's record is untouched, and acme's own view is still default.
    let globex_view = engine.get_fulfillment(&globex_scope, &globex, &a.template_id).unwrap();
    assert_eq!(globex_view.status, FulfillmentStatus::Fulfilled);
    let acme_view = engine.get_fulfillment(&acme_scope, &acme, &a.template_id).unwrap();
    assert_eq!(acme_view.status, FulfillmentStatus::NotStarted);
}

// ---------------------------------------------------------------------------
// 5. Audit completeness
// ---------------------------------------------------------------------------

#[test]
fn every_fulfillment_mutation_leaves_exactly_one_event_matching_the_result() {
    let mut engine = ComplianceEngine::default();
    let actor = operator();
    let (scope, org) = org_scope("acme");

    let a = engine
        .ingest(&actor, request("cis-ig1-1.1", "Asset inventory", &["Maintain the asset inventory"], "Asset Management"))
        .unwrap();

    let returned = engine
        .update_fulfillment(
            &scope,
            &org,
            &a.template_id,
            &FulfillmentPatch::set_status(FulfillmentStatus::InProgress),
            None,
        )
        .unwrap();

    let filter = AuditFilter {
        entity_kind: Some(EntityKind::Fulfillment),
        ..Default::default()
    };
    let events = engine.get_audit_trail(&filter);
    assert_eq!(events.len(), 1);
    assert_eq!(events[0].action, AuditAction::FulfillmentUpdated);
    assert!(events[0].before.is_none());
    assert_eq!(events[0].after, serde_json::to_value(&returned).unwrap());
}

#[test]
fn ingest_of_a_new_requirement_audits_template_and_mapping() {
    let mut engine = ComplianceEngine::default();
    let outcome = engine
        .ingest(&operator(), request("gdpr-art-32", "Security of processing", &["Implement appropriate technical measures"], "Data Protection"))
        .unwrap();

    let events = engine.get_audit_trail(&AuditFilter::default());
    assert_eq!(events.len(), 2);
    assert_eq!(events[0].action, AuditAction::TemplateCreated);
    assert_eq!(events[0].entity_id, outcome.template_id.to_string());
    assert_eq!(events[1].action, AuditAction::CodeMapped);
    assert_eq!(events[1].entity_id, "gdpr-art-32");
}

#[test]
fn failed_mutations_leave_no_audit_events() {
    let mut engine = ComplianceEngine::default();
    let (acme_scope, _) = org_scope("acme");
    let (_, globex) = org_scope("globex");

    let a = engine
        .ingest(&operator(), request("cis-ig1-1.1", "Asset inventory", &["Maintain the asset inventory"], "Asset Management"))
        .unwrap();
    let baseline = engine.get_audit_trail(&AuditFilter::default()).len();

    // Rejected cross-tenant write.
    let _ = engine.update_fulfillment(
        &acme_scope,
        &globex,
        &a.template_id,
        &FulfillmentPatch::set_status(FulfillmentStatus::Fulfilled),
        None,
    );
    // Rejected empty patch.
    let (scope, org) = org_scope("acme");
    let _ = engine.update_fulfillment(&scope, &org, &a.template_id, &FulfillmentPatch::default(), None);

    assert_eq!(engine.get_audit_trail(&AuditFilter::default()).len(), baseline);
}

// ---------------------------------------------------------------------------
// 6. Conflict handling
// ---------------------------------------------------------------------------

#[test]
fn stale_fulfillment_writer_gets_conflict_and_can_retry() {
    let mut engine = ComplianceEngine::default();
    let actor = operator();
    let (scope, org) = org_scope("acme");

    let a = engine
        .ingest(&actor, request("cis-ig1-1.1", "Asset inventory", &["Maintain the asset inventory"], "Asset Management"))
        .unwrap();

    engine
        .update_fulfillment(&scope, &org, &a.template_id, &FulfillmentPatch::set_status(FulfillmentStatus::InProgress), Some(0))
        .unwrap();

    // A second writer still based on version 0.
    let lost = engine.update_fulfillment(
        &scope,
        &org,
        &a.template_id,
        &FulfillmentPatch::set_status(FulfillmentStatus::Fulfilled),
        Some(0),
    );
    let current = match lost {
        Err(EngineError::Conflict { current_version, .. }) => current_version,
        other => panic!("expected Conflict, got {other:?}"),
    };

    // Re-read and retry against the current version.
    let retried = engine
        .update_fulfillment(
            &scope,
            &org,
            &a.template_id,
            &FulfillmentPatch::set_status(FulfillmentStatus::Fulfilled),
            Some(current),
        )
        .unwrap();
    assert_eq!(retried.status, FulfillmentStatus::Fulfilled);
}

#[test]
fn concurrent_supersede_second_writer_observes_conflict() {
    let mut engine = ComplianceEngine::default();
    let actor = operator();

    let a = engine
        .ingest(&actor, request("cis-ig1-1.1", "Asset inventory", &["Maintain the asset inventory"], "Asset Management"))
        .unwrap();

    engine
        .supersede_template(&actor, &a.template_id, 1, "Asset inventory", "p", vec!["Maintain and reconcile the asset inventory".into()], None)
        .unwrap();

    let second = engine.supersede_template(
        &actor,
        &a.template_id,
        1,
        "Asset inventory",
        "p",
        vec!["A competing edit".into()],
        None,
    );
    assert!(matches!(second, Err(EngineError::Conflict { .. })));
}

// ---------------------------------------------------------------------------
// 7. Catalog listing
// ---------------------------------------------------------------------------

#[test]
fn list_catalog_filters_and_paginates() {
    let mut engine = ComplianceEngine::default();
    let actor = operator();

    engine
        .ingest(&actor, request("cis-ig1-1.1", "Asset inventory", &["Maintain the asset inventory"], "Asset Management"))
        .unwrap();
    engine
        .ingest(&actor, request("cis-ig1-1.2", "Asset disposal", &["Decommission assets safely"], "Asset Management"))
        .unwrap();
    engine
        .ingest(&actor, request("cis-ig1-5.1", "Account inventory", &["Maintain the account inventory"], "Access Control"))
        .unwrap();

    let all = engine.list_catalog(&CatalogFilter::default(), Page::default()).unwrap();
    assert_eq!(all.len(), 3);

    let assets = engine
        .list_catalog(
            &CatalogFilter {
                category: Some(Category::new("Asset Management").unwrap()),
                ..Default::default()
            },
            Page::default(),
        )
        .unwrap();
    assert_eq!(assets.len(), 2);

    let page = engine
        .list_catalog(&CatalogFilter::default(), Page { offset: 1, limit: 1 })
        .unwrap();
    assert_eq!(page.len(), 1);

    let by_code = engine
        .list_catalog(
            &CatalogFilter {
                framework_code: Some(FrameworkCode::new("cis-ig1-5.1").unwrap()),
                ..Default::default()
            },
            Page::default(),
        )
        .unwrap();
    assert_eq!(by_code.len(), 1);
    assert_eq!(by_code[0].content.title, "Account inventory");
}
