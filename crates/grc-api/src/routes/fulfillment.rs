//! # Fulfillment Routes — Tenant Ledger Access
//!
//! Routes:
//! - GET   /v1/orgs/{org}/fulfillment/{template_id} — current record
//! - PATCH /v1/orgs/{org}/fulfillment/{template_id} — apply a patch
//!
//! The caller's `x-org-id` scope must match the `{org}` path segment;
//! the engine rejects anything else with a hard denial.

use axum::extract::{Path, Query, State};
use axum::http::HeaderMap;
use axum::routing::{get, patch};
use axum::{Json, Router};
use serde::Deserialize;
use uuid::Uuid;

use grc_core::{OrgId, TemplateId};
use grc_ledger::{FulfillmentPatch, TenantFulfillment};

use crate::auth::org_scope_from;
use crate::error::AppError;
use crate::state::AppState;

/// Fulfillment route table.
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/v1/orgs/{org}/fulfillment/{template_id}", get(get_record))
        .route("/v1/orgs/{org}/fulfillment/{template_id}", patch(update))
}

async fn get_record(
    State(state): State<AppState>,
    headers: HeaderMap,
    Path((org, template_id)): Path<(String, Uuid)>,
) -> Result<Json<TenantFulfillment>, AppError> {
    let scope = org_scope_from(&headers)?;
    let org = OrgId::new(org)?;
    let record = state
        .read()?
        .get_fulfillment(&scope, &org, &TemplateId(template_id))?;
    Ok(Json(record))
}

#[derive(Debug, Deserialize)]
struct UpdateQuery {
    /// Version the caller based its edit on; omit for last-writer-wins.
    expected_version: Option<u64>,
}

async fn update(
    State(state): State<AppState>,
    headers: HeaderMap,
    Path((org, template_id)): Path<(String, Uuid)>,
    Query(query): Query<UpdateQuery>,
    Json(patch_body): Json<FulfillmentPatch>,
) -> Result<Json<TenantFulfillment>, AppError> {
    let scope = org_scope_from(&headers)?;
    let org = OrgId::new(org)?;
    let record = state.write()?.update_fulfillment(
        &scope,
        &org,
        &TemplateId(template_id),
        &patch_body,
        query.expected_version,
    )?;
    metrics::counter!("grc_api_fulfillment_updates_total").increment(1);
    Ok(Json(record))
}
