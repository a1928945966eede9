//! # Audit Routes
//!
//! Routes:
//! - GET /v1/audit — filtered audit queries, ordered by (timestamp,
//!   sequence) ascending. `after_sequence` + `limit` page through long
//!   windows without missing or repeating events.

use axum::extract::{Query, State};
use axum::routing::get;
use axum::{Json, Router};
use serde::Deserialize;

use grc_audit::{AuditAction, AuditEvent, AuditFilter, EntityKind};
use grc_core::{ActorId, Timestamp};

use crate::error::AppError;
use crate::state::AppState;

/// Audit route table.
pub fn router() -> Router<AppState> {
    Router::new().route("/v1/audit", get(query))
}

#[derive(Debug, Deserialize)]
struct AuditQuery {
    entity_kind: Option<EntityKind>,
    entity_id: Option<String>,
    actor: Option<String>,
    action: Option<AuditAction>,
    since: Option<String>,
    until: Option<String>,
    after_sequence: Option<u64>,
    limit: Option<usize>,
}

async fn query(
    State(state): State<AppState>,
    Query(query): Query<AuditQuery>,
) -> Result<Json<Vec<AuditEvent>>, AppError> {
    let filter = AuditFilter {
        entity_kind: query.entity_kind,
        entity_id: query.entity_id,
        actor: query.actor.map(ActorId::new).transpose()?,
        action: query.action,
        since: query.since.as_deref().map(Timestamp::parse).transpose()?,
        until: query.until.as_deref().map(Timestamp::parse).transpose()?,
        after_sequence: query.after_sequence,
        limit: query.limit,
    };
    Ok(Json(state.read()?.get_audit_trail(&filter)))
}
