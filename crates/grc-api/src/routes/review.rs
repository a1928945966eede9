//! # Merge Review Routes
//!
//! Routes:
//! - GET  /v1/review-queue — merge candidates awaiting an operator
//! - POST /v1/review-queue/{template_id} — resolve one candidate

use axum::extract::{Path, State};
use axum::http::HeaderMap;
use axum::routing::{get, post};
use axum::{Json, Router};
use serde::Deserialize;
use uuid::Uuid;

use grc_catalog::{MergeCandidate, ReviewDisposition};
use grc_core::TemplateId;

use crate::auth::actor_from;
use crate::error::AppError;
use crate::state::AppState;

/// Review queue route table.
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/v1/review-queue", get(queue))
        .route("/v1/review-queue/{template_id}", post(resolve))
}

async fn queue(State(state): State<AppState>) -> Result<Json<Vec<MergeCandidate>>, AppError> {
    Ok(Json(state.read()?.review_queue()))
}

#[derive(Debug, Deserialize)]
struct ResolveBody {
    disposition: ReviewDisposition,
}

async fn resolve(
    State(state): State<AppState>,
    headers: HeaderMap,
    Path(template_id): Path<Uuid>,
    Json(body): Json<ResolveBody>,
) -> Result<Json<MergeCandidate>, AppError> {
    let actor = actor_from(&headers)?;
    let resolved = state.write()?.resolve_merge_candidate(
        &actor,
        &TemplateId(template_id),
        body.disposition,
    )?;
    Ok(Json(resolved))
}
