//! # Catalog Routes — Ingestion and Queries
//!
//! Routes:
//! - POST /v1/catalog/ingest — ingest one requirement under a framework code
//! - GET  /v1/catalog — filtered, paginated listing of active templates
//! - GET  /v1/catalog/{template_id} — single template, any lifecycle state
//! - POST /v1/catalog/{template_id}/supersede — versioned replacement

use axum::extract::{Path, Query, State};
use axum::http::HeaderMap;
use axum::routing::{get, post};
use axum::{Json, Router};
use serde::Deserialize;
use uuid::Uuid;

use grc_catalog::RequirementTemplate;
use grc_core::{Category, FrameworkCode, TemplateId};
use grc_engine::{CatalogFilter, IngestOutcome, IngestRequest, Page};

use crate::auth::actor_from;
use crate::error::AppError;
use crate::state::AppState;

/// Catalog route table.
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/v1/catalog/ingest", post(ingest))
        .route("/v1/catalog", get(list))
        .route("/v1/catalog/{template_id}", get(get_one))
        .route("/v1/catalog/{template_id}/supersede", post(supersede))
}

/// Ingestion request body, as sent by the content-import tooling.
#[derive(Debug, Deserialize)]
pub struct IngestBody {
    code: String,
    framework_display_name: String,
    title: String,
    purpose: String,
    steps: Vec<String>,
    category: String,
}

async fn ingest(
    State(state): State<AppState>,
    headers: HeaderMap,
    Json(body): Json<IngestBody>,
) -> Result<Json<IngestOutcome>, AppError> {
    let actor = actor_from(&headers)?;
    let request = IngestRequest {
        code: FrameworkCode::new(body.code)?,
        framework_display_name: body.framework_display_name,
        title: body.title,
        purpose: body.purpose,
        steps: body.steps,
        category: Category::new(body.category)?,
    };
    let outcome = state.write()?.ingest(&actor, request)?;
    metrics::counter!("grc_api_ingest_total").increment(1);
    Ok(Json(outcome))
}

#[derive(Debug, Deserialize)]
struct ListQuery {
    category: Option<String>,
    framework_code: Option<String>,
    #[serde(default)]
    offset: usize,
    limit: Option<usize>,
}

async fn list(
    State(state): State<AppState>,
    Query(query): Query<ListQuery>,
) -> Result<Json<Vec<RequirementTemplate>>, AppError> {
    let filter = CatalogFilter {
        category: query.category.map(Category::new).transpose()?,
        framework_code: query.framework_code.map(FrameworkCode::new).transpose()?,
    };
    let page = Page {
        offset: query.offset,
        limit: query.limit.unwrap_or(Page::default().limit),
    };
    let items = state.read()?.list_catalog(&filter, page)?;
    Ok(Json(items))
}

async fn get_one(
    State(state): State<AppState>,
    Path(template_id): Path<Uuid>,
) -> Result<Json<RequirementTemplate>, AppError> {
    let template = state.read()?.get_template(&TemplateId(template_id))?;
    Ok(Json(template))
}

/// Supersede request body.
#[derive(Debug, Deserialize)]
pub struct SupersedeBody {
    expected_version: u64,
    title: String,
    purpose: String,
    steps: Vec<String>,
    category: Option<String>,
}

async fn supersede(
    State(state): State<AppState>,
    headers: HeaderMap,
    Path(template_id): Path<Uuid>,
    Json(body): Json<SupersedeBody>,
) -> Result<Json<RequirementTemplate>, AppError> {
    let actor = actor_from(&headers)?;
    let category = body.category.map(Category::new).transpose()?;
    let mut engine = state.write()?;
    let new_id = engine.supersede_template(
        &actor,
        &TemplateId(template_id),
        body.expected_version,
        &body.title,
        &body.purpose,
        body.steps,
        category,
    )?;
    let template = engine.get_template(&new_id)?;
    Ok(Json(template))
}
