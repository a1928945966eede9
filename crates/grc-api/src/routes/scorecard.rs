//! # Scorecard Routes
//!
//! Routes:
//! - GET /v1/orgs/{org}/scorecard — full scorecard, or one scope via the
//!   `framework` / `category` query parameters
//!
//! An unknown scope renders as an empty UNKNOWN scorecard rather than an
//! error: dashboards asking about a framework this deployment does not
//! carry get a neutral answer, not a crash.

use axum::extract::{Path, Query, State};
use axum::http::HeaderMap;
use axum::routing::get;
use axum::{Json, Router};
use serde::{Deserialize, Serialize};

use grc_core::{Category, EngineError, FrameworkCode, OrgId, Timestamp};
use grc_score::{Scorecard, ScoreScope, ScoreSnapshot, ScoreStatus};

use crate::auth::org_scope_from;
use crate::error::AppError;
use crate::state::AppState;

/// Scorecard route table.
pub fn router() -> Router<AppState> {
    Router::new().route("/v1/orgs/{org}/scorecard", get(scorecard))
}

#[derive(Debug, Deserialize)]
struct ScorecardQuery {
    framework: Option<String>,
    category: Option<String>,
}

/// Either a full scorecard or a single scoped snapshot.
#[derive(Debug, Serialize)]
#[serde(untagged)]
enum ScorecardResponse {
    Scoped(ScoreSnapshot),
    Full(Box<Scorecard>),
}

async fn scorecard(
    State(state): State<AppState>,
    headers: HeaderMap,
    Path(org): Path<String>,
    Query(query): Query<ScorecardQuery>,
) -> Result<Json<ScorecardResponse>, AppError> {
    let scope = org_scope_from(&headers)?;
    let org = OrgId::new(org)?;

    let score_scope = match (&query.framework, &query.category) {
        (Some(_), Some(_)) => {
            return Err(AppError::Validation(
                "specify framework or category, not both".into(),
            ));
        }
        (Some(code), None) => Some(ScoreScope::Framework(FrameworkCode::new(code.clone())?)),
        (None, Some(label)) => Some(ScoreScope::Category(Category::new(label.clone())?)),
        (None, None) => None,
    };

    metrics::counter!("grc_api_scorecards_total").increment(1);
    let mut engine = state.write()?;
    match score_scope {
        Some(score_scope) => {
            match engine.score_scope(&scope, &org, score_scope.clone()) {
                Ok(snapshot) => Ok(Json(ScorecardResponse::Scoped(snapshot))),
                // Neutral scorecard for a scope this deployment does not know.
                Err(EngineError::UnknownScope { .. }) => {
                    Ok(Json(ScorecardResponse::Scoped(ScoreSnapshot {
                        org,
                        scope: score_scope,
                        computed_at: Timestamp::now(),
                        score: None,
                        status: ScoreStatus::Unknown,
                        contributing_count: 0,
                        fulfilled_count: 0,
                    })))
                }
                Err(err) => Err(err.into()),
            }
        }
        None => {
            let card = engine.get_org_scorecard(&scope, &org)?;
            Ok(Json(ScorecardResponse::Full(Box::new(card))))
        }
    }
}
