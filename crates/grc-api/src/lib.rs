//! # grc-api — Axum API Service
//!
//! The HTTP surface of the readiness stack, built on Axum/Tower/Tokio.
//! Route handlers hold no business logic; they authenticate the caller,
//! translate the request, call the engine, and render the result.
//!
//! ## Routes
//!
//! - `POST /v1/catalog/ingest` — content-import ingestion
//! - `GET  /v1/catalog` — filtered, paginated catalog listing
//! - `GET  /v1/catalog/{template_id}` — single template
//! - `POST /v1/catalog/{template_id}/supersede` — versioned replacement
//! - `GET  /v1/review-queue` — open merge candidates
//! - `POST /v1/review-queue/{template_id}` — resolve a candidate
//! - `GET  /v1/orgs/{org}/fulfillment/{template_id}` — tenant record
//! - `PATCH /v1/orgs/{org}/fulfillment/{template_id}` — tenant update
//! - `GET  /v1/orgs/{org}/scorecard` — full or scoped scorecard
//! - `GET  /v1/audit` — ordered audit trail queries
//!
//! ## Authentication Seam
//!
//! The identity provider in front of this service injects `x-actor-id`
//! and `x-org-id` headers on every request; `auth.rs` turns them into
//! typed identities. Cross-tenant enforcement happens in the engine, not
//! here.
//!
//! ## Crate Policy
//!
//! - Sits at the top of the dependency DAG.
//! - All errors map to structured HTTP responses via `AppError`.

pub mod auth;
pub mod error;
pub mod routes;
pub mod state;

pub use error::AppError;
pub use state::AppState;

use axum::Router;
use tower_http::trace::TraceLayer;

/// Assemble the application router.
pub fn app(state: AppState) -> Router {
    Router::new()
        .merge(routes::catalog::router())
        .merge(routes::review::router())
        .merge(routes::fulfillment::router())
        .merge(routes::scorecard::router())
        .merge(routes::audit::router())
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
