//! # Authentication Header Extraction
//!
//! The identity provider in front of this service authenticates every
//! request and injects `x-actor-id` and `x-org-id` headers. This module
//! turns them into the typed identities the engine requires; requests
//! without them never reach a handler body.

use axum::http::HeaderMap;

use grc_core::{ActorId, OrgId};
use grc_ledger::OrgScope;

use crate::error::AppError;

/// Header carrying the authenticated actor.
pub const ACTOR_HEADER: &str = "x-actor-id";
/// Header carrying the authenticated organization scope.
pub const ORG_HEADER: &str = "x-org-id";

/// Extract the acting identity from request headers.
pub fn actor_from(headers: &HeaderMap) -> Result<ActorId, AppError> {
    let raw = headers
        .get(ACTOR_HEADER)
        .and_then(|v| v.to_str().ok())
        .ok_or_else(|| AppError::Unauthorized(format!("missing {ACTOR_HEADER} header")))?;
    ActorId::new(raw).map_err(|e| AppError::Unauthorized(e.to_string()))
}

/// Extract the authenticated organization scope from request headers.
pub fn org_scope_from(headers: &HeaderMap) -> Result<OrgScope, AppError> {
    let actor = actor_from(headers)?;
    let raw = headers
        .get(ORG_HEADER)
        .and_then(|v| v.to_str().ok())
        .ok_or_else(|| AppError::Unauthorized(format!("missing {ORG_HEADER} header")))?;
    let org = OrgId::new(raw).map_err(|e| AppError::Unauthorized(e.to_string()))?;
    Ok(OrgScope::new(org, actor))
}
