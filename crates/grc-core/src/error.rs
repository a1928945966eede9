//! # Error Types — Structured Error Hierarchy
//!
//! Defines the error taxonomy used throughout the readiness stack. All
//! errors use `thiserror` for derive-based `Display` and `Error`
//! implementations.
//!
//! ## Design
//!
//! - Every domain failure is a typed variant returned to the caller;
//!   nothing is logged-and-swallowed.
//! - Conflict errors carry the current version so the losing writer can
//!   re-read and retry without a second round trip.
//! - Authorization errors echo only caller-supplied identifiers. They
//!   never reveal whether the target row exists.

use thiserror::Error;

/// Top-level error type for the readiness engine.
#[derive(Error, Debug)]
pub enum EngineError {
    /// A referenced entity does not exist.
    #[error("{entity} not found: {id}")]
    NotFound {
        /// Entity kind, e.g. "template" or "fulfillment".
        entity: &'static str,
        /// The identifier that failed to resolve.
        id: String,
    },

    /// A framework mapping references a template that does not exist.
    #[error("mapping {code} references nonexistent template {template_id}")]
    DanglingReference {
        /// The framework code being mapped.
        code: String,
        /// The template identifier that failed to resolve.
        template_id: String,
    },

    /// A concurrent writer won the race; the caller must re-read and retry.
    #[error("conflicting write on {entity} {id}: expected version {expected_version}, current is {current_version}")]
    Conflict {
        /// Entity kind the write targeted.
        entity: &'static str,
        /// The identifier of the contested row.
        id: String,
        /// The version the caller based its write on.
        expected_version: u64,
        /// The version actually stored.
        current_version: u64,
    },

    /// Cross-tenant access attempt. Hard denial, no detail about the
    /// target organization's data.
    #[error("organization {scope_org} is not authorized for this operation")]
    Authorization {
        /// The organization scope the caller authenticated as.
        scope_org: String,
    },

    /// Scoring was requested for a scope that resolves to nothing known.
    #[error("unknown scoring scope: {scope}")]
    UnknownScope {
        /// The framework code or category that failed to resolve.
        scope: String,
    },

    /// Malformed input, e.g. empty guidance text or a bad identifier.
    #[error("validation error: {0}")]
    Validation(String),

    /// Canonical serialization failed.
    #[error("canonicalization error: {0}")]
    Canonicalization(#[from] CanonicalizationError),
}

impl EngineError {
    /// Convenience constructor for [`EngineError::NotFound`].
    pub fn not_found(entity: &'static str, id: impl std::fmt::Display) -> Self {
        Self::NotFound {
            entity,
            id: id.to_string(),
        }
    }
}

/// Error during canonical serialization.
#[derive(Error, Debug)]
pub enum CanonicalizationError {
    /// Float values are not permitted in canonical representations.
    /// Scores and weights live in derived state, never in hashed content.
    #[error("float values are not permitted in canonical content: {0}")]
    FloatRejected(f64),

    /// JSON serialization failed.
    #[error("serialization failed: {0}")]
    SerializationFailed(#[from] serde_json::Error),
}
