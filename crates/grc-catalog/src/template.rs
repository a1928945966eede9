//! # Requirement Templates
//!
//! The canonical, versioned requirement entry. A template is owned by the
//! platform operator, immutable from the tenant's perspective, and never
//! deleted — superseding creates a new version and retains the old one so
//! historical scores stay reproducible.

use serde::{Deserialize, Serialize};

use grc_core::{
    sha256_digest, CanonicalBytes, Category, ContentDigest, EngineError, TemplateId, Timestamp,
};

/// The guidance payload of a requirement template.
///
/// Steps are a strict ordered list; free-form guidance blobs from the
/// content source are split into steps before they get here.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TemplateContent {
    /// Canonical requirement title.
    pub title: String,
    /// Why the control matters. Often generic across frameworks.
    pub purpose: String,
    /// Ordered implementation steps. Never empty.
    pub steps: Vec<String>,
}

impl TemplateContent {
    /// Validate and construct template content.
    ///
    /// # Errors
    ///
    /// Returns `Validation` for an empty title, an empty step list, or
    /// any blank step — empty guidance text must fail loudly at the edge
    /// rather than produce an unhashable template.
    pub fn new(
        title: impl Into<String>,
        purpose: impl Into<String>,
        steps: Vec<String>,
    ) -> Result<Self, EngineError> {
        let title = title.into();
        let purpose = purpose.into();
        if title.trim().is_empty() {
            return Err(EngineError::Validation("template title must be non-empty".into()));
        }
        if steps.is_empty() {
            return Err(EngineError::Validation(
                "template must have at least one implementation step".into(),
            ));
        }
        if steps.iter().any(|s| s.trim().is_empty()) {
            return Err(EngineError::Validation(
                "implementation steps must be non-empty".into(),
            ));
        }
        Ok(Self {
            title,
            purpose,
            steps,
        })
    }

    /// Compute the content digest for change detection and idempotent
    /// ingest. Byte-identical content always digests identically.
    pub fn digest(&self) -> Result<ContentDigest, EngineError> {
        let cb = CanonicalBytes::new(self)?;
        Ok(sha256_digest(&cb))
    }
}

/// Lifecycle state of a template.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TemplateState {
    /// Current canonical version.
    Active,
    /// Replaced by a newer version (or absorbed into another template);
    /// retained for audit and historical recomputation.
    Superseded,
}

impl std::fmt::Display for TemplateState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Active => f.write_str("ACTIVE"),
            Self::Superseded => f.write_str("SUPERSEDED"),
        }
    }
}

/// A canonical requirement template.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RequirementTemplate {
    /// Stable identifier, independent of every framework code citing it.
    pub id: TemplateId,
    /// The guidance content.
    pub content: TemplateContent,
    /// Canonical category, assigned once at ingest from the taxonomy.
    pub category: Category,
    /// Content digest over the canonical serialization of `content`.
    pub content_hash: ContentDigest,
    /// Version counter; incremented across the supersede chain.
    pub version: u64,
    /// Lifecycle state.
    pub state: TemplateState,
    /// Successor template, set when superseded.
    pub superseded_by: Option<TemplateId>,
    /// When this version entered the catalog.
    pub created_at: Timestamp,
}

impl RequirementTemplate {
    /// Whether this template is the current canonical version.
    pub fn is_active(&self) -> bool {
        self.state == TemplateState::Active
    }
}
