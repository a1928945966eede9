//! # Domain Identity Newtypes
//!
//! Newtype wrappers for all identifiers in the readiness stack. These
//! prevent accidental identifier confusion — you cannot pass a
//! `FrameworkCode` where a `TemplateId` is expected, and a tenant
//! `OrgId` can never leak into a catalog-side API.
//!
//! Uuid-backed identifiers (`TemplateId`, `EventId`) are generated by
//! the stack. String-backed identifiers (`OrgId`, `ActorId`,
//! `FrameworkCode`, `Category`) arrive from collaborators and are
//! validated at construction; an invalid string never becomes an
//! identifier value.

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::EngineError;

/// Unique identifier for a canonical requirement template.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct TemplateId(pub Uuid);

/// Unique identifier for an audit event.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct EventId(pub Uuid);

impl TemplateId {
    /// Generate a new random template identifier.
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }

    /// Access the inner UUID.
    pub fn as_uuid(&self) -> &Uuid {
        &self.0
    }
}

impl Default for TemplateId {
    fn default() -> Self {
        Self::new()
    }
}

impl EventId {
    /// Generate a new random event identifier.
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }

    /// Access the inner UUID.
    pub fn as_uuid(&self) -> &Uuid {
        &self.0
    }
}

impl Default for EventId {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Display for TemplateId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "template:{}", self.0)
    }
}

impl std::fmt::Display for EventId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "event:{}", self.0)
    }
}

/// Identifier of a tenant organization.
///
/// Supplied by the identity provider as a slug: lowercase ASCII
/// alphanumerics and single dashes, e.g. `acme` or `north-wind`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct OrgId(String);

impl OrgId {
    /// Validate and wrap an organization slug.
    ///
    /// # Errors
    ///
    /// Returns `Validation` if the slug is empty, contains characters
    /// outside `[a-z0-9-]`, or starts/ends with a dash.
    pub fn new(slug: impl Into<String>) -> Result<Self, EngineError> {
        let slug = slug.into();
        validate_slug(&slug, "organization id")?;
        Ok(Self(slug))
    }

    /// Access the slug.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for OrgId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "org:{}", self.0)
    }
}

/// Identifier of the human or service actor performing a mutation.
///
/// Opaque to the engine; supplied by the identity provider. Must be
/// non-empty and free of control characters, since it is embedded
/// verbatim in audit events.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ActorId(String);

impl ActorId {
    /// Validate and wrap an actor identifier.
    pub fn new(id: impl Into<String>) -> Result<Self, EngineError> {
        let id = id.into();
        if id.trim().is_empty() {
            return Err(EngineError::Validation("actor id must be non-empty".into()));
        }
        if id.chars().any(|c| c.is_control()) {
            return Err(EngineError::Validation(
                "actor id must not contain control characters".into(),
            ));
        }
        Ok(Self(id))
    }

    /// Access the raw identifier.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for ActorId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

/// A framework-specific control code referencing a canonical template.
///
/// Examples: `cis-ig1-1.1`, `iso-27001-a.5.9`, `gdpr-art-32`, `dora-9.2`.
/// Codes are normalized to lowercase at construction so lookups are
/// case-insensitive by design.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct FrameworkCode(String);

impl FrameworkCode {
    /// Validate and wrap a framework code.
    ///
    /// Accepts lowercase ASCII alphanumerics plus `-` and `.`; uppercase
    /// input is folded to lowercase. Separators may not lead, trail, or
    /// repeat back-to-back.
    pub fn new(code: impl Into<String>) -> Result<Self, EngineError> {
        let code = code.into().to_ascii_lowercase();
        if code.is_empty() {
            return Err(EngineError::Validation("framework code must be non-empty".into()));
        }
        let ok_chars = code
            .chars()
            .all(|c| c.is_ascii_lowercase() || c.is_ascii_digit() || c == '-' || c == '.');
        if !ok_chars {
            return Err(EngineError::Validation(format!(
                "framework code {code:?} contains invalid characters"
            )));
        }
        let first = code.chars().next().unwrap_or(' ');
        let last = code.chars().last().unwrap_or(' ');
        if is_sep(first) || is_sep(last) || has_repeated_sep(&code) {
            return Err(EngineError::Validation(format!(
                "framework code {code:?} has misplaced separators"
            )));
        }
        Ok(Self(code))
    }

    /// Access the normalized code.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for FrameworkCode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

/// Canonical category label for a requirement template.
///
/// Single-valued and assigned once at ingest from the fixed taxonomy
/// mapping — never stored per framework mapping, which is what allows
/// the catalog to avoid tag drift between frameworks.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Category(String);

impl Category {
    /// Validate and wrap a category label. Leading/trailing whitespace
    /// is trimmed; interior whitespace is preserved.
    pub fn new(label: impl Into<String>) -> Result<Self, EngineError> {
        let label = label.into().trim().to_string();
        if label.is_empty() {
            return Err(EngineError::Validation("category must be non-empty".into()));
        }
        Ok(Self(label))
    }

    /// Access the label.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for Category {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

/// Validate a lowercase dash-separated slug.
fn validate_slug(slug: &str, what: &str) -> Result<(), EngineError> {
    if slug.is_empty() {
        return Err(EngineError::Validation(format!("{what} must be non-empty")));
    }
    let ok_chars = slug
        .chars()
        .all(|c| c.is_ascii_lowercase() || c.is_ascii_digit() || c == '-');
    if !ok_chars {
        return Err(EngineError::Validation(format!(
            "{what} {slug:?} must be a lowercase slug"
        )));
    }
    if slug.starts_with('-') || slug.ends_with('-') || slug.contains("--") {
        return Err(EngineError::Validation(format!(
            "{what} {slug:?} has misplaced dashes"
        )));
    }
    Ok(())
}

fn is_sep(c: char) -> bool {
    c == '-' || c == '.'
}

fn has_repeated_sep(s: &str) -> bool {
    s.as_bytes()
        .windows(2)
        .any(|w| is_sep(w[0] as char) && is_sep(w[1] as char))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_template_id_display_prefix() {
        let id = TemplateId::new();
        assert!(id.to_string().starts_with("template:"));
    }

    #[test]
    fn test_template_ids_unique() {
        assert_ne!(TemplateId::new(), TemplateId::new());
    }

    #[test]
    fn test_org_id_valid_slugs() {
        assert!(OrgId::new("acme").is_ok());
        assert!(OrgId::new("north-wind-7").is_ok());
    }

    #[test]
    fn test_org_id_invalid_slugs() {
        assert!(OrgId::new("").is_err());
        assert!(OrgId::new("Acme").is_err());
        assert!(OrgId::new("-acme").is_err());
        assert!(OrgId::new("acme-").is_err());
        assert!(OrgId::new("ac me").is_err());
    }

    #[test]
    fn test_actor_id_rejects_empty_and_control() {
        assert!(ActorId::new("").is_err());
        assert!(ActorId::new("   ").is_err());
        assert!(ActorId::new("user\n@acme").is_err());
        assert!(ActorId::new("auditor@acme").is_ok());
    }

    #[test]
    fn test_framework_code_lowercases() {
        let code = FrameworkCode::new("CIS-IG1-1.1").unwrap();
        assert_eq!(code.as_str(), "cis-ig1-1.1");
    }

    #[test]
    fn test_framework_code_accepts_known_shapes() {
        for raw in ["cis-ig2-1.1", "iso-27001-a.5.9", "gdpr-art-32", "dora-9.2"] {
            assert!(FrameworkCode::new(raw).is_ok(), "rejected {raw}");
        }
    }

    #[test]
    fn test_framework_code_rejects_malformed() {
        assert!(FrameworkCode::new("").is_err());
        assert!(FrameworkCode::new("-cis").is_err());
        assert!(FrameworkCode::new("cis-").is_err());
        assert!(FrameworkCode::new("cis--1").is_err());
        assert!(FrameworkCode::new("cis 1.1").is_err());
        assert!(FrameworkCode::new("cis_1").is_err());
    }

    #[test]
    fn test_category_trims() {
        let cat = Category::new("  Asset Management  ").unwrap();
        assert_eq!(cat.as_str(), "Asset Management");
        assert!(Category::new("   ").is_err());
    }

    #[test]
    fn test_serde_transparent_framework_code() {
        let code = FrameworkCode::new("cis-ig1-1.1").unwrap();
        let json = serde_json::to_string(&code).unwrap();
        assert_eq!(json, "\"cis-ig1-1.1\"");
        let parsed: FrameworkCode = serde_json::from_str(&json).unwrap();
        assert_eq!(parsed, code);
    }
}
