//! # Fulfillment Records
//!
//! A tenant's standing against one catalog template: status, evidence
//! references, tags, and notes. Evidence references are opaque to the
//! engine; they point into whatever document store the tenant uses.

use std::collections::BTreeSet;

use serde::{Deserialize, Serialize};

use grc_core::{ActorId, EngineError, OrgId, TemplateId, Timestamp};

/// Tenant progress against one requirement.
///
/// `NotApplicable` is the sanctioned way to retire a requirement for a
/// tenant; it removes the row from score numerators and denominators
/// without deleting anything.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum FulfillmentStatus {
    /// No work recorded yet. The implicit state of every untouched row.
    NotStarted,
    /// Work underway; counts half in scoring.
    InProgress,
    /// Requirement satisfied.
    Fulfilled,
    /// Requirement does not apply to this organization.
    NotApplicable,
}

impl FulfillmentStatus {
    /// The kebab-case identifier, matching the serde representation.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::NotStarted => "not-started",
            Self::InProgress => "in-progress",
            Self::Fulfilled => "fulfilled",
            Self::NotApplicable => "not-applicable",
        }
    }

    /// Scoring credit: `None` excludes the row from scoring entirely.
    pub fn credit(&self) -> Option<f64> {
        match self {
            Self::NotStarted => Some(0.0),
            Self::InProgress => Some(0.5),
            Self::Fulfilled => Some(1.0),
            Self::NotApplicable => None,
        }
    }
}

impl std::fmt::Display for FulfillmentStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One tenant's record against one template.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TenantFulfillment {
    /// Owning organization.
    pub org: OrgId,
    /// The catalog template this record annotates.
    pub template_id: TemplateId,
    /// Current status.
    pub status: FulfillmentStatus,
    /// Opaque evidence references.
    pub evidence: BTreeSet<String>,
    /// Free-form tags.
    pub tags: BTreeSet<String>,
    /// Free-form notes.
    pub notes: String,
    /// Who last modified the record; `None` on the implicit default.
    pub last_modified_by: Option<ActorId>,
    /// When the record was last modified; `None` on the implicit default.
    pub last_modified_at: Option<Timestamp>,
    /// Write version for optimistic concurrency. 0 = never persisted.
    pub version: u64,
}

impl TenantFulfillment {
    /// The implicit not-started record for an untouched (org, template)
    /// pair. Not persisted until the first write.
    pub fn default_for(org: OrgId, template_id: TemplateId) -> Self {
        Self {
            org,
            template_id,
            status: FulfillmentStatus::NotStarted,
            evidence: BTreeSet::new(),
            tags: BTreeSet::new(),
            notes: String::new(),
            last_modified_by: None,
            last_modified_at: None,
            version: 0,
        }
    }
}

/// A batch of changes to apply to one fulfillment record.
///
/// All fields are optional; an entirely empty patch is rejected so a
/// no-op cannot burn a version number and an audit event.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct FulfillmentPatch {
    /// New status.
    pub status: Option<FulfillmentStatus>,
    /// Evidence references to attach.
    pub attach_evidence: Vec<String>,
    /// Evidence references to detach.
    pub detach_evidence: Vec<String>,
    /// Tags to add.
    pub add_tags: Vec<String>,
    /// Tags to remove.
    pub remove_tags: Vec<String>,
    /// Replacement notes text.
    pub notes: Option<String>,
}

impl FulfillmentPatch {
    /// Whether the patch changes nothing.
    pub fn is_empty(&self) -> bool {
        self.status.is_none()
            && self.attach_evidence.is_empty()
            && self.detach_evidence.is_empty()
            && self.add_tags.is_empty()
            && self.remove_tags.is_empty()
            && self.notes.is_none()
    }

    /// Validate patch contents.
    ///
    /// # Errors
    ///
    /// `Validation` for an empty patch or blank evidence/tag entries.
    pub fn validate(&self) -> Result<(), EngineError> {
        if self.is_empty() {
            return Err(EngineError::Validation("empty fulfillment patch".into()));
        }
        let blank = |s: &String| s.trim().is_empty();
        if self.attach_evidence.iter().any(blank) || self.detach_evidence.iter().any(blank) {
            return Err(EngineError::Validation(
                "evidence references must be non-empty".into(),
            ));
        }
        if self.add_tags.iter().any(blank) || self.remove_tags.iter().any(blank) {
            return Err(EngineError::Validation("tags must be non-empty".into()));
        }
        Ok(())
    }

    /// Shorthand patch that only sets a status.
    pub fn set_status(status: FulfillmentStatus) -> Self {
        Self {
            status: Some(status),
            ..Default::default()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_serde_kebab_case() {
        assert_eq!(
            serde_json::to_string(&FulfillmentStatus::NotStarted).unwrap(),
            "\"not-started\""
        );
        assert_eq!(
            serde_json::to_string(&FulfillmentStatus::NotApplicable).unwrap(),
            "\"not-applicable\""
        );
        let parsed: FulfillmentStatus = serde_json::from_str("\"in-progress\"").unwrap();
        assert_eq!(parsed, FulfillmentStatus::InProgress);
    }

    #[test]
    fn test_credit_values() {
        assert_eq!(FulfillmentStatus::NotStarted.credit(), Some(0.0));
        assert_eq!(FulfillmentStatus::InProgress.credit(), Some(0.5));
        assert_eq!(FulfillmentStatus::Fulfilled.credit(), Some(1.0));
        assert_eq!(FulfillmentStatus::NotApplicable.credit(), None);
    }

    #[test]
    fn test_default_record_is_unpersisted_not_started() {
        let record = TenantFulfillment::default_for(
            OrgId::new("acme").unwrap(),
            TemplateId::new(),
        );
        assert_eq!(record.status, FulfillmentStatus::NotStarted);
        assert_eq!(record.version, 0);
        assert!(record.last_modified_by.is_none());
        assert!(record.last_modified_at.is_none());
    }

    #[test]
    fn test_empty_patch_rejected() {
        assert!(FulfillmentPatch::default().validate().is_err());
    }

    #[test]
    fn test_blank_entries_rejected() {
        let patch = FulfillmentPatch {
            attach_evidence: vec!["  ".into()],
            ..Default::default()
        };
        assert!(patch.validate().is_err());

        let patch = FulfillmentPatch {
            add_tags: vec!["".into()],
            ..Default::default()
        };
        assert!(patch.validate().is_err());
    }

    #[test]
    fn test_set_status_shorthand() {
        let patch = FulfillmentPatch::set_status(FulfillmentStatus::Fulfilled);
        assert!(patch.validate().is_ok());
        assert_eq!(patch.status, Some(FulfillmentStatus::Fulfilled));
    }
}
