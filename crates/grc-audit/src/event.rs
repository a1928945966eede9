//! # Audit Events
//!
//! The event types recorded for every mutation. Before/after state is
//! captured as `serde_json::Value` so the trail can hold any entity
//! without a dependency on the crates that define them.

use serde::{Deserialize, Serialize};
use serde_json::Value;

use grc_core::{ActorId, EventId, Timestamp};

/// The kind of entity an audit event refers to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EntityKind {
    /// A canonical requirement template in the catalog.
    Template,
    /// A framework-code-to-template mapping.
    Mapping,
    /// A tenant fulfillment record.
    Fulfillment,
    /// A near-duplicate flagged for operator review.
    MergeCandidate,
}

impl EntityKind {
    /// The snake_case identifier for this kind.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Template => "template",
            Self::Mapping => "mapping",
            Self::Fulfillment => "fulfillment",
            Self::MergeCandidate => "merge_candidate",
        }
    }
}

impl std::fmt::Display for EntityKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// The action an audit event records.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AuditAction {
    /// A new template entered the catalog.
    TemplateCreated,
    /// A template was superseded by a new version.
    TemplateSuperseded,
    /// A framework code was mapped to a template for the first time.
    CodeMapped,
    /// An existing framework code was re-pointed to a different template.
    CodeRemapped,
    /// A tenant fulfillment record was created or modified.
    FulfillmentUpdated,
    /// A near-duplicate was flagged into the review queue.
    MergeCandidateFlagged,
    /// An operator merged a candidate into its canonical template.
    MergeCandidateMerged,
    /// An operator dismissed a candidate as an intentional duplicate.
    MergeCandidateDismissed,
}

impl AuditAction {
    /// The snake_case identifier for this action.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::TemplateCreated => "template_created",
            Self::TemplateSuperseded => "template_superseded",
            Self::CodeMapped => "code_mapped",
            Self::CodeRemapped => "code_remapped",
            Self::FulfillmentUpdated => "fulfillment_updated",
            Self::MergeCandidateFlagged => "merge_candidate_flagged",
            Self::MergeCandidateMerged => "merge_candidate_merged",
            Self::MergeCandidateDismissed => "merge_candidate_dismissed",
        }
    }
}

impl std::fmt::Display for AuditAction {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A draft event handed to the trail by a write path.
///
/// The trail assigns the identifier, sequence number, and timestamp at
/// append time; the write path supplies everything it knows.
#[derive(Debug, Clone)]
pub struct EventDraft {
    /// Who performed the mutation.
    pub actor: ActorId,
    /// The kind of entity mutated.
    pub entity_kind: EntityKind,
    /// Display form of the entity identifier (e.g. `template:<uuid>`).
    pub entity_id: String,
    /// What happened.
    pub action: AuditAction,
    /// Entity state before the mutation; `None` on creation.
    pub before: Option<Value>,
    /// Entity state after the mutation.
    pub after: Value,
}

/// An immutable, recorded audit event.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AuditEvent {
    /// Unique event identifier.
    pub id: EventId,
    /// Monotonic append sequence, unique within the trail.
    pub sequence: u64,
    /// Who performed the mutation.
    pub actor: ActorId,
    /// The kind of entity mutated.
    pub entity_kind: EntityKind,
    /// Display form of the entity identifier.
    pub entity_id: String,
    /// What happened.
    pub action: AuditAction,
    /// Entity state before the mutation; `None` on creation.
    pub before: Option<Value>,
    /// Entity state after the mutation.
    pub after: Value,
    /// When the event was recorded.
    pub timestamp: Timestamp,
}
