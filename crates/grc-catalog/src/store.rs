//! # Catalog Store — Keyed, Versioned Template Storage
//!
//! A single-writer canonical store. `put_template` is idempotent on the
//! content digest, which is what makes bulk re-ingestion resumable: a
//! partially failed import can be re-run without duplicating templates.
//! `supersede` is version-checked — a writer racing on the same template
//! loses with a `Conflict` carrying the current version, re-reads, and
//! retries against the new version. Nothing is ever deleted.

use std::collections::{BTreeSet, HashMap};

use grc_core::{Category, ContentDigest, EngineError, TemplateId, Timestamp};

use crate::template::{RequirementTemplate, TemplateContent, TemplateState};

/// Result of a `put_template` call.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PutOutcome {
    /// The template the content now lives under.
    pub id: TemplateId,
    /// Whether a new template was created (`false` = exact content
    /// already present, existing id returned).
    pub created: bool,
}

/// Result of a `supersede` call.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SupersedeOutcome {
    /// The successor template.
    pub new_id: TemplateId,
    /// The successor's version number.
    pub new_version: u64,
}

/// The canonical requirement template store.
#[derive(Debug, Default)]
pub struct CatalogStore {
    templates: HashMap<TemplateId, RequirementTemplate>,
    /// Exact-content index over *active* templates. Superseded versions
    /// drop out so their content can legitimately re-enter the catalog
    /// as a fresh template.
    by_content: HashMap<ContentDigest, TemplateId>,
}

impl CatalogStore {
    /// Create an empty store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert a template, idempotently.
    ///
    /// If an active template with an identical content digest exists, its
    /// id is returned and nothing is written.
    pub fn put_template(
        &mut self,
        content: TemplateContent,
        category: Category,
    ) -> Result<PutOutcome, EngineError> {
        let digest = content.digest()?;
        if let Some(existing) = self.by_content.get(&digest) {
            return Ok(PutOutcome {
                id: *existing,
                created: false,
            });
        }
        let id = TemplateId::new();
        let template = RequirementTemplate {
            id,
            content,
            category,
            content_hash: digest,
            version: 1,
            state: TemplateState::Active,
            superseded_by: None,
            created_at: Timestamp::now(),
        };
        self.by_content.insert(digest, id);
        self.templates.insert(id, template);
        Ok(PutOutcome { id, created: true })
    }

    /// Fetch a template by id.
    pub fn get_template(&self, id: &TemplateId) -> Result<&RequirementTemplate, EngineError> {
        self.templates
            .get(id)
            .ok_or_else(|| EngineError::not_found("template", id))
    }

    /// Replace a template with a new version.
    ///
    /// The old row is retained, marked superseded, and linked to its
    /// successor. The caller states the version it based its edit on;
    /// a mismatch (including a target that was already superseded by a
    /// concurrent writer) is a `Conflict` carrying the stored version,
    /// so the loser can re-read and retry.
    pub fn supersede(
        &mut self,
        old_id: &TemplateId,
        expected_version: u64,
        new_content: TemplateContent,
        new_category: Option<Category>,
    ) -> Result<SupersedeOutcome, EngineError> {
        let old = self.get_template(old_id)?;
        if !old.is_active() || old.version != expected_version {
            return Err(EngineError::Conflict {
                entity: "template",
                id: old_id.to_string(),
                expected_version,
                current_version: old.version,
            });
        }
        let digest = new_content.digest()?;
        if let Some(other) = self.by_content.get(&digest) {
            if other != old_id {
                return Err(EngineError::Validation(format!(
                    "superseding content is identical to active template {other}; merge instead"
                )));
            }
        }

        let old_version = old.version;
        let category = new_category.unwrap_or_else(|| old.category.clone());
        let old_digest = old.content_hash;

        let new_id = TemplateId::new();
        let successor = RequirementTemplate {
            id: new_id,
            content: new_content,
            category,
            content_hash: digest,
            version: old_version + 1,
            state: TemplateState::Active,
            superseded_by: None,
            created_at: Timestamp::now(),
        };

        self.by_content.remove(&old_digest);
        self.by_content.insert(digest, new_id);
        self.templates.insert(new_id, successor);
        // Re-borrow mutably to close out the old row.
        if let Some(old) = self.templates.get_mut(old_id) {
            old.state = TemplateState::Superseded;
            old.superseded_by = Some(new_id);
        }

        Ok(SupersedeOutcome {
            new_id,
            new_version: old_version + 1,
        })
    }

    /// Absorb a template into another: the operator's resolution of a
    /// confirmed merge candidate. The absorbed row is retained as
    /// superseded, linked to the canonical template it merged into.
    pub fn absorb(
        &mut self,
        candidate_id: &TemplateId,
        into_id: &TemplateId,
    ) -> Result<(), EngineError> {
        if candidate_id == into_id {
            return Err(EngineError::Validation(
                "cannot merge a template into itself".into(),
            ));
        }
        let candidate = self.get_template(candidate_id)?;
        if !candidate.is_active() {
            return Err(EngineError::Conflict {
                entity: "template",
                id: candidate_id.to_string(),
                expected_version: candidate.version,
                current_version: candidate.version,
            });
        }
        let candidate_digest = candidate.content_hash;
        let into = self.get_template(into_id)?;
        if !into.is_active() {
            return Err(EngineError::Validation(format!(
                "merge target {into_id} is superseded"
            )));
        }

        self.by_content.remove(&candidate_digest);
        if let Some(candidate) = self.templates.get_mut(candidate_id) {
            candidate.state = TemplateState::Superseded;
            candidate.superseded_by = Some(*into_id);
        }
        Ok(())
    }

    /// Follow the supersede chain from `id` to the current active head.
    ///
    /// Merge candidates record the canonical template they resembled at
    /// flag time; by review time that template may itself have been
    /// superseded, so merges resolve against the chain head.
    pub fn resolve_current(&self, id: &TemplateId) -> Result<TemplateId, EngineError> {
        let mut current = self.get_template(id)?;
        // Chains are finite: supersede links never point backwards.
        let mut hops = 0usize;
        while let Some(next) = current.superseded_by {
            current = self.get_template(&next)?;
            hops += 1;
            if hops > self.templates.len() {
                return Err(EngineError::Validation(format!(
                    "supersede chain from {id} does not terminate"
                )));
            }
        }
        Ok(current.id)
    }

    /// Iterate active templates in unspecified order.
    pub fn iter_active(&self) -> impl Iterator<Item = &RequirementTemplate> {
        self.templates.values().filter(|t| t.is_active())
    }

    /// Iterate every template, including superseded versions.
    pub fn iter_all(&self) -> impl Iterator<Item = &RequirementTemplate> {
        self.templates.values()
    }

    /// Whether the given id exists (active or superseded).
    pub fn contains(&self, id: &TemplateId) -> bool {
        self.templates.contains_key(id)
    }

    /// Whether the given id exists and is the current canonical version.
    pub fn is_active(&self, id: &TemplateId) -> bool {
        self.templates.get(id).map(|t| t.is_active()).unwrap_or(false)
    }

    /// The set of categories carried by active templates.
    pub fn categories(&self) -> BTreeSet<Category> {
        self.iter_active().map(|t| t.category.clone()).collect()
    }

    /// Number of templates, including superseded versions.
    pub fn len(&self) -> usize {
        self.templates.len()
    }

    /// Whether the store holds no templates.
    pub fn is_empty(&self) -> bool {
        self.templates.is_empty()
    }
}
