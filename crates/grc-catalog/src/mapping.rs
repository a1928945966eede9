//! # Framework Mapping Index
//!
//! The many-to-one association between framework codes and canonical
//! templates. A single "asset inventory" control may carry `cis-ig1-1.1`,
//! `cis-ig2-1.1`, `cis-ig3-1.1`, and `iso-27001-a.5.9` at once; each of
//! those codes resolves to exactly one template at any time.
//!
//! ## Invariant
//!
//! `map_code` refuses a template id the store does not know — a dangling
//! mapping can never be created through this API. Re-pointing an existing
//! code is allowed and reported to the caller so it can be audited.

use std::collections::{BTreeSet, HashMap};

use serde::{Deserialize, Serialize};

use grc_core::{Category, EngineError, FrameworkCode, TemplateId};

use crate::store::CatalogStore;

/// One code-to-template association.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MappingRecord {
    /// The framework-specific code.
    pub code: FrameworkCode,
    /// Human-readable framework name, e.g. "CIS Controls IG1".
    pub framework_display_name: String,
    /// The canonical template the code resolves to.
    pub template_id: TemplateId,
}

/// Result of a `map_code` call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MapOutcome {
    /// Whether the index changed. `false` means the code already pointed
    /// at the requested template and nothing was written.
    pub changed: bool,
    /// The template the code previously resolved to, when the call
    /// re-pointed an existing mapping.
    pub replaced: Option<TemplateId>,
}

/// The framework mapping index.
#[derive(Debug, Default)]
pub struct MappingIndex {
    by_code: HashMap<FrameworkCode, MappingRecord>,
    by_template: HashMap<TemplateId, BTreeSet<FrameworkCode>>,
}

impl MappingIndex {
    /// Create an empty index.
    pub fn new() -> Self {
        Self::default()
    }

    /// Upsert a code → template association.
    ///
    /// # Errors
    ///
    /// Returns `DanglingReference` if `template_id` is unknown to the
    /// store. A superseded target is accepted only through re-pointing
    /// performed by the caller; fresh mappings must target active rows.
    pub fn map_code(
        &mut self,
        store: &CatalogStore,
        code: FrameworkCode,
        framework_display_name: String,
        template_id: TemplateId,
    ) -> Result<MapOutcome, EngineError> {
        if !store.contains(&template_id) {
            return Err(EngineError::DanglingReference {
                code: code.to_string(),
                template_id: template_id.to_string(),
            });
        }
        if !store.is_active(&template_id) {
            return Err(EngineError::Validation(format!(
                "cannot map {code} to superseded template {template_id}"
            )));
        }

        let replaced = match self.by_code.get(&code) {
            Some(existing) if existing.template_id == template_id => {
                // Re-mapping a code to where it already points is a no-op.
                return Ok(MapOutcome {
                    changed: false,
                    replaced: None,
                });
            }
            Some(existing) => {
                let old_template = existing.template_id;
                if let Some(codes) = self.by_template.get_mut(&old_template) {
                    codes.remove(&code);
                    if codes.is_empty() {
                        self.by_template.remove(&old_template);
                    }
                }
                Some(old_template)
            }
            None => None,
        };

        self.by_template
            .entry(template_id)
            .or_default()
            .insert(code.clone());
        self.by_code.insert(
            code.clone(),
            MappingRecord {
                code,
                framework_display_name,
                template_id,
            },
        );
        Ok(MapOutcome {
            changed: true,
            replaced,
        })
    }

    /// Resolve a framework code to its canonical template.
    pub fn resolve_code(&self, code: &FrameworkCode) -> Result<TemplateId, EngineError> {
        self.by_code
            .get(code)
            .map(|r| r.template_id)
            .ok_or_else(|| EngineError::not_found("mapping", code))
    }

    /// Fetch the full mapping record for a code.
    pub fn get_mapping(&self, code: &FrameworkCode) -> Result<&MappingRecord, EngineError> {
        self.by_code
            .get(code)
            .ok_or_else(|| EngineError::not_found("mapping", code))
    }

    /// All framework codes citing a template. Empty when none do.
    pub fn codes_for(&self, template_id: &TemplateId) -> BTreeSet<FrameworkCode> {
        self.by_template
            .get(template_id)
            .cloned()
            .unwrap_or_default()
    }

    /// The category of the template a code resolves to. Delegates to the
    /// template — categories are never stored per mapping.
    pub fn category_for(
        &self,
        store: &CatalogStore,
        code: &FrameworkCode,
    ) -> Result<Category, EngineError> {
        let template_id = self.resolve_code(code)?;
        Ok(store.get_template(&template_id)?.category.clone())
    }

    /// Move every code pointing at `from` onto `to`. Used when a
    /// template is superseded or absorbed. Returns the moved codes in
    /// order, for auditing.
    pub fn repoint_all(
        &mut self,
        from: &TemplateId,
        to: TemplateId,
    ) -> Vec<FrameworkCode> {
        let codes = match self.by_template.remove(from) {
            Some(codes) => codes,
            None => return Vec::new(),
        };
        let mut moved = Vec::with_capacity(codes.len());
        for code in codes {
            if let Some(record) = self.by_code.get_mut(&code) {
                record.template_id = to;
            }
            self.by_template.entry(to).or_default().insert(code.clone());
            moved.push(code);
        }
        moved
    }

    /// Iterate every mapping record in unspecified order.
    pub fn iter(&self) -> impl Iterator<Item = &MappingRecord> {
        self.by_code.values()
    }

    /// Number of mapped codes.
    pub fn len(&self) -> usize {
        self.by_code.len()
    }

    /// Whether no codes are mapped.
    pub fn is_empty(&self) -> bool {
        self.by_code.is_empty()
    }
}
