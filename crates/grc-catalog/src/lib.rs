//! # grc-catalog — Canonical Requirement Catalog
//!
//! The shared, deduplicated catalog of control requirements drawn from
//! multiple overlapping frameworks, and the machinery that keeps it
//! deduplicated as new framework sources are ingested.
//!
//! ## Architecture
//!
//! - **Template** (`template.rs`): `RequirementTemplate` — canonical title,
//!   guidance (purpose + ordered implementation steps), category, content
//!   digest, version counter, Active/Superseded lifecycle.
//!
//! - **Store** (`store.rs`): keyed template store. `put_template` is
//!   idempotent on identical content; `supersede` is version-checked and
//!   retains the old row for historical score recomputation.
//!
//! - **Mapping** (`mapping.rs`): the many-to-one index from framework
//!   codes to templates. One code resolves to exactly one template; one
//!   template carries many codes.
//!
//! - **Normalize** (`normalize.rs`): the ingest-time text pipeline —
//!   encoding-artifact repair, lowercasing, punctuation stripping,
//!   whitespace collapse, boilerplate stopword removal, tokenization.
//!
//! - **Dedup** (`dedup.rs`): the three-tier ingest decision (exact match /
//!   merge candidate / new) and the operator review queue for near
//!   duplicates. Exact collapse is automatic; fuzzy merging never is.
//!
//! ## Crate Policy
//!
//! - The catalog is owned by the platform operator. Nothing in this crate
//!   knows about tenants; tenant state lives in `grc-ledger`.
//! - Templates are never deleted, only superseded.

pub mod dedup;
pub mod mapping;
pub mod normalize;
pub mod store;
pub mod template;

pub use dedup::{DedupConfig, DedupDecision, DedupResolver, MergeCandidate, ReviewDisposition};
pub use mapping::{MapOutcome, MappingIndex, MappingRecord};
pub use normalize::Normalizer;
pub use store::{CatalogStore, PutOutcome, SupersedeOutcome};
pub use template::{RequirementTemplate, TemplateContent, TemplateState};
