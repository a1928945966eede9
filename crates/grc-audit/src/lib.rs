//! # grc-audit — Append-Only Audit Trail
//!
//! Records an immutable event for every mutation to the catalog, the
//! framework mapping index, and the tenant fulfillment ledger. The trail
//! is the sole ground truth for "who changed what, when."
//!
//! ## Architecture
//!
//! - **Event** (`event.rs`): `AuditEvent` with actor, entity reference,
//!   action, and before/after state captured as JSON values.
//!
//! - **Trail** (`trail.rs`): the append-only store, ordered queries with
//!   filters, and the `AuditSink` trait that write paths record through.
//!
//! ## Crate Policy
//!
//! - No update or delete operations exist on the trail, by construction:
//!   the event vector is private and the public surface is append + query.
//! - Depends only on `grc-core`.

pub mod event;
pub mod trail;

pub use event::{AuditAction, AuditEvent, EntityKind, EventDraft};
pub use trail::{creation_draft, mutation_draft, AuditFilter, AuditSink, AuditTrail};
