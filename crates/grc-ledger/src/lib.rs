//! # grc-ledger — Tenant Fulfillment Ledger
//!
//! Per-organization records of progress against catalog templates. The
//! ledger never touches the catalog: tenants annotate shared templates
//! with their own status, evidence, tags, and notes, and the shared
//! template is immutable from their side.
//!
//! ## Architecture
//!
//! - **Fulfillment** (`fulfillment.rs`): `FulfillmentStatus`, the
//!   `TenantFulfillment` record, and `FulfillmentPatch`.
//!
//! - **Ledger** (`ledger.rs`): the org-scoped store. Reads materialize a
//!   default record without persisting it; writes are version-checked or
//!   last-writer-wins at the caller's choice. Cross-tenant access is
//!   rejected at this layer, before any row is touched.
//!
//! ## Crate Policy
//!
//! - Depends only on `grc-core`.
//! - Records are never deleted; a requirement that stops applying
//!   transitions to `NotApplicable` instead.

pub mod fulfillment;
pub mod ledger;

pub use fulfillment::{FulfillmentPatch, FulfillmentStatus, TenantFulfillment};
pub use ledger::{FulfillmentLedger, LedgerWrite, OrgScope};
