//! # grc-engine — The Readiness Engine Facade
//!
//! The single entry point the administrative and tenant-facing layers
//! talk to. Route handlers and import tooling hold no business logic;
//! they call the operations here and render the results.
//!
//! Every public operation executes as one logical transaction: the
//! domain mutation and its audit append happen under the same exclusive
//! borrow of the engine, so no caller can ever observe the mutation
//! without its audit event. An implementation backed by a durable store
//! would put both writes in one database transaction; the contract is
//! the same.
//!
//! ## Operations
//!
//! - `ingest` — content import path through the deduplication resolver.
//! - `list_catalog` / `get_template` — read-only catalog queries.
//! - `supersede_template` — versioned catalog replacement.
//! - `get_fulfillment` / `update_fulfillment` — tenant ledger access.
//! - `get_org_scorecard` / `score_scope` — scoring with snapshot history.
//! - `review_queue` / `resolve_merge_candidate` — operator dedup review.
//! - `get_audit_trail` — ordered audit queries.

pub mod config;
pub mod engine;

pub use config::EngineConfig;
pub use engine::{CatalogFilter, ComplianceEngine, IngestOutcome, IngestRequest, Page};
