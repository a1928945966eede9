//! # grc-core — Foundational Types for the Readiness Stack
//!
//! This crate is the bedrock of the readiness stack. It defines the
//! type-system primitives that the catalog, ledger, scoring, and audit
//! crates build on. Every other crate in the workspace depends on
//! `grc-core`; it depends on nothing internal.
//!
//! ## Key Design Principles
//!
//! 1. **Newtype wrappers for domain primitives.** `TemplateId`, `OrgId`,
//!    `ActorId`, `FrameworkCode`, `Category` — all newtypes with validated
//!    constructors. No bare strings for identifiers, so a framework code
//!    can never be passed where a tenant organization is expected.
//!
//! 2. **`CanonicalBytes` newtype.** ALL content-hash computation flows
//!    through `CanonicalBytes::new()`. No raw `serde_json::to_vec()` for
//!    digests. Idempotent ingest depends on byte-identical hashing of
//!    identical content, and this type makes the wrong-serialization-path
//!    defect class impossible by construction.
//!
//! 3. **UTC-only timestamps.** The `Timestamp` type enforces UTC with Z
//!    suffix and seconds precision, so audit ordering and digest inputs
//!    are deterministic across machines.
//!
//! 4. **One error taxonomy.** `EngineError` carries every domain failure
//!    mode as a typed variant; nothing is stringly swallowed.
//!
//! ## Crate Policy
//!
//! - No dependencies on other `grc-*` crates (this is the leaf of the DAG).
//! - No `unsafe` code.
//! - No `panic!()` or `.unwrap()` outside tests.
//! - All public types derive `Debug`, `Clone`, and implement
//!   `Serialize`/`Deserialize`.

pub mod canonical;
pub mod digest;
pub mod error;
pub mod ident;
pub mod temporal;

// Re-export primary types for ergonomic imports.
pub use canonical::CanonicalBytes;
pub use digest::{sha256_digest, sha256_hex, ContentDigest};
pub use error::{CanonicalizationError, EngineError};
pub use ident::{ActorId, Category, EventId, FrameworkCode, OrgId, TemplateId};
pub use temporal::Timestamp;
