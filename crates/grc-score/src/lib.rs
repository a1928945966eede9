//! # grc-score — Compliance Scoring Engine
//!
//! Computes reproducible compliance scores for a scope (one framework
//! code, one category, or the whole catalog) from the current fulfillment
//! ledger. The engine is strictly read-only over the ledger and the
//! catalog; its only output is `ScoreSnapshot` values, which are derived
//! state and can be recomputed from scratch at any time.
//!
//! ## Architecture
//!
//! - **Config** (`config.rs`): thresholds and per-template weights,
//!   YAML-loadable, validated. Thresholds are deployment configuration,
//!   never hard-coded at call sites.
//!
//! - **Snapshot** (`snapshot.rs`): `ScoreScope`, `ScoreStatus`,
//!   `ScoreSnapshot`, and the retained snapshot history for trends.
//!
//! - **Engine** (`engine.rs`): scope resolution and the weighted credit
//!   sum. Not-applicable rows are excluded from numerator and
//!   denominator; an empty applicable set scores `None`/UNKNOWN rather
//!   than a misleading zero or hundred.

pub mod config;
pub mod engine;
pub mod snapshot;

pub use config::ScoringConfig;
pub use engine::{Scorecard, ScoringEngine};
pub use snapshot::{ScoreScope, ScoreSnapshot, ScoreStatus, SnapshotLog};
