//! # Score Snapshots
//!
//! A `ScoreSnapshot` is a derived value: it records what the scoring
//! algorithm produced at one instant and is retained for trend
//! reporting, but the ledger and mapping index remain the source of
//! truth. Replaying the algorithm against current state must always be
//! able to reproduce a snapshot's numbers.

use serde::{Deserialize, Serialize};

use grc_core::{Category, FrameworkCode, OrgId, Timestamp};

/// The grouping a score is computed over.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ScoreScope {
    /// Every active requirement in the catalog.
    Overall,
    /// The requirement(s) cited by one framework code.
    Framework(FrameworkCode),
    /// Every active requirement in one category.
    Category(Category),
}

impl std::fmt::Display for ScoreScope {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Overall => f.write_str("overall"),
            Self::Framework(code) => write!(f, "framework:{code}"),
            Self::Category(category) => write!(f, "category:{category}"),
        }
    }
}

/// Compliance status derived from a score by the configured thresholds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ScoreStatus {
    /// At or above the compliant threshold.
    Compliant,
    /// Between the partial and compliant thresholds.
    Partial,
    /// Below the partial threshold.
    NonCompliant,
    /// No applicable requirements in scope; no score exists.
    Unknown,
}

impl ScoreStatus {
    /// The SCREAMING_SNAKE identifier, matching the serde representation.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Compliant => "COMPLIANT",
            Self::Partial => "PARTIAL",
            Self::NonCompliant => "NON_COMPLIANT",
            Self::Unknown => "UNKNOWN",
        }
    }
}

impl std::fmt::Display for ScoreStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One computed score for one organization and scope.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScoreSnapshot {
    /// The organization scored.
    pub org: OrgId,
    /// The scope scored.
    pub scope: ScoreScope,
    /// When the computation ran.
    pub computed_at: Timestamp,
    /// The score in 0–100, or `None` when nothing was applicable.
    pub score: Option<u8>,
    /// Status derived from the score by the configured thresholds.
    pub status: ScoreStatus,
    /// Requirements that contributed to the denominator.
    pub contributing_count: usize,
    /// Contributing requirements currently fulfilled.
    pub fulfilled_count: usize,
}

/// Retained snapshot history, append-only, for trend reporting.
#[derive(Debug, Default)]
pub struct SnapshotLog {
    entries: Vec<ScoreSnapshot>,
}

impl SnapshotLog {
    /// Create an empty log.
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a snapshot.
    pub fn push(&mut self, snapshot: ScoreSnapshot) {
        self.entries.push(snapshot);
    }

    /// Iterate the history for one organization and scope, oldest first.
    pub fn for_scope<'a>(
        &'a self,
        org: &'a OrgId,
        scope: &'a ScoreScope,
    ) -> impl Iterator<Item = &'a ScoreSnapshot> {
        self.entries
            .iter()
            .filter(move |s| &s.org == org && &s.scope == scope)
    }

    /// The latest snapshot for one organization and scope.
    pub fn latest<'a>(&'a self, org: &'a OrgId, scope: &'a ScoreScope) -> Option<&'a ScoreSnapshot> {
        self.for_scope(org, scope).last()
    }

    /// Total retained snapshots.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Whether the log is empty.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
