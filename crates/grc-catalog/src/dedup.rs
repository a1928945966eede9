//! # Deduplication Resolver — Three-Tier Ingest Decision
//!
//! When a requirement arrives under a new framework code, the resolver
//! decides whether it is an existing canonical requirement, a suspicious
//! near-duplicate, or genuinely new:
//!
//! 1. **Exact**: the digest of the normalized (title, steps) text matches
//!    an indexed template → map the code there, create nothing. Safe to
//!    automate; the source data repeats identical guidance verbatim
//!    across dozens of codes.
//! 2. **Candidate**: Jaccard similarity of the implementation-step token
//!    sets reaches the threshold (default 0.85) → the requirement is
//!    stored, but flagged into the operator review queue. Fuzzy merging
//!    is never automatic, because a wrong merge corrupts the shared
//!    catalog for every tenant at once.
//! 3. **New**: neither → a fresh canonical template.
//!
//! Similarity is computed over the implementation steps specifically;
//! purpose text is often generic across unrelated controls and would
//! inflate the match rate.

use std::collections::{BTreeSet, HashMap};

use serde::{Deserialize, Serialize};

use grc_core::{
    sha256_digest, CanonicalBytes, ContentDigest, EngineError, FrameworkCode, TemplateId,
    Timestamp,
};

use crate::normalize::{jaccard, Normalizer};

/// Default similarity threshold for merge-candidate flagging.
pub const DEFAULT_SIMILARITY_THRESHOLD: f64 = 0.85;

/// Configuration for the resolver.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct DedupConfig {
    /// Jaccard similarity at or above which a new requirement is flagged
    /// as a merge candidate.
    pub similarity_threshold: f64,
    /// Additional boilerplate phrases stripped during normalization, on
    /// top of the built-in list.
    pub extra_stopwords: Vec<String>,
}

impl Default for DedupConfig {
    fn default() -> Self {
        Self {
            similarity_threshold: DEFAULT_SIMILARITY_THRESHOLD,
            extra_stopwords: Vec::new(),
        }
    }
}

impl DedupConfig {
    /// The threshold, clamped into (0.0, 1.0].
    ///
    /// NaN falls back to the default; out-of-range values are clamped
    /// rather than rejected so a bad config degrades predictably.
    pub fn clamped_threshold(&self) -> f64 {
        let t = self.similarity_threshold;
        if t.is_nan() {
            tracing::warn!("dedup: NaN similarity threshold, using default {DEFAULT_SIMILARITY_THRESHOLD}");
            DEFAULT_SIMILARITY_THRESHOLD
        } else if t <= 0.0 {
            tracing::warn!(threshold = t, "dedup: threshold <= 0.0, clamping to 0.01");
            0.01
        } else if t > 1.0 {
            tracing::warn!(threshold = t, "dedup: threshold > 1.0, clamping to 1.0");
            1.0
        } else {
            t
        }
    }
}

/// The resolver's verdict for one incoming requirement.
#[derive(Debug, Clone, PartialEq)]
pub enum DedupDecision {
    /// Normalized content is identical to an existing template.
    ExactMatch(TemplateId),
    /// Suspiciously similar to an existing template; store but flag.
    NearDuplicate {
        /// The most similar existing template.
        closest: TemplateId,
        /// The similarity that triggered the flag.
        similarity: f64,
    },
    /// Genuinely new content.
    New,
}

/// A near-duplicate surfaced for operator review.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MergeCandidate {
    /// The newly created template under suspicion.
    pub template_id: TemplateId,
    /// The existing template it resembles.
    pub canonical_id: TemplateId,
    /// Step-token Jaccard similarity at flag time.
    pub similarity: f64,
    /// The framework code whose ingestion raised the flag.
    pub code: FrameworkCode,
    /// When the candidate was flagged.
    pub flagged_at: Timestamp,
    /// Review outcome.
    pub disposition: ReviewDisposition,
}

/// Operator review outcome for a merge candidate.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ReviewDisposition {
    /// Awaiting review.
    Open,
    /// Confirmed duplicate; absorbed into the canonical template.
    Merged,
    /// Intentional duplicate; both templates stand.
    Dismissed,
}

impl std::fmt::Display for ReviewDisposition {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Open => f.write_str("OPEN"),
            Self::Merged => f.write_str("MERGED"),
            Self::Dismissed => f.write_str("DISMISSED"),
        }
    }
}

/// The deduplication resolver: normalized-content index, similarity
/// search, and the merge-candidate review queue.
#[derive(Debug)]
pub struct DedupResolver {
    normalizer: Normalizer,
    threshold: f64,
    by_normalized: HashMap<ContentDigest, TemplateId>,
    step_tokens: HashMap<TemplateId, BTreeSet<String>>,
    candidates: Vec<MergeCandidate>,
}

impl DedupResolver {
    /// Create a resolver from configuration.
    pub fn new(config: &DedupConfig) -> Self {
        let mut stopwords: Vec<String> = Normalizer::default()
            .stopwords()
            .to_vec();
        stopwords.extend(config.extra_stopwords.iter().cloned());
        Self {
            normalizer: Normalizer::new(stopwords),
            threshold: config.clamped_threshold(),
            by_normalized: HashMap::new(),
            step_tokens: HashMap::new(),
            candidates: Vec::new(),
        }
    }

    /// The active normalizer.
    pub fn normalizer(&self) -> &Normalizer {
        &self.normalizer
    }

    /// Digest of the normalized (title, steps) content.
    pub fn normalized_digest(
        &self,
        title: &str,
        steps: &[String],
    ) -> Result<ContentDigest, EngineError> {
        let key = serde_json::json!({
            "title": self.normalizer.normalize(title),
            "steps": self.normalizer.normalize_steps(steps),
        });
        let cb = CanonicalBytes::new(&key)?;
        Ok(sha256_digest(&cb))
    }

    /// Decide how an incoming requirement relates to the catalog.
    pub fn decide(&self, title: &str, steps: &[String]) -> Result<DedupDecision, EngineError> {
        let digest = self.normalized_digest(title, steps)?;
        if let Some(existing) = self.by_normalized.get(&digest) {
            return Ok(DedupDecision::ExactMatch(*existing));
        }

        let incoming = self.normalizer.step_tokens(steps);
        // Deterministic best-match scan: highest similarity wins, ties
        // broken by template id so re-runs decide identically.
        let mut best: Option<(TemplateId, f64)> = None;
        for (id, tokens) in &self.step_tokens {
            let sim = jaccard(&incoming, tokens);
            if sim < self.threshold {
                continue;
            }
            best = match best {
                None => Some((*id, sim)),
                Some((best_id, best_sim)) => {
                    if sim > best_sim || (sim == best_sim && *id < best_id) {
                        Some((*id, sim))
                    } else {
                        Some((best_id, best_sim))
                    }
                }
            };
        }

        Ok(match best {
            Some((closest, similarity)) => DedupDecision::NearDuplicate { closest, similarity },
            None => DedupDecision::New,
        })
    }

    /// Index a template's normalized content for future decisions.
    pub fn register(
        &mut self,
        id: TemplateId,
        title: &str,
        steps: &[String],
    ) -> Result<(), EngineError> {
        let digest = self.normalized_digest(title, steps)?;
        self.by_normalized.entry(digest).or_insert(id);
        self.step_tokens.insert(id, self.normalizer.step_tokens(steps));
        Ok(())
    }

    /// Remove a template from the indexes (superseded or absorbed rows
    /// must stop attracting matches).
    pub fn unregister(
        &mut self,
        id: &TemplateId,
        title: &str,
        steps: &[String],
    ) -> Result<(), EngineError> {
        let digest = self.normalized_digest(title, steps)?;
        if self.by_normalized.get(&digest) == Some(id) {
            self.by_normalized.remove(&digest);
        }
        self.step_tokens.remove(id);
        Ok(())
    }

    /// Flag a near-duplicate into the review queue.
    pub fn flag_candidate(
        &mut self,
        template_id: TemplateId,
        canonical_id: TemplateId,
        similarity: f64,
        code: FrameworkCode,
    ) -> MergeCandidate {
        tracing::info!(
            %template_id,
            %canonical_id,
            similarity,
            %code,
            "merge candidate flagged for review"
        );
        let candidate = MergeCandidate {
            template_id,
            canonical_id,
            similarity,
            code,
            flagged_at: Timestamp::now(),
            disposition: ReviewDisposition::Open,
        };
        self.candidates.push(candidate.clone());
        candidate
    }

    /// Candidates awaiting review.
    pub fn open_candidates(&self) -> impl Iterator<Item = &MergeCandidate> {
        self.candidates
            .iter()
            .filter(|c| c.disposition == ReviewDisposition::Open)
    }

    /// Every candidate ever flagged, including resolved ones.
    pub fn all_candidates(&self) -> &[MergeCandidate] {
        &self.candidates
    }

    /// Resolve the open candidate for `template_id`.
    ///
    /// # Errors
    ///
    /// `NotFound` when no open candidate references that template;
    /// `Validation` when attempting to resolve to `Open`.
    pub fn resolve_candidate(
        &mut self,
        template_id: &TemplateId,
        disposition: ReviewDisposition,
    ) -> Result<MergeCandidate, EngineError> {
        if disposition == ReviewDisposition::Open {
            return Err(EngineError::Validation(
                "resolution must be merged or dismissed".into(),
            ));
        }
        let candidate = self
            .candidates
            .iter_mut()
            .find(|c| c.disposition == ReviewDisposition::Open && &c.template_id == template_id)
            .ok_or_else(|| EngineError::not_found("merge_candidate", template_id))?;
        candidate.disposition = disposition;
        Ok(candidate.clone())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn steps(list: &[&str]) -> Vec<String> {
        list.iter().map(|s| s.to_string()).collect()
    }

    fn resolver() -> DedupResolver {
        DedupResolver::new(&DedupConfig::default())
    }

    #[test]
    fn test_empty_catalog_everything_is_new() {
        let r = resolver();
        let decision = r.decide("Asset inventory", &steps(&["Enumerate assets"])).unwrap();
        assert_eq!(decision, DedupDecision::New);
    }

    #[test]
    fn test_exact_match_after_register() {
        let mut r = resolver();
        let id = TemplateId::new();
        r.register(id, "Asset inventory", &steps(&["Enumerate assets", "Review quarterly"]))
            .unwrap();
        let decision = r
            .decide("Asset inventory", &steps(&["Enumerate assets", "Review quarterly"]))
            .unwrap();
        assert_eq!(decision, DedupDecision::ExactMatch(id));
    }

    #[test]
    fn test_exact_match_survives_encoding_artifacts() {
        let mut r = resolver();
        let id = TemplateId::new();
        r.register(id, "Asset inventory", &steps(&["Enumerate assets.\nReview quarterly."]))
            .unwrap();
        // The same guidance with a literal escaped newline must still
        // collapse onto the existing template.
        let decision = r
            .decide("Asset inventory", &steps(&["Enumerate assets.\\nReview quarterly."]))
            .unwrap();
        assert_eq!(decision, DedupDecision::ExactMatch(id));
    }

    #[test]
    fn test_near_duplicate_flagged_not_matched() {
        let mut r = resolver();
        let id = TemplateId::new();
        r.register(
            id,
            "Asset inventory",
            &steps(&["Establish and maintain a detailed accurate inventory of all organizational hardware assets"]),
        )
        .unwrap();
        // 11 of 12 tokens shared: similarity 11/12 ≈ 0.92.
        let decision = r
            .decide(
                "Asset inventory",
                &steps(&["Establish and maintain a detailed inventory of all organizational hardware assets"]),
            )
            .unwrap();
        match decision {
            DedupDecision::NearDuplicate { closest, similarity } => {
                assert_eq!(closest, id);
                assert!(similarity >= DEFAULT_SIMILARITY_THRESHOLD);
                assert!(similarity < 1.0);
            }
            other => panic!("expected NearDuplicate, got {other:?}"),
        }
    }

    #[test]
    fn test_dissimilar_content_is_new() {
        let mut r = resolver();
        r.register(
            TemplateId::new(),
            "Asset inventory",
            &steps(&["Establish and maintain an asset inventory"]),
        )
        .unwrap();
        let decision = r
            .decide("Incident response", &steps(&["Designate an incident response team"]))
            .unwrap();
        assert_eq!(decision, DedupDecision::New);
    }

    #[test]
    fn test_unregister_stops_matching() {
        let mut r = resolver();
        let id = TemplateId::new();
        let s = steps(&["Enumerate assets"]);
        r.register(id, "Asset inventory", &s).unwrap();
        r.unregister(&id, "Asset inventory", &s).unwrap();
        let decision = r.decide("Asset inventory", &s).unwrap();
        assert_eq!(decision, DedupDecision::New);
    }

    #[test]
    fn test_threshold_clamping() {
        let cfg = DedupConfig {
            similarity_threshold: 7.0,
            extra_stopwords: Vec::new(),
        };
        assert_eq!(cfg.clamped_threshold(), 1.0);

        let cfg = DedupConfig {
            similarity_threshold: -0.5,
            extra_stopwords: Vec::new(),
        };
        assert_eq!(cfg.clamped_threshold(), 0.01);

        let cfg = DedupConfig {
            similarity_threshold: f64::NAN,
            extra_stopwords: Vec::new(),
        };
        assert_eq!(cfg.clamped_threshold(), DEFAULT_SIMILARITY_THRESHOLD);
    }

    #[test]
    fn test_flag_and_resolve_candidate() {
        let mut r = resolver();
        let new_id = TemplateId::new();
        let canon = TemplateId::new();
        r.flag_candidate(new_id, canon, 0.9, FrameworkCode::new("cis-ig2-1.1").unwrap());
        assert_eq!(r.open_candidates().count(), 1);

        let resolved = r.resolve_candidate(&new_id, ReviewDisposition::Merged).unwrap();
        assert_eq!(resolved.disposition, ReviewDisposition::Merged);
        assert_eq!(r.open_candidates().count(), 0);
        assert_eq!(r.all_candidates().len(), 1);
    }

    #[test]
    fn test_resolve_candidate_twice_fails() {
        let mut r = resolver();
        let new_id = TemplateId::new();
        r.flag_candidate(new_id, TemplateId::new(), 0.88, FrameworkCode::new("gdpr-art-32").unwrap());
        r.resolve_candidate(&new_id, ReviewDisposition::Dismissed).unwrap();
        assert!(r.resolve_candidate(&new_id, ReviewDisposition::Merged).is_err());
    }

    #[test]
    fn test_resolve_to_open_rejected() {
        let mut r = resolver();
        let new_id = TemplateId::new();
        r.flag_candidate(new_id, TemplateId::new(), 0.88, FrameworkCode::new("dora-9.2").unwrap());
        assert!(matches!(
            r.resolve_candidate(&new_id, ReviewDisposition::Open),
            Err(EngineError::Validation(_))
        ));
    }

    #[test]
    fn test_config_deserializes_with_defaults() {
        let cfg: DedupConfig = serde_json::from_str("{}").unwrap();
        assert_eq!(cfg.similarity_threshold, DEFAULT_SIMILARITY_THRESHOLD);
        assert!(cfg.extra_stopwords.is_empty());
    }
}
