//! # Text Normalization — Ingest-Time Cleanup Pipeline
//!
//! Framework sources repeat the same guidance text under dozens of codes,
//! but rarely byte-identically: escaped-newline artifacts, UTF-8-decoded-
//! as-Latin-1 mojibake, inconsistent whitespace, and framework-specific
//! boilerplate all creep in. Duplicate detection hashes *normalized* text,
//! so this pipeline runs before any digest is computed. Skipping it makes
//! dedup silently fail on visually identical guidance.
//!
//! Pipeline order matters: repair encoding artifacts first (so `\n`
//! sequences become real separators before tokenization), then lowercase,
//! strip punctuation, collapse whitespace, and finally remove boilerplate
//! stopword phrases (which are themselves normalized, so the removal is
//! insensitive to the same noise).

use std::collections::BTreeSet;

/// Literal escape sequences and mojibake byte runs observed in imported
/// guidance text, with their repairs. The table is deliberately explicit:
/// each entry names one observed artifact, and extending it is a data
/// change, not a logic change.
const REPAIRS: &[(&str, &str)] = &[
    // Literal escape sequences that arrived as text.
    ("\\r\\n", "\n"),
    ("\\n", "\n"),
    ("\\t", " "),
    // Real tabs become spaces so the control-character sweep below
    // cannot join adjacent words.
    ("\t", " "),
    // UTF-8 read as Latin-1/Windows-1252.
    ("\u{00e2}\u{20ac}\u{2122}", "'"),  // â€™  right single quote
    ("\u{00e2}\u{20ac}\u{0153}", "\""), // â€œ  left double quote
    ("\u{00e2}\u{20ac}\u{009d}", "\""), // â€\u{9d} right double quote
    ("\u{00e2}\u{20ac}\u{201c}", "-"),  // â€“  en dash
    ("\u{00e2}\u{20ac}\u{201d}", "-"),  // â€”  em dash
    ("\u{00e2}\u{20ac}\u{00a2}", " "),  // â€¢  bullet
    ("\u{00c2}\u{00a0}", " "),          // Â    non-breaking space
];

/// Boilerplate phrases that frameworks wrap around otherwise identical
/// guidance. Matched against normalized text, so entries are given in
/// normalized form (lowercase, no punctuation).
const DEFAULT_STOPWORDS: &[&str] = &[
    "the organization shall",
    "the organisation shall",
    "the entity shall",
    "this control requires that",
    "as required by this safeguard",
    "in accordance with the applicable framework",
];

/// The normalization pipeline with its configured stopword list.
#[derive(Debug, Clone)]
pub struct Normalizer {
    stopwords: Vec<String>,
}

impl Default for Normalizer {
    fn default() -> Self {
        Self::new(DEFAULT_STOPWORDS.iter().map(|s| s.to_string()).collect())
    }
}

impl Normalizer {
    /// Create a normalizer with a custom stopword phrase list. Phrases
    /// are normalized on the way in so callers can supply raw text.
    pub fn new(stopwords: Vec<String>) -> Self {
        let stopwords = stopwords
            .into_iter()
            .map(|p| base_normalize(&repair_artifacts(&p)))
            .filter(|p| !p.is_empty())
            .collect();
        Self { stopwords }
    }

    /// The configured stopword phrases, in normalized form.
    pub fn stopwords(&self) -> &[String] {
        &self.stopwords
    }

    /// Normalize one text block: repair, lowercase, strip punctuation,
    /// collapse whitespace, remove stopword phrases.
    pub fn normalize(&self, text: &str) -> String {
        let mut out = base_normalize(&repair_artifacts(text));
        // Run removal to a fixpoint: splicing out one phrase can join its
        // neighbors into another occurrence.
        loop {
            let mut changed = false;
            for phrase in &self.stopwords {
                if out.contains(phrase.as_str()) {
                    out = collapse_whitespace(&out.replace(phrase.as_str(), " "));
                    changed = true;
                }
            }
            if !changed {
                break;
            }
        }
        out
    }

    /// Normalize an ordered list of steps into one matching key. The
    /// step boundary is preserved as a separator token so reordering
    /// steps still changes the key.
    pub fn normalize_steps(&self, steps: &[String]) -> String {
        steps
            .iter()
            .map(|s| self.normalize(s))
            .collect::<Vec<_>>()
            .join(" / ")
    }

    /// Token set of a normalized text, for similarity comparison.
    pub fn tokens(&self, text: &str) -> BTreeSet<String> {
        self.normalize(text)
            .split_whitespace()
            .map(|t| t.to_string())
            .collect()
    }

    /// Token set over a list of implementation steps.
    pub fn step_tokens(&self, steps: &[String]) -> BTreeSet<String> {
        steps.iter().flat_map(|s| self.tokens(s)).collect()
    }
}

/// Repair literal escape sequences and encoding mojibake.
pub fn repair_artifacts(text: &str) -> String {
    let mut out = text.to_string();
    for (from, to) in REPAIRS {
        if out.contains(from) {
            out = out.replace(from, to);
        }
    }
    // Strip any remaining control characters except newline.
    out.retain(|c| c == '\n' || !c.is_control());
    out
}

/// Lowercase, replace punctuation with spaces, collapse whitespace.
fn base_normalize(text: &str) -> String {
    let lower = text.to_lowercase();
    let cleaned: String = lower
        .chars()
        .map(|c| {
            if c.is_alphanumeric() || c.is_whitespace() {
                c
            } else {
                ' '
            }
        })
        .collect();
    collapse_whitespace(&cleaned)
}

fn collapse_whitespace(text: &str) -> String {
    text.split_whitespace().collect::<Vec<_>>().join(" ")
}

/// Jaccard similarity of two token sets, in [0.0, 1.0].
///
/// Two empty sets are defined as similarity 0.0 — empty guidance must
/// never look like a perfect duplicate of other empty guidance.
pub fn jaccard(a: &BTreeSet<String>, b: &BTreeSet<String>) -> f64 {
    if a.is_empty() || b.is_empty() {
        return 0.0;
    }
    let overlap = a.intersection(b).count();
    let total = a.union(b).count();
    overlap as f64 / total as f64
}
