//! Resolve raw detector labels onto catalog entries

use crate::catalog::{Catalog, CatalogEntry};
use crate::similarity::similarity;
use serde::{Deserialize, Serialize};

/// Alias similarity must be strictly above this to count as a match
pub const SIMILARITY_THRESHOLD: f64 = 0.7;

/// Detection confidence must be strictly above this to be matched at all
pub const MIN_MATCH_CONFIDENCE: f64 = 0.3;

/// How many detector candidates are considered, highest confidence first
pub const DEFAULT_TOP_K: usize = 3;

/// Resolution policy
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MatchPolicy {
    /// Walk the catalog in order and return the first entry with a
    /// qualifying alias
    #[default]
    FirstMatch,
    /// Return the entry with the highest qualifying alias similarity;
    /// ties go to the earlier entry
    BestMatch,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct MatcherConfig {
    pub similarity_threshold: f64,
    pub min_confidence: f64,
    pub top_k: usize,
    pub policy: MatchPolicy,
}

impl Default for MatcherConfig {
    fn default() -> Self {
        Self {
            similarity_threshold: SIMILARITY_THRESHOLD,
            min_confidence: MIN_MATCH_CONFIDENCE,
            top_k: DEFAULT_TOP_K,
            policy: MatchPolicy::FirstMatch,
        }
    }
}

/// A successful resolution
#[derive(Debug, Clone, PartialEq)]
pub struct CatalogMatch<'a> {
    pub entry: &'a CatalogEntry,
    pub label: String,
    pub alias: &'a str,
    pub similarity: f64,
    pub confidence: f64,
    /// Position of the resolved label in the input of
    /// [`CatalogMatcher::match_candidates`]; 0 for [`CatalogMatcher::match_label`]
    pub candidate_index: usize,
}

pub struct CatalogMatcher<'a> {
    catalog: &'a Catalog,
    config: MatcherConfig,
}

impl<'a> CatalogMatcher<'a> {
    pub fn new(catalog: &'a Catalog, config: MatcherConfig) -> Self {
        Self { catalog, config }
    }

    pub fn with_defaults(catalog: &'a Catalog) -> Self {
        Self::new(catalog, MatcherConfig::default())
    }

    pub fn config(&self) -> &MatcherConfig {
        &self.config
    }

    /// Resolve one label. `None` means "Unknown Item".
    pub fn match_label(&self, label: &str, confidence: f64) -> Option<CatalogMatch<'a>> {
        if confidence <= self.config.min_confidence {
            return None;
        }

        let mut best: Option<CatalogMatch<'a>> = None;

        for entry in self.catalog {
            let Some((alias, score)) = self.best_alias(entry, label) else {
                continue;
            };

            let candidate = CatalogMatch {
                entry,
                label: label.to_string(),
                alias,
                similarity: score,
                confidence,
                candidate_index: 0,
            };

            match self.config.policy {
                MatchPolicy::FirstMatch => return Some(candidate),
                MatchPolicy::BestMatch => {
                    if best.as_ref().is_none_or(|b| score > b.similarity) {
                        best = Some(candidate);
                    }
                }
            }
        }

        best
    }

    /// Resolve a set of detector outputs.
    ///
    /// Candidates are ranked by confidence (descending, stable for ties) and
    /// only the first `top_k` are considered. Under `FirstMatch` the first
    /// candidate that resolves wins; under `BestMatch` the highest alias
    /// similarity across all considered candidates wins. The result records
    /// which input candidate it came from.
    pub fn match_candidates<'l, I>(&self, candidates: I) -> Option<CatalogMatch<'a>>
    where
        I: IntoIterator<Item = (&'l str, f64)>,
    {
        let mut ranked: Vec<(usize, &str, f64)> = candidates
            .into_iter()
            .enumerate()
            .map(|(index, (label, confidence))| (index, label, confidence))
            .collect();
        ranked.sort_by(|a, b| b.2.total_cmp(&a.2));
        ranked.truncate(self.config.top_k.max(1));

        let mut best: Option<CatalogMatch<'a>> = None;

        for (index, label, confidence) in ranked {
            let Some(mut found) = self.match_label(label, confidence) else {
                continue;
            };
            found.candidate_index = index;

            match self.config.policy {
                MatchPolicy::FirstMatch => return Some(found),
                MatchPolicy::BestMatch => {
                    if best.as_ref().is_none_or(|b| found.similarity > b.similarity) {
                        best = Some(found);
                    }
                }
            }
        }

        best
    }

    /// Highest-scoring alias of `entry` above the similarity threshold
    fn best_alias(&self, entry: &'a CatalogEntry, label: &str) -> Option<(&'a str, f64)> {
        let mut best: Option<(&'a str, f64)> = None;
        for alias in entry.aliases() {
            let score = similarity(label, alias);
            if score > self.config.similarity_threshold && best.is_none_or(|(_, s)| score > s) {
                best = Some((alias, score));
            }
        }
        best
    }
}
