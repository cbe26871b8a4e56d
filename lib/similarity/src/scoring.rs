//! Scoring engine
//!
//! Reduces the index matches of one candidate identity to a bounded
//! confidence score with a per-index breakdown.
//!
//! ```text
//! contribution(i) = min(index_weight_cap, weight(i) * quality(match(i)))
//! bonus           = min(corroboration_cap, corroboration_bonus * (sources - 1))
//! total           = clamp(sum(contribution) + bonus, 0, 100)
//! ```
//!
//! `sources` counts distinct source-attribute sets among indexes whose
//! contribution reaches `corroboration_threshold`, so two indexes built from
//! the same attributes never corroborate each other.

use crate::compare::{IndexMatch, MatchSignal};
use blindmatch_core::{IndexCatalog, IndexDefinition, ScoringPolicy};
use serde::Serialize;
use std::collections::{BTreeMap, BTreeSet};
use tracing::warn;

const MAX_SCORE: f32 = 100.0;

/// How one index contributed to a score
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct IndexContribution {
    pub index_id: String,
    pub signal: MatchSignal,
    /// Configured index weight
    pub weight: f32,
    /// Match quality in [0.0, 1.0]
    pub quality: f32,
    /// `weight * quality` before capping
    pub raw: f32,
    /// Amount added to the score
    pub contribution: f32,
    /// The per-index cap was applied
    pub capped: bool,
    /// Fuzzy similarity was below the minimum and ignored
    pub discarded: bool,
}

/// A match that could not be scored
#[derive(Debug, Clone, PartialEq, Eq, Serialize, thiserror::Error)]
#[serde(tag = "kind", content = "index_id", rename_all = "snake_case")]
pub enum ScoreIssue {
    #[error("match references unknown index '{0}'")]
    UnknownIndex(String),
}

/// Score of one candidate identity with its audit trail
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct ScoreBreakdown {
    /// Final score, always within [0, 100]
    pub total: f32,
    /// Sum of capped per-index contributions
    pub weighted_sum: f32,
    pub corroboration_bonus: f32,
    /// Independent attribute sets that reached the corroboration threshold
    pub corroborating_sources: usize,
    /// Per-index contributions, ordered by index id
    pub contributions: Vec<IndexContribution>,
    /// Matches excluded from the sum
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub rejected: Vec<ScoreIssue>,
}

impl ScoreBreakdown {
    pub fn contribution(&self, index_id: &str) -> Option<&IndexContribution> {
        self.contributions.iter().find(|c| c.index_id == index_id)
    }

    /// Index with the largest contribution, if any contributed
    pub fn top_index(&self) -> Option<&str> {
        self.contributions
            .iter()
            .filter(|c| c.contribution > 0.0)
            .max_by(|a, b| a.contribution.total_cmp(&b.contribution))
            .map(|c| c.index_id.as_str())
    }
}

/// Score the matches of one candidate against one query.
///
/// Matches naming an index the catalog does not define are reported in
/// [`ScoreBreakdown::rejected`] and left out; the rest are still scored.
/// When several matches name the same index only the strongest counts.
pub fn score(matches: &[IndexMatch], catalog: &IndexCatalog, policy: &ScoringPolicy) -> ScoreBreakdown {
    let mut best: BTreeMap<&str, (&IndexDefinition, IndexContribution)> = BTreeMap::new();
    let mut rejected = Vec::new();

    for m in matches {
        let Some(definition) = catalog.get(&m.index_id) else {
            warn!(index = %m.index_id, "Match references unknown index");
            rejected.push(ScoreIssue::UnknownIndex(m.index_id.clone()));
            continue;
        };

        let candidate = contribution(definition, m.signal, policy);
        match best.get(definition.id.as_str()) {
            Some((_, existing)) if existing.contribution >= candidate.contribution => {}
            _ => {
                best.insert(definition.id.as_str(), (definition, candidate));
            }
        }
    }

    let weighted_sum: f32 = best.values().map(|(_, c)| c.contribution).sum();

    let sources: BTreeSet<Vec<&str>> = best
        .values()
        .filter(|(_, c)| c.contribution > 0.0 && c.contribution >= policy.corroboration_threshold)
        .map(|(definition, _)| definition.attribute_set())
        .collect();
    let corroborating_sources = sources.len();

    let corroboration_bonus = if corroborating_sources >= 2 {
        (policy.corroboration_bonus * (corroborating_sources - 1) as f32).min(policy.corroboration_cap)
    } else {
        0.0
    };

    let total = (weighted_sum + corroboration_bonus).clamp(0.0, MAX_SCORE);

    ScoreBreakdown {
        total,
        weighted_sum,
        corroboration_bonus,
        corroborating_sources,
        contributions: best.into_values().map(|(_, c)| c).collect(),
        rejected,
    }
}

fn contribution(definition: &IndexDefinition, signal: MatchSignal, policy: &ScoringPolicy) -> IndexContribution {
    let quality = signal.quality(policy);
    let raw = definition.weight * quality;

    let discarded = matches!(signal, MatchSignal::Fuzzy { .. }) && quality < policy.min_fuzzy_similarity;
    let (contribution, capped) = if discarded {
        (0.0, false)
    } else if raw > policy.index_weight_cap {
        (policy.index_weight_cap, true)
    } else {
        (raw, false)
    };

    IndexContribution {
        index_id: definition.id.clone(),
        signal,
        weight: definition.weight,
        quality,
        raw,
        contribution,
        capped,
        discarded,
    }
}
