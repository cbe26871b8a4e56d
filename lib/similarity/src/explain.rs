//! Explainability for lookup results
//!
//! Output structures that show how each candidate's score was built from
//! per-index contributions. They carry index ids, signals and numbers only;
//! no attribute value or artifact byte is ever part of an explanation.

use crate::compare::MatchSignal;
use crate::rank::RankedCandidate;
use blindmatch_core::IdentityId;
use serde::Serialize;
use std::collections::BTreeMap;

/// Per-index entry of an explanation
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct IndexExplanation {
    pub signal: MatchSignal,
    pub contribution: f32,
    #[serde(skip_serializing_if = "std::ops::Not::not")]
    pub capped: bool,
    #[serde(skip_serializing_if = "std::ops::Not::not")]
    pub discarded: bool,
}

/// A candidate with its per-index score breakdown
#[derive(Debug, Clone, Serialize)]
pub struct ExplainedResult {
    pub id: IdentityId,
    pub score: f32,
    pub corroboration_bonus: f32,
    /// Contributions keyed by index id
    pub explain: BTreeMap<String, IndexExplanation>,
}

impl ExplainedResult {
    pub fn from_ranked(ranked: RankedCandidate) -> Self {
        let explain = ranked
            .breakdown
            .contributions
            .into_iter()
            .map(|c| {
                (
                    c.index_id,
                    IndexExplanation {
                        signal: c.signal,
                        contribution: c.contribution,
                        capped: c.capped,
                        discarded: c.discarded,
                    },
                )
            })
            .collect();

        Self {
            id: ranked.id,
            score: ranked.score,
            corroboration_bonus: ranked.breakdown.corroboration_bonus,
            explain,
        }
    }

    pub fn from_ranked_list(ranked_list: Vec<RankedCandidate>) -> Vec<Self> {
        ranked_list.into_iter().map(Self::from_ranked).collect()
    }
}

/// Serialized body of a lookup
#[derive(Debug, Clone, Serialize)]
pub struct LookupResponse {
    pub result: Vec<ExplainedResult>,
}

impl LookupResponse {
    pub fn new(results: Vec<ExplainedResult>) -> Self {
        Self { result: results }
    }

    pub fn from_ranked(ranked_list: Vec<RankedCandidate>) -> Self {
        Self::new(ExplainedResult::from_ranked_list(ranked_list))
    }
}

/// Summary statistics for a lookup
#[derive(Debug, Clone, Serialize)]
pub struct LookupStats {
    /// Records compared against the query
    pub candidates_count: usize,
    pub results_count: usize,
    pub avg_score: f32,
    pub best_score: f32,
    /// Index that contributed most to the best result
    pub top_contributing_index: Option<String>,
}

impl LookupStats {
    /// Compute stats from ranked results, which must already be sorted
    pub fn compute(results: &[RankedCandidate], candidates_count: usize) -> Self {
        let Some(best) = results.first() else {
            return Self {
                candidates_count,
                results_count: 0,
                avg_score: 0.0,
                best_score: 0.0,
                top_contributing_index: None,
            };
        };

        let avg_score = results.iter().map(|r| r.score).sum::<f32>() / results.len() as f32;

        Self {
            candidates_count,
            results_count: results.len(),
            avg_score,
            best_score: best.score,
            top_contributing_index: best.breakdown.top_index().map(str::to_string),
        }
    }
}
