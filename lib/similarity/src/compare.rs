//! Artifact comparison
//!
//! Compares a query artifact with a stored one under the same index
//! definition. All functions are pure; policy outcomes such as mismatched
//! lengths or empty inputs resolve to "no similarity" rather than errors.

use blindmatch_core::{BitVector, IndexDefinition, IndexInstance, MatchType, ScoringPolicy};
use serde::{Deserialize, Serialize};

/// Outcome of comparing two artifacts of one index
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum MatchSignal {
    /// Equal keyed digests of normalized values
    Exact,
    /// Equal keyed digests of phonetic codes
    Phonetic,
    /// Dice similarity of Bloom vectors, in [0.0, 1.0]
    Fuzzy { similarity: f32 },
    /// Digests differ, or one side was empty
    #[serde(rename = "none")]
    NoMatch,
}

impl MatchSignal {
    /// Strength of the evidence, in [0.0, 1.0]
    pub fn quality(&self, policy: &ScoringPolicy) -> f32 {
        let quality = match self {
            MatchSignal::Exact => 1.0,
            MatchSignal::Phonetic => policy.phonetic_quality,
            MatchSignal::Fuzzy { similarity } => *similarity,
            MatchSignal::NoMatch => 0.0,
        };
        if quality.is_finite() {
            quality.clamp(0.0, 1.0)
        } else {
            0.0
        }
    }

    pub fn is_match(&self) -> bool {
        match self {
            MatchSignal::Exact | MatchSignal::Phonetic => true,
            MatchSignal::Fuzzy { similarity } => *similarity > 0.0,
            MatchSignal::NoMatch => false,
        }
    }
}

/// Result of comparing one query artifact with one stored artifact
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct IndexMatch {
    pub index_id: String,
    pub signal: MatchSignal,
}

impl IndexMatch {
    pub fn new(index_id: impl Into<String>, signal: MatchSignal) -> Self {
        Self {
            index_id: index_id.into(),
            signal,
        }
    }

    pub fn exact(index_id: impl Into<String>) -> Self {
        Self::new(index_id, MatchSignal::Exact)
    }

    pub fn phonetic(index_id: impl Into<String>) -> Self {
        Self::new(index_id, MatchSignal::Phonetic)
    }

    pub fn fuzzy(index_id: impl Into<String>, similarity: f32) -> Self {
        Self::new(index_id, MatchSignal::Fuzzy { similarity })
    }
}

/// Dice coefficient `2|A∩B| / (|A|+|B|)` over set bits.
///
/// Returns 0.0 for vectors of different declared length and for two empty
/// vectors; an empty encoding is never a perfect match.
#[inline]
pub fn dice(a: &BitVector, b: &BitVector) -> f32 {
    if a.len() != b.len() {
        return 0.0;
    }

    let total = a.count_ones() + b.count_ones();
    if total == 0 {
        return 0.0;
    }

    (2 * a.intersection_count(b)) as f32 / total as f32
}

/// Compare a query artifact with a stored artifact of the same index
pub fn compare(query: &IndexInstance, stored: &IndexInstance, definition: &IndexDefinition) -> IndexMatch {
    let signal = match definition.match_type {
        MatchType::Fuzzy { bits, .. } => {
            let similarity = match (query.as_bloom(), stored.as_bloom()) {
                (Some(q), Some(s)) if q.len() == bits && s.len() == bits => dice(q, s),
                _ => 0.0,
            };
            MatchSignal::Fuzzy { similarity }
        }
        MatchType::Exact | MatchType::Phonetic => match (query.as_digest(), stored.as_digest()) {
            (Some(q), Some(s)) if !q.is_empty() && q.ct_eq(s) => {
                if definition.match_type == MatchType::Exact {
                    MatchSignal::Exact
                } else {
                    MatchSignal::Phonetic
                }
            }
            _ => MatchSignal::NoMatch,
        },
    };

    IndexMatch {
        index_id: definition.id.clone(),
        signal,
    }
}
