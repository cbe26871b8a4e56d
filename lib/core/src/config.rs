//! Engine configuration
//!
//! Index definitions and scoring thresholds are read once at startup,
//! validated, and then passed around by reference. Nothing here is mutated
//! after construction.

use crate::index::{IndexCatalog, IndexDefinition, MAX_WEIGHT};
use crate::{Error, Result};
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Thresholds and caps used by the scoring engine.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct ScoringPolicy {
    /// Maximum contribution of a single index
    pub index_weight_cap: f32,
    /// Match quality credited to a phonetic match
    pub phonetic_quality: f32,
    /// Fuzzy similarities below this are discarded
    pub min_fuzzy_similarity: f32,
    /// Minimal contribution for an index to count as corroborating evidence
    pub corroboration_threshold: f32,
    /// Bonus per corroborating source beyond the first
    pub corroboration_bonus: f32,
    /// Maximum total corroboration bonus
    pub corroboration_cap: f32,
    /// Candidates scoring at or below this are not reported
    pub min_candidate_score: f32,
    /// Maximum number of ranked candidates per lookup
    pub max_candidates: usize,
}

impl Default for ScoringPolicy {
    fn default() -> Self {
        Self {
            index_weight_cap: 80.0,
            phonetic_quality: 0.8,
            min_fuzzy_similarity: 0.7,
            corroboration_threshold: 10.0,
            corroboration_bonus: 10.0,
            corroboration_cap: 20.0,
            min_candidate_score: 0.0,
            max_candidates: 10,
        }
    }
}

impl ScoringPolicy {
    pub fn validate(&self) -> Result<()> {
        let points = [
            ("index_weight_cap", self.index_weight_cap),
            ("corroboration_threshold", self.corroboration_threshold),
            ("corroboration_bonus", self.corroboration_bonus),
            ("corroboration_cap", self.corroboration_cap),
            ("min_candidate_score", self.min_candidate_score),
        ];
        for (name, value) in points {
            if !value.is_finite() || !(0.0..=MAX_WEIGHT).contains(&value) {
                return Err(Error::InvalidConfig(format!("{} must be within 0..=100", name)));
            }
        }

        let ratios = [
            ("phonetic_quality", self.phonetic_quality),
            ("min_fuzzy_similarity", self.min_fuzzy_similarity),
        ];
        for (name, value) in ratios {
            if !value.is_finite() || !(0.0..=1.0).contains(&value) {
                return Err(Error::InvalidConfig(format!("{} must be within 0..=1", name)));
            }
        }

        if self.max_candidates == 0 {
            return Err(Error::InvalidConfig("max_candidates must be positive".to_string()));
        }
        Ok(())
    }
}

/// On-disk engine configuration
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct EngineConfig {
    /// Config version for future compatibility
    #[serde(default = "default_version")]
    pub version: u32,

    pub indexes: Vec<IndexDefinition>,

    #[serde(default)]
    pub scoring: ScoringPolicy,
}

fn default_version() -> u32 {
    1
}

impl EngineConfig {
    pub fn new(indexes: Vec<IndexDefinition>, scoring: ScoringPolicy) -> Self {
        Self {
            version: 1,
            indexes,
            scoring,
        }
    }

    pub fn from_json(json: &str) -> Result<Self> {
        Ok(serde_json::from_str(json)?)
    }

    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let data = std::fs::read_to_string(path.as_ref())?;
        Self::from_json(&data)
    }

    /// Validate and split into the shared runtime configuration
    pub fn build(self) -> Result<(IndexCatalog, ScoringPolicy)> {
        self.scoring.validate()?;
        let catalog = IndexCatalog::new(self.indexes)?;
        Ok((catalog, self.scoring))
    }
}
