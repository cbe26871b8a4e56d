//! Index definitions
//!
//! Declares how attributes are turned into artifacts and how much each
//! resulting index is worth when scoring. Definitions are collected into an
//! [`IndexCatalog`], validated once at startup and shared read-only.

use crate::{Error, Result};
use ahash::AHashMap;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// Length in bytes of a keyed digest artifact.
pub const DIGEST_LEN: usize = 32;

pub const DEFAULT_BLOOM_BITS: usize = 1024;
pub const DEFAULT_BLOOM_HASHES: u32 = 10;
pub const DEFAULT_NGRAM: usize = 2;

/// Upper bound for an index weight.
pub const MAX_WEIGHT: f32 = 100.0;

/// How an index is encoded and compared.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum MatchType {
    /// Keyed digest of the normalized value, compared for equality
    Exact,
    /// Keyed digest of the phonetic code, compared for equality
    Phonetic,
    /// Bloom vector of keyed phonetic n-grams, compared with Dice
    Fuzzy {
        #[serde(default = "default_bits")]
        bits: usize,
        #[serde(default = "default_hashes")]
        hashes: u32,
        #[serde(default = "default_ngram")]
        ngram: usize,
    },
}

fn default_bits() -> usize {
    DEFAULT_BLOOM_BITS
}

fn default_hashes() -> u32 {
    DEFAULT_BLOOM_HASHES
}

fn default_ngram() -> usize {
    DEFAULT_NGRAM
}

impl MatchType {
    /// Fuzzy match type with default bloom parameters
    pub fn fuzzy() -> Self {
        MatchType::Fuzzy {
            bits: DEFAULT_BLOOM_BITS,
            hashes: DEFAULT_BLOOM_HASHES,
            ngram: DEFAULT_NGRAM,
        }
    }

    pub fn is_fuzzy(&self) -> bool {
        matches!(self, MatchType::Fuzzy { .. })
    }

    /// Whether the phonetic stage runs for text attributes
    pub fn uses_phonetic(&self) -> bool {
        !matches!(self, MatchType::Exact)
    }

    pub fn name(&self) -> &'static str {
        match self {
            MatchType::Exact => "exact",
            MatchType::Phonetic => "phonetic",
            MatchType::Fuzzy { .. } => "fuzzy",
        }
    }
}

/// Static description of one encoded index.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct IndexDefinition {
    pub id: String,

    /// Source attribute names, in encoding order
    pub attributes: Vec<String>,

    #[serde(rename = "match")]
    pub match_type: MatchType,

    /// Relative contribution to the score (0 to 100)
    #[serde(default = "default_weight")]
    pub weight: f32,
}

fn default_weight() -> f32 {
    50.0
}

impl IndexDefinition {
    pub fn new(
        id: impl Into<String>,
        attributes: &[&str],
        match_type: MatchType,
        weight: f32,
    ) -> Self {
        Self {
            id: id.into(),
            attributes: attributes.iter().map(|a| a.to_string()).collect(),
            match_type,
            weight,
        }
    }

    pub fn exact(id: impl Into<String>, attributes: &[&str], weight: f32) -> Self {
        Self::new(id, attributes, MatchType::Exact, weight)
    }

    pub fn phonetic(id: impl Into<String>, attributes: &[&str], weight: f32) -> Self {
        Self::new(id, attributes, MatchType::Phonetic, weight)
    }

    pub fn fuzzy(id: impl Into<String>, attributes: &[&str], weight: f32) -> Self {
        Self::new(id, attributes, MatchType::fuzzy(), weight)
    }

    /// Byte length of every artifact stored for this index
    pub fn artifact_len(&self) -> usize {
        match self.match_type {
            MatchType::Exact | MatchType::Phonetic => DIGEST_LEN,
            MatchType::Fuzzy { bits, .. } => bits / 8,
        }
    }

    /// Source attributes in a canonical order, used to decide whether two
    /// indexes are independent evidence.
    pub fn attribute_set(&self) -> Vec<&str> {
        let mut set: Vec<&str> = self.attributes.iter().map(String::as_str).collect();
        set.sort_unstable();
        set.dedup();
        set
    }

    pub fn validate(&self) -> Result<()> {
        if self.id.trim().is_empty() {
            return Err(Error::InvalidConfig("index id cannot be empty".to_string()));
        }
        if self.attributes.is_empty() {
            return Err(Error::InvalidConfig(format!(
                "index '{}' has no source attributes",
                self.id
            )));
        }
        if !self.weight.is_finite() || !(0.0..=MAX_WEIGHT).contains(&self.weight) {
            return Err(Error::InvalidConfig(format!(
                "index '{}' weight must be within 0..=100",
                self.id
            )));
        }
        if let MatchType::Fuzzy { bits, hashes, ngram } = self.match_type {
            if bits == 0 || bits % 64 != 0 {
                return Err(Error::InvalidConfig(format!(
                    "index '{}' bloom size must be a positive multiple of 64 bits",
                    self.id
                )));
            }
            if hashes == 0 {
                return Err(Error::InvalidConfig(format!(
                    "index '{}' needs at least one bloom hash",
                    self.id
                )));
            }
            if ngram == 0 {
                return Err(Error::InvalidConfig(format!(
                    "index '{}' n-gram length must be positive",
                    self.id
                )));
            }
        }
        Ok(())
    }
}

/// Validated, immutable set of index definitions.
#[derive(Debug, Clone)]
pub struct IndexCatalog {
    definitions: Vec<IndexDefinition>,
    by_id: AHashMap<String, usize>,
}

impl PartialEq for IndexCatalog {
    fn eq(&self, other: &Self) -> bool {
        self.definitions == other.definitions
    }
}

impl IndexCatalog {
    pub fn new(definitions: Vec<IndexDefinition>) -> Result<Self> {
        if definitions.is_empty() {
            return Err(Error::InvalidConfig("catalog needs at least one index".to_string()));
        }

        let mut by_id = AHashMap::with_capacity(definitions.len());
        for (pos, definition) in definitions.iter().enumerate() {
            definition.validate()?;
            if by_id.insert(definition.id.clone(), pos).is_some() {
                return Err(Error::DuplicateIndex(definition.id.clone()));
            }
        }

        Ok(Self { definitions, by_id })
    }

    pub fn get(&self, id: &str) -> Option<&IndexDefinition> {
        self.by_id.get(id).map(|&pos| &self.definitions[pos])
    }

    /// Like [`get`](Self::get) but unknown ids are a configuration error
    pub fn require(&self, id: &str) -> Result<&IndexDefinition> {
        self.get(id).ok_or_else(|| Error::UnknownIndex(id.to_string()))
    }

    pub fn iter(&self) -> impl Iterator<Item = &IndexDefinition> {
        self.definitions.iter()
    }

    pub fn definitions(&self) -> &[IndexDefinition] {
        &self.definitions
    }

    pub fn len(&self) -> usize {
        self.definitions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.definitions.is_empty()
    }

    pub fn has_fuzzy(&self) -> bool {
        self.definitions.iter().any(|d| d.match_type.is_fuzzy())
    }

    /// Copy of the catalog with some weights replaced.
    ///
    /// Overrides are clamped to 0..=100. Ids the catalog does not know are
    /// ignored.
    pub fn with_weights(&self, overrides: &HashMap<String, f32>) -> IndexCatalog {
        let mut modified = self.clone();
        for (id, weight) in overrides {
            if let Some(&pos) = modified.by_id.get(id) {
                let weight = if weight.is_finite() { *weight } else { 0.0 };
                modified.definitions[pos].weight = weight.clamp(0.0, MAX_WEIGHT);
            }
        }
        modified
    }
}
