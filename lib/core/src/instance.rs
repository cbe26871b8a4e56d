//! Opaque index artifacts
//!
//! An [`IndexInstance`] is what leaves the encoding boundary: either a keyed
//! digest or a Bloom-style bit vector. Neither can be decoded back into the
//! attribute text it was derived from.

use crate::index::{IndexDefinition, MatchType, DIGEST_LEN};
use crate::{Error, Result};
use serde::{Deserialize, Serialize};
use std::fmt;

/// A 256-bit keyed digest.
///
/// The all-zero digest is reserved as the empty-input artifact.
#[repr(transparent)]
#[derive(Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Digest(pub [u8; DIGEST_LEN]);

impl Digest {
    /// The empty-input artifact
    #[inline]
    pub const fn empty() -> Self {
        Self([0u8; DIGEST_LEN])
    }

    #[inline]
    pub const fn from_bytes(bytes: [u8; DIGEST_LEN]) -> Self {
        Self(bytes)
    }

    #[inline]
    pub const fn as_bytes(&self) -> &[u8; DIGEST_LEN] {
        &self.0
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.0.iter().all(|&b| b == 0)
    }

    /// Equality without early exit on the first differing byte
    #[inline]
    pub fn ct_eq(&self, other: &Digest) -> bool {
        self.0
            .iter()
            .zip(other.0.iter())
            .fold(0u8, |acc, (a, b)| acc | (a ^ b))
            == 0
    }
}

impl fmt::Debug for Digest {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "Digest({:02x}{:02x}{:02x}{:02x}…)",
            self.0[0], self.0[1], self.0[2], self.0[3]
        )
    }
}

/// Fixed-size bit vector backing a Bloom-style fuzzy index.
///
/// `words` always holds exactly `bits.div_ceil(64)` words and no bit past
/// `bits` is ever set; deserialization goes through the same check.
#[derive(Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "RawBitVector")]
pub struct BitVector {
    bits: usize,
    words: Vec<u64>,
}

#[derive(Deserialize)]
struct RawBitVector {
    bits: usize,
    words: Vec<u64>,
}

impl TryFrom<RawBitVector> for BitVector {
    type Error = String;

    fn try_from(raw: RawBitVector) -> std::result::Result<Self, Self::Error> {
        let expected = raw.bits.div_ceil(64);
        if raw.words.len() != expected {
            return Err(format!(
                "bit vector of {} bits needs {} words, got {}",
                raw.bits,
                expected,
                raw.words.len()
            ));
        }
        let mut vector = Self {
            bits: raw.bits,
            words: raw.words,
        };
        vector.clear_tail();
        Ok(vector)
    }
}

impl BitVector {
    /// All-zero vector with `bits` declared bits
    #[must_use]
    pub fn new(bits: usize) -> Self {
        Self {
            bits,
            words: vec![0u64; bits.div_ceil(64)],
        }
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.bits
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.bits == 0
    }

    /// Set bit `pos`. Positions past the declared length are ignored.
    #[inline]
    pub fn set(&mut self, pos: usize) {
        if pos < self.bits {
            self.words[pos / 64] |= 1u64 << (pos % 64);
        }
    }

    #[inline]
    pub fn get(&self, pos: usize) -> bool {
        pos < self.bits && (self.words[pos / 64] >> (pos % 64)) & 1 == 1
    }

    #[inline]
    pub fn count_ones(&self) -> usize {
        self.words.iter().map(|w| w.count_ones() as usize).sum()
    }

    /// Number of bits set in both vectors
    #[inline]
    pub fn intersection_count(&self, other: &BitVector) -> usize {
        self.words
            .iter()
            .zip(other.words.iter())
            .map(|(a, b)| (a & b).count_ones() as usize)
            .sum()
    }

    #[inline]
    pub fn is_zero(&self) -> bool {
        self.words.iter().all(|&w| w == 0)
    }

    /// Little-endian word layout, `bits / 8` bytes
    pub fn to_bytes(&self) -> Vec<u8> {
        let mut bytes: Vec<u8> = self.words.iter().flat_map(|w| w.to_le_bytes()).collect();
        bytes.truncate(self.bits.div_ceil(8));
        bytes
    }

    pub fn from_bytes(bytes: &[u8], bits: usize) -> Option<Self> {
        if bytes.len() != bits.div_ceil(8) {
            return None;
        }
        let mut vector = Self::new(bits);
        for (word, chunk) in vector.words.iter_mut().zip(bytes.chunks(8)) {
            let mut buf = [0u8; 8];
            buf[..chunk.len()].copy_from_slice(chunk);
            *word = u64::from_le_bytes(buf);
        }
        vector.clear_tail();
        Some(vector)
    }

    // Bits past the declared length in the last word stay zero
    fn clear_tail(&mut self) {
        let rem = self.bits % 64;
        if rem != 0 {
            if let Some(last) = self.words.last_mut() {
                *last &= (1u64 << rem) - 1;
            }
        }
    }
}

impl fmt::Debug for BitVector {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "BitVector({} bits, {} set)", self.bits, self.count_ones())
    }
}

/// Artifact produced for one attribute set under one index definition.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum IndexInstance {
    Digest(Digest),
    Bloom(BitVector),
}

impl IndexInstance {
    /// Empty-input artifact for a definition: deterministic, of the
    /// published length, and never a match for anything.
    pub fn empty_for(definition: &IndexDefinition) -> Self {
        match definition.match_type {
            MatchType::Exact | MatchType::Phonetic => IndexInstance::Digest(Digest::empty()),
            MatchType::Fuzzy { bits, .. } => IndexInstance::Bloom(BitVector::new(bits)),
        }
    }

    pub fn is_empty(&self) -> bool {
        match self {
            IndexInstance::Digest(d) => d.is_empty(),
            IndexInstance::Bloom(v) => v.is_zero(),
        }
    }

    pub fn byte_len(&self) -> usize {
        match self {
            IndexInstance::Digest(_) => DIGEST_LEN,
            IndexInstance::Bloom(v) => v.len().div_ceil(8),
        }
    }

    pub fn as_digest(&self) -> Option<&Digest> {
        match self {
            IndexInstance::Digest(d) => Some(d),
            IndexInstance::Bloom(_) => None,
        }
    }

    pub fn as_bloom(&self) -> Option<&BitVector> {
        match self {
            IndexInstance::Digest(_) => None,
            IndexInstance::Bloom(v) => Some(v),
        }
    }

    /// Whether this artifact has the shape the definition publishes
    pub fn conforms_to(&self, definition: &IndexDefinition) -> bool {
        match (self, definition.match_type) {
            (IndexInstance::Digest(_), MatchType::Exact | MatchType::Phonetic) => true,
            (IndexInstance::Bloom(v), MatchType::Fuzzy { bits, .. }) => v.len() == bits,
            _ => false,
        }
    }

    /// Stored byte layout, exactly `definition.artifact_len()` long
    pub fn to_bytes(&self) -> Vec<u8> {
        match self {
            IndexInstance::Digest(d) => d.0.to_vec(),
            IndexInstance::Bloom(v) => v.to_bytes(),
        }
    }

    pub fn from_bytes(bytes: &[u8], definition: &IndexDefinition) -> Result<Self> {
        let expected = definition.artifact_len();
        if bytes.len() != expected {
            return Err(Error::InvalidArtifactLength {
                index: definition.id.clone(),
                expected,
                actual: bytes.len(),
            });
        }

        match definition.match_type {
            MatchType::Exact | MatchType::Phonetic => {
                let mut digest = [0u8; DIGEST_LEN];
                digest.copy_from_slice(bytes);
                Ok(IndexInstance::Digest(Digest(digest)))
            }
            MatchType::Fuzzy { bits, .. } => BitVector::from_bytes(bytes, bits)
                .map(IndexInstance::Bloom)
                .ok_or_else(|| Error::InvalidArtifactLength {
                    index: definition.id.clone(),
                    expected,
                    actual: bytes.len(),
                }),
        }
    }
}
