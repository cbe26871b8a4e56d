//! # blindmatch
//!
//! Privacy-preserving identity resolution.
//!
//! blindmatch turns raw demographic attributes (names, dates of birth,
//! identifiers) into keyed, irreversible artifacts and scores candidate
//! identities by comparing those artifacts. Raw values never leave the
//! encoding pipeline; matching, storage and explanations only ever see
//! digests and Bloom vectors.
//!
//! ## Quick Start
//!
//! ### As a CLI
//!
//! ```bash
//! blindmatch encode --config engine.json --key-file secret.key --input person.json
//! blindmatch lookup --config engine.json --key-file secret.key \
//!     --population people.json --query query.json --timeout-ms 500
//! ```
//!
//! ### As a Library
//!
//! ```rust,no_run
//! use blindmatch::prelude::*;
//! use std::sync::Arc;
//! use std::time::Duration;
//!
//! # async fn run() -> Result<()> {
//! let (catalog, policy) = EngineConfig::from_file("engine.json")?.build()?;
//! let catalog = Arc::new(catalog);
//! let encoder = Encoder::new(SecretKey::from_file("secret.key")?)?;
//! let store = Arc::new(MemoryStore::new(Arc::clone(&catalog)));
//! let resolver = Resolver::new(encoder, catalog, policy, store);
//!
//! resolver.enroll(IdentityId::from("p-1"), vec![
//!     Attribute::phonetic("family_name", "Smith"),
//!     Attribute::date("date_of_birth", "1980-04-12"),
//! ])?;
//!
//! let outcome = resolver.resolve(vec![
//!     Attribute::phonetic("family_name", "Smyth"),
//!     Attribute::date("date_of_birth", "12.04.1980"),
//! ], Duration::from_millis(500)).await?;
//!
//! for candidate in outcome.candidates() {
//!     println!("{} scored {:.1}", candidate.id, candidate.score);
//! }
//! # Ok(())
//! # }
//! ```
//!
//! ## Crate Structure
//!
//! - [`blindmatch-core`](https://docs.rs/blindmatch-core) - Data model, configuration, index store
//! - [`blindmatch-encoding`](https://docs.rs/blindmatch-encoding) - Normalization, Soundex, n-grams, HMAC, Bloom encoding
//! - [`blindmatch-similarity`](https://docs.rs/blindmatch-similarity) - Comparison, scoring, ranking, explanations

pub mod resolver;

// Re-export core types
pub use blindmatch_core::{
    Attribute, AttributeKind, BitVector, Digest, EngineConfig, Error, IdentityId, IdentityRecord,
    IndexCatalog, IndexDefinition, IndexInstance, IndexStore, InputError, InstanceMap, MatchType,
    MemoryStore, Result, ScoringPolicy,
};

// Re-export encoding
pub use blindmatch_encoding::{AttributeFailure, Encoded, Encoder, SecretKey, KEY_FILE_ENV};

// Re-export similarity
pub use blindmatch_similarity::{
    compare, score, ExplainedResult, IndexMatch, LookupResponse, LookupStats, MatchSignal,
    RankedCandidate, Ranker, ScoreBreakdown,
};

pub use resolver::{LookupOutcome, Resolver};

/// Prelude module for convenient imports
pub mod prelude {
    pub use crate::{
        Attribute, AttributeKind, EngineConfig, Error, IdentityId, IndexCatalog, IndexDefinition,
        IndexStore, MemoryStore, Result, ScoringPolicy,
        Encoder, SecretKey,
        ExplainedResult, LookupResponse, LookupStats, RankedCandidate, Ranker,
        LookupOutcome, Resolver,
    };
}
