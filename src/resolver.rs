//! End-to-end identity lookup
//!
//! [`Resolver`] ties the pieces together: encode raw attributes, fetch
//! candidate records from an [`IndexStore`], then compare, score and rank
//! them under a caller-supplied deadline.

use blindmatch_core::{
    Attribute, Error, IdentityId, IdentityRecord, IndexCatalog, IndexStore, Result, ScoringPolicy,
};
use blindmatch_encoding::{AttributeFailure, Encoder};
use blindmatch_similarity::{RankedCandidate, Ranker};
use serde::Serialize;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, info, warn};

/// Result of one lookup
#[derive(Debug, Clone, Serialize)]
#[serde(tag = "outcome", rename_all = "snake_case")]
pub enum LookupOutcome {
    /// No index could be encoded from the query attributes
    UnableToEncode { failures: Vec<AttributeFailure> },
    /// Nothing scored above the candidate threshold, or the deadline passed
    NoCandidates {
        failures: Vec<AttributeFailure>,
        /// Stored records compared against the query; 0 on timeout
        compared: usize,
        timed_out: bool,
    },
    /// Ranked candidates, best first
    Matches {
        candidates: Vec<RankedCandidate>,
        failures: Vec<AttributeFailure>,
        compared: usize,
    },
}

impl LookupOutcome {
    pub fn candidates(&self) -> &[RankedCandidate] {
        match self {
            LookupOutcome::Matches { candidates, .. } => candidates,
            _ => &[],
        }
    }

    pub fn failures(&self) -> &[AttributeFailure] {
        match self {
            LookupOutcome::UnableToEncode { failures }
            | LookupOutcome::NoCandidates { failures, .. }
            | LookupOutcome::Matches { failures, .. } => failures,
        }
    }

    /// Number of stored records the query was compared against
    pub fn compared(&self) -> usize {
        match self {
            LookupOutcome::UnableToEncode { .. } => 0,
            LookupOutcome::NoCandidates { compared, .. } | LookupOutcome::Matches { compared, .. } => *compared,
        }
    }

    pub fn timed_out(&self) -> bool {
        matches!(self, LookupOutcome::NoCandidates { timed_out: true, .. })
    }
}

pub struct Resolver<S: IndexStore> {
    encoder: Arc<Encoder>,
    catalog: Arc<IndexCatalog>,
    ranker: Ranker,
    store: Arc<S>,
}

impl<S: IndexStore + 'static> Resolver<S> {
    pub fn new(encoder: Encoder, catalog: Arc<IndexCatalog>, policy: ScoringPolicy, store: Arc<S>) -> Self {
        let ranker = Ranker::new(Arc::clone(&catalog), policy);
        Self {
            encoder: Arc::new(encoder),
            catalog,
            ranker,
            store,
        }
    }

    pub fn catalog(&self) -> &IndexCatalog {
        &self.catalog
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    /// Encode an identity and store its index entries.
    ///
    /// Returns the attributes that could not be used. Fails with
    /// [`Error::Unencodable`] when no index could be built at all.
    pub fn enroll(&self, id: IdentityId, attributes: Vec<Attribute>) -> Result<Vec<AttributeFailure>> {
        let encoded = self.encoder.encode(attributes, &self.catalog)?;
        if encoded.is_unencodable() {
            return Err(Error::Unencodable);
        }

        let (instances, failures) = encoded.into_parts();
        self.store.upsert(IdentityRecord::new(id, instances))?;
        Ok(failures)
    }

    /// Find the stored identities that best match the given attributes.
    ///
    /// Candidate fetch and ranking run on the blocking pool. If `deadline`
    /// passes first the lookup reports no candidates with `timed_out` set;
    /// partial rankings are never returned. The abandoned work still runs to
    /// completion in the background and its result is dropped.
    pub async fn resolve(&self, attributes: Vec<Attribute>, deadline: Duration) -> Result<LookupOutcome> {
        let encoded = self.encoder.encode(attributes, &self.catalog)?;
        if encoded.is_unencodable() {
            debug!(failures = encoded.failures().len(), "Query could not be encoded");
            let (_, failures) = encoded.into_parts();
            return Ok(LookupOutcome::UnableToEncode { failures });
        }
        let (query, failures) = encoded.into_parts();

        let store = Arc::clone(&self.store);
        let ranker = self.ranker.clone();
        let task = tokio::task::spawn_blocking(move || -> Result<(usize, Vec<RankedCandidate>)> {
            let records = store.candidates(&query)?;
            let ranked = ranker.rank(&query, &records);
            Ok((records.len(), ranked))
        });

        let (compared, candidates) = match tokio::time::timeout(deadline, task).await {
            Err(_) => {
                warn!(deadline_ms = deadline.as_millis() as u64, "Lookup deadline exceeded");
                return Ok(LookupOutcome::NoCandidates {
                    failures,
                    compared: 0,
                    timed_out: true,
                });
            }
            Ok(Err(e)) => return Err(Error::Internal(format!("lookup task failed: {}", e))),
            Ok(Ok(result)) => result?,
        };

        info!(compared, matches = candidates.len(), "Lookup complete");
        if candidates.is_empty() {
            Ok(LookupOutcome::NoCandidates {
                failures,
                compared,
                timed_out: false,
            })
        } else {
            Ok(LookupOutcome::Matches {
                candidates,
                failures,
                compared,
            })
        }
    }
}
