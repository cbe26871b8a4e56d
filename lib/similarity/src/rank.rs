//! Candidate ranking
//!
//! Compares a query against candidate records index by index, scores each
//! candidate and returns the best ones ordered by score.

use crate::compare::{compare, IndexMatch, MatchSignal};
use crate::scoring::{score, ScoreBreakdown};
use blindmatch_core::{IdentityId, IdentityRecord, IndexCatalog, InstanceMap, ScoringPolicy};
use ordered_float::OrderedFloat;
use rayon::prelude::*;
use serde::Serialize;
use smallvec::SmallVec;
use std::collections::HashMap;
use std::sync::Arc;
use tracing::debug;

/// Matches of one candidate; most catalogs define only a handful of indexes
pub type MatchList = SmallVec<[IndexMatch; 8]>;

/// A scored candidate identity
#[derive(Debug, Clone, Serialize)]
pub struct RankedCandidate {
    pub id: IdentityId,
    pub score: f32,
    pub breakdown: ScoreBreakdown,
}

/// Scores and orders candidates for one catalog and policy
#[derive(Debug, Clone)]
pub struct Ranker {
    catalog: Arc<IndexCatalog>,
    policy: ScoringPolicy,
}

impl Ranker {
    pub fn new(catalog: Arc<IndexCatalog>, policy: ScoringPolicy) -> Self {
        Self { catalog, policy }
    }

    pub fn catalog(&self) -> &IndexCatalog {
        &self.catalog
    }

    pub fn policy(&self) -> &ScoringPolicy {
        &self.policy
    }

    /// Compare every index the query carries with the candidate's entry.
    ///
    /// Indexes where the query has no usable artifact are skipped; a
    /// candidate without an entry for an index gets [`MatchSignal::NoMatch`].
    pub fn match_record(&self, query: &InstanceMap, record: &IdentityRecord) -> MatchList {
        self.catalog
            .iter()
            .filter_map(|definition| {
                let q = query.get(&definition.id).filter(|q| !q.is_empty())?;
                Some(match record.instance(&definition.id) {
                    Some(stored) => compare(q, stored, definition),
                    None => IndexMatch::new(definition.id.clone(), MatchSignal::NoMatch),
                })
            })
            .collect()
    }

    pub fn score_record(&self, query: &InstanceMap, record: &IdentityRecord) -> ScoreBreakdown {
        let matches = self.match_record(query, record);
        score(&matches, &self.catalog, &self.policy)
    }

    /// Score all candidates and return the best ones.
    ///
    /// Candidates scoring at or below `min_candidate_score` are dropped. The
    /// rest are ordered by score descending, ties broken by identity id, and
    /// truncated to `max_candidates`.
    pub fn rank(&self, query: &InstanceMap, candidates: &[IdentityRecord]) -> Vec<RankedCandidate> {
        let mut ranked: Vec<RankedCandidate> = candidates
            .par_iter()
            .filter_map(|record| {
                let breakdown = self.score_record(query, record);
                (breakdown.total > self.policy.min_candidate_score).then(|| RankedCandidate {
                    id: record.id.clone(),
                    score: breakdown.total,
                    breakdown,
                })
            })
            .collect();

        ranked.sort_by(|a, b| {
            OrderedFloat(b.score)
                .cmp(&OrderedFloat(a.score))
                .then_with(|| a.id.cmp(&b.id))
        });
        ranked.truncate(self.policy.max_candidates);

        debug!(
            candidates = candidates.len(),
            returned = ranked.len(),
            "Ranked candidates"
        );
        ranked
    }

    /// Create a ranker with index weight overrides.
    ///
    /// Weights are clamped to the valid range; ids the catalog does not
    /// define are ignored.
    pub fn with_weights(&self, weight_overrides: &HashMap<String, f32>) -> Ranker {
        Ranker::new(Arc::new(self.catalog.with_weights(weight_overrides)), self.policy)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use blindmatch_core::{BitVector, Digest, IndexDefinition, IndexInstance};

    fn create_test_ranker() -> Ranker {
        let catalog = IndexCatalog::new(vec![
            IndexDefinition::exact("dob", &["date_of_birth"], 40.0),
            IndexDefinition::phonetic("family", &["family_name"], 30.0),
            IndexDefinition::fuzzy("name", &["given_name", "family_name"], 50.0),
        ])
        .unwrap();
        Ranker::new(Arc::new(catalog), ScoringPolicy::default())
    }

    fn bloom(set: &[usize]) -> IndexInstance {
        let mut v = BitVector::new(1024);
        for &pos in set {
            v.set(pos);
        }
        IndexInstance::Bloom(v)
    }

    fn create_test_record(id: u64, dob: u8, family: u8, name: &[usize]) -> IdentityRecord {
        let mut instances = InstanceMap::new();
        instances.insert("dob".to_string(), IndexInstance::Digest(Digest([dob; 32])));
        instances.insert("family".to_string(), IndexInstance::Digest(Digest([family; 32])));
        instances.insert("name".to_string(), bloom(name));
        IdentityRecord::new(IdentityId::from(id), instances)
    }

    #[test]
    fn test_match_record() {
        let ranker = create_test_ranker();
        let query = create_test_record(0, 1, 2, &[1, 2, 3, 4]).instances;
        let record = create_test_record(1, 1, 9, &[1, 2, 3, 4]);

        let matches = ranker.match_record(&query, &record);
        assert_eq!(matches.len(), 3);
        assert!(matches.iter().any(|m| m.index_id == "dob" && m.signal == MatchSignal::Exact));
        assert!(matches.iter().any(|m| m.index_id == "family" && m.signal == MatchSignal::NoMatch));
        assert!(matches
            .iter()
            .any(|m| m.index_id == "name" && m.signal == MatchSignal::Fuzzy { similarity: 1.0 }));
    }

    #[test]
    fn test_match_record_skips_empty_query_instances() {
        let ranker = create_test_ranker();
        let mut query = create_test_record(0, 1, 2, &[1, 2]).instances;
        query.insert("dob".to_string(), IndexInstance::Digest(Digest::empty()));
        query.remove("family");

        let matches = ranker.match_record(&query, &create_test_record(1, 1, 2, &[1, 2]));
        assert_eq!(matches.len(), 1);
        assert_eq!(matches[0].index_id, "name");
    }

    #[test]
    fn test_rank_orders_by_score() {
        let ranker = create_test_ranker();
        let query = create_test_record(0, 1, 2, &[1, 2, 3, 4, 5]).instances;
        let candidates = vec![
            create_test_record(10, 9, 9, &[100, 101]),
            create_test_record(11, 1, 9, &[1, 2, 3, 4, 6]),
            create_test_record(12, 1, 2, &[1, 2, 3, 4, 5]),
        ];

        let ranked = ranker.rank(&query, &candidates);
        assert_eq!(ranked.len(), 2);
        assert_eq!(ranked[0].id, IdentityId::Integer(12));
        assert_eq!(ranked[1].id, IdentityId::Integer(11));
        assert!(ranked[0].score >= ranked[1].score);
        assert_eq!(ranked[0].score, ranked[0].breakdown.total);
    }

    #[test]
    fn test_rank_ties_broken_by_id() {
        let ranker = create_test_ranker();
        let query = create_test_record(0, 1, 2, &[1, 2]).instances;
        let candidates = vec![
            create_test_record(7, 1, 2, &[1, 2]),
            create_test_record(3, 1, 2, &[1, 2]),
            create_test_record(5, 1, 2, &[1, 2]),
        ];

        let ids: Vec<IdentityId> = ranker.rank(&query, &candidates).into_iter().map(|c| c.id).collect();
        assert_eq!(ids, vec![IdentityId::Integer(3), IdentityId::Integer(5), IdentityId::Integer(7)]);
    }

    #[test]
    fn test_rank_respects_limits() {
        let catalog = IndexCatalog::new(vec![IndexDefinition::exact("dob", &["date_of_birth"], 40.0)]).unwrap();
        let policy = ScoringPolicy {
            max_candidates: 2,
            min_candidate_score: 10.0,
            ..ScoringPolicy::default()
        };
        let ranker = Ranker::new(Arc::new(catalog), policy);

        let digest = |b: u8| {
            let mut instances = InstanceMap::new();
            instances.insert("dob".to_string(), IndexInstance::Digest(Digest([b; 32])));
            instances
        };
        let candidates: Vec<IdentityRecord> = (0..5u64)
            .map(|i| IdentityRecord::new(IdentityId::from(i), digest(if i < 3 { 1 } else { 2 })))
            .collect();

        let ranked = ranker.rank(&digest(1), &candidates);
        assert_eq!(ranked.len(), 2);
        assert!(ranked.iter().all(|c| c.score == 40.0));
    }

    #[test]
    fn test_rank_empty_candidates() {
        let ranker = create_test_ranker();
        let query = create_test_record(0, 1, 2, &[1]).instances;
        assert!(ranker.rank(&query, &[]).is_empty());
    }

    #[test]
    fn test_with_weights() {
        let ranker = create_test_ranker();
        let custom = ranker.with_weights(&HashMap::from([
            ("dob".to_string(), 10.0),
            ("unknown".to_string(), 90.0),
        ]));

        assert_eq!(custom.catalog().get("dob").unwrap().weight, 10.0);
        assert_eq!(custom.catalog().get("family").unwrap().weight, 30.0);
        assert!(custom.catalog().get("unknown").is_none());
        assert_eq!(ranker.catalog().get("dob").unwrap().weight, 40.0);
    }
}
