//! Index entry storage
//!
//! [`IndexStore`] is the seam to whatever persists identity records.
//! [`MemoryStore`] is the in-process implementation: records live in a
//! lock-guarded map, and exact/phonetic digests are kept in an inverted
//! posting list so lookups can skip records that share no digest with the
//! query.

use crate::identity::{IdentityId, IdentityRecord, InstanceMap};
use crate::index::IndexCatalog;
use crate::instance::{Digest, IndexInstance};
use crate::{Error, Result};
use ahash::{AHashMap, AHashSet};
use parking_lot::RwLock;
use std::sync::Arc;
use tracing::{debug, info};

pub trait IndexStore: Send + Sync {
    /// Insert or replace the record of an identity
    fn upsert(&self, record: IdentityRecord) -> Result<()>;

    fn get(&self, id: &IdentityId) -> Option<IdentityRecord>;

    fn remove(&self, id: &IdentityId) -> bool;

    fn count(&self) -> usize;

    /// Records worth comparing against a query
    fn candidates(&self, query: &InstanceMap) -> Result<Vec<IdentityRecord>>;
}

type PostingKey = (String, Digest);

pub struct MemoryStore {
    catalog: Arc<IndexCatalog>,
    records: RwLock<AHashMap<IdentityId, IdentityRecord>>,
    // (index id, digest) -> identities holding that digest
    postings: RwLock<AHashMap<PostingKey, AHashSet<IdentityId>>>,
}

impl MemoryStore {
    pub fn new(catalog: Arc<IndexCatalog>) -> Self {
        Self {
            catalog,
            records: RwLock::new(AHashMap::new()),
            postings: RwLock::new(AHashMap::new()),
        }
    }

    pub fn catalog(&self) -> &IndexCatalog {
        &self.catalog
    }

    fn validate(&self, record: &IdentityRecord) -> Result<()> {
        for (index_id, instance) in &record.instances {
            let definition = self.catalog.require(index_id)?;
            if !instance.conforms_to(definition) || instance.byte_len() != definition.artifact_len() {
                return Err(Error::InvalidArtifactLength {
                    index: index_id.clone(),
                    expected: definition.artifact_len(),
                    actual: instance.byte_len(),
                });
            }
        }
        Ok(())
    }

    fn posting_keys(instances: &InstanceMap) -> impl Iterator<Item = PostingKey> + '_ {
        instances.iter().filter_map(|(index_id, instance)| match instance {
            IndexInstance::Digest(d) if !d.is_empty() => Some((index_id.clone(), *d)),
            _ => None,
        })
    }

    fn unpost(postings: &mut AHashMap<PostingKey, AHashSet<IdentityId>>, record: &IdentityRecord) {
        for key in Self::posting_keys(&record.instances) {
            if let Some(ids) = postings.get_mut(&key) {
                ids.remove(&record.id);
                if ids.is_empty() {
                    postings.remove(&key);
                }
            }
        }
    }
}

impl IndexStore for MemoryStore {
    fn upsert(&self, mut record: IdentityRecord) -> Result<()> {
        self.validate(&record)?;

        let mut records = self.records.write();
        let mut postings = self.postings.write();

        if let Some(previous) = records.remove(&record.id) {
            Self::unpost(&mut postings, &previous);
            record.version = previous.version + 1;
        }

        for key in Self::posting_keys(&record.instances) {
            postings.entry(key).or_default().insert(record.id.clone());
        }

        debug!(id = %record.id, version = record.version, "Upserted identity record");
        records.insert(record.id.clone(), record);
        Ok(())
    }

    fn get(&self, id: &IdentityId) -> Option<IdentityRecord> {
        self.records.read().get(id).cloned()
    }

    fn remove(&self, id: &IdentityId) -> bool {
        let mut records = self.records.write();
        match records.remove(id) {
            Some(previous) => {
                Self::unpost(&mut self.postings.write(), &previous);
                info!(id = %id, "Removed identity record");
                true
            }
            None => false,
        }
    }

    fn count(&self) -> usize {
        self.records.read().len()
    }

    fn candidates(&self, query: &InstanceMap) -> Result<Vec<IdentityRecord>> {
        let records = self.records.read();

        // Bloom vectors cannot be looked up by value, so any usable fuzzy
        // instance in the query means a full scan.
        let needs_scan = query
            .iter()
            .any(|(_, instance)| matches!(instance, IndexInstance::Bloom(v) if !v.is_zero()));

        if needs_scan {
            return Ok(records.values().cloned().collect());
        }

        let postings = self.postings.read();
        let mut ids: AHashSet<&IdentityId> = AHashSet::new();
        for key in Self::posting_keys(query) {
            if let Some(holders) = postings.get(&key) {
                ids.extend(holders.iter());
            }
        }

        Ok(ids.into_iter().filter_map(|id| records.get(id).cloned()).collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::index::IndexDefinition;
    use crate::instance::BitVector;

    fn create_test_store() -> MemoryStore {
        let catalog = IndexCatalog::new(vec![
            IndexDefinition::exact("dob", &["date_of_birth"], 40.0),
            IndexDefinition::new(
                "name",
                &["given_name"],
                crate::index::MatchType::Fuzzy { bits: 64, hashes: 2, ngram: 2 },
                50.0,
            ),
        ])
        .unwrap();
        MemoryStore::new(Arc::new(catalog))
    }

    fn digest_record(id: &str, byte: u8) -> IdentityRecord {
        let mut instances = InstanceMap::new();
        instances.insert("dob".to_string(), IndexInstance::Digest(Digest([byte; 32])));
        IdentityRecord::new(IdentityId::from(id), instances)
    }

    #[test]
    fn test_upsert_and_get() {
        let store = create_test_store();
        store.upsert(digest_record("a", 1)).unwrap();
        assert_eq!(store.count(), 1);

        let record = store.get(&IdentityId::from("a")).unwrap();
        assert_eq!(record.version, 0);

        store.upsert(digest_record("a", 2)).unwrap();
        assert_eq!(store.count(), 1);
        assert_eq!(store.get(&IdentityId::from("a")).unwrap().version, 1);
    }

    #[test]
    fn test_upsert_rejects_unknown_index() {
        let store = create_test_store();
        let mut instances = InstanceMap::new();
        instances.insert("ssn".to_string(), IndexInstance::Digest(Digest([1; 32])));
        let result = store.upsert(IdentityRecord::new(IdentityId::from("a"), instances));
        assert!(matches!(result, Err(Error::UnknownIndex(id)) if id == "ssn"));
    }

    #[test]
    fn test_upsert_rejects_wrong_length() {
        let store = create_test_store();
        let mut instances = InstanceMap::new();
        instances.insert("name".to_string(), IndexInstance::Bloom(BitVector::new(128)));
        let result = store.upsert(IdentityRecord::new(IdentityId::from("a"), instances));
        assert!(matches!(
            result,
            Err(Error::InvalidArtifactLength { expected: 8, actual: 16, .. })
        ));
    }

    #[test]
    fn test_candidates_use_postings() {
        let store = create_test_store();
        store.upsert(digest_record("a", 1)).unwrap();
        store.upsert(digest_record("b", 1)).unwrap();
        store.upsert(digest_record("c", 2)).unwrap();

        let query = digest_record("q", 1).instances;
        let mut ids: Vec<String> = store
            .candidates(&query)
            .unwrap()
            .into_iter()
            .map(|r| r.id.to_string())
            .collect();
        ids.sort();
        assert_eq!(ids, vec!["a", "b"]);
    }

    #[test]
    fn test_replaced_digest_is_unposted() {
        let store = create_test_store();
        store.upsert(digest_record("a", 1)).unwrap();
        store.upsert(digest_record("a", 2)).unwrap();

        let stale = digest_record("q", 1).instances;
        assert!(store.candidates(&stale).unwrap().is_empty());

        let fresh = digest_record("q", 2).instances;
        assert_eq!(store.candidates(&fresh).unwrap().len(), 1);
    }

    #[test]
    fn test_empty_digest_never_posted() {
        let store = create_test_store();
        store.upsert(digest_record("a", 0)).unwrap();
        let query = digest_record("q", 0).instances;
        assert!(store.candidates(&query).unwrap().is_empty());
    }

    #[test]
    fn test_fuzzy_query_scans_everything() {
        let store = create_test_store();
        store.upsert(digest_record("a", 1)).unwrap();
        store.upsert(digest_record("b", 2)).unwrap();

        let mut bloom = BitVector::new(64);
        bloom.set(3);
        let mut query = InstanceMap::new();
        query.insert("name".to_string(), IndexInstance::Bloom(bloom));
        assert_eq!(store.candidates(&query).unwrap().len(), 2);
    }

    #[test]
    fn test_remove() {
        let store = create_test_store();
        store.upsert(digest_record("a", 1)).unwrap();
        assert!(store.remove(&IdentityId::from("a")));
        assert!(!store.remove(&IdentityId::from("a")));
        assert_eq!(store.count(), 0);
        assert!(store.candidates(&digest_record("q", 1).instances).unwrap().is_empty());
    }
}
