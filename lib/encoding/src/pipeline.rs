//! Encoding pipeline
//!
//! Raw attributes go in, one opaque [`IndexInstance`] per index definition
//! comes out. Normalized text, phonetic codes and n-grams only exist as
//! locals inside [`Encoder::encode`] and are dropped before it returns.

use crate::bloom;
use crate::hasher::KeyedHasher;
use crate::key::SecretKey;
use crate::ngram::ngrams;
use crate::normalize::{normalize_date, normalize_text};
use crate::phonetic;
use blindmatch_core::{
    Attribute, AttributeKind, BitVector, Digest, IndexCatalog, IndexDefinition, IndexInstance,
    InputError, InstanceMap, MatchType, Result,
};
use serde::Serialize;
use std::collections::HashMap;
use tracing::debug;

/// An attribute that could not be used, reported by name only
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct AttributeFailure {
    pub attribute: String,
    pub error: InputError,
}

/// Result of one encode call: artifacts plus per-attribute failures
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Encoded {
    instances: InstanceMap,
    failures: Vec<AttributeFailure>,
}

impl Encoded {
    pub fn instances(&self) -> &InstanceMap {
        &self.instances
    }

    pub fn get(&self, index_id: &str) -> Option<&IndexInstance> {
        self.instances.get(index_id)
    }

    pub fn failures(&self) -> &[AttributeFailure] {
        &self.failures
    }

    /// Indexes that received the empty-input artifact
    pub fn empty_indexes(&self) -> Vec<&str> {
        self.instances
            .iter()
            .filter(|(_, instance)| instance.is_empty())
            .map(|(id, _)| id.as_str())
            .collect()
    }

    /// True when no index could be encoded from the supplied attributes
    pub fn is_unencodable(&self) -> bool {
        self.instances.values().all(IndexInstance::is_empty)
    }

    pub fn into_parts(self) -> (InstanceMap, Vec<AttributeFailure>) {
        (self.instances, self.failures)
    }
}

enum Slot {
    Value { kind: AttributeKind, normalized: String },
    Absent,
    Malformed,
}

/// The trust boundary: holds the keyed hasher, exposes only artifacts.
pub struct Encoder {
    hasher: KeyedHasher,
}

impl Encoder {
    pub fn new(key: SecretKey) -> Result<Self> {
        let hasher = KeyedHasher::new(&key)?;
        Ok(Self { hasher })
    }

    /// Encoder keyed from the file named by `var`
    pub fn from_env(var: &str) -> Result<Self> {
        Self::new(SecretKey::from_env(var)?)
    }

    /// Encode every index in the catalog
    pub fn encode(&self, attributes: Vec<Attribute>, catalog: &IndexCatalog) -> Result<Encoded> {
        self.encode_definitions(attributes, catalog.iter())
    }

    /// Encode only the named indexes; unknown ids fail the whole call
    pub fn encode_selected(
        &self,
        attributes: Vec<Attribute>,
        catalog: &IndexCatalog,
        index_ids: &[&str],
    ) -> Result<Encoded> {
        let definitions = index_ids
            .iter()
            .map(|id| catalog.require(id))
            .collect::<Result<Vec<_>>>()?;
        self.encode_definitions(attributes, definitions.into_iter())
    }

    fn encode_definitions<'a>(
        &self,
        attributes: Vec<Attribute>,
        definitions: impl Iterator<Item = &'a IndexDefinition>,
    ) -> Result<Encoded> {
        let (slots, failures) = prepare(attributes);

        let mut instances = InstanceMap::new();
        for definition in definitions {
            let instance = self.encode_index(definition, &slots);
            instances.insert(definition.id.clone(), instance);
        }

        let encoded = Encoded { instances, failures };
        debug!(
            indexes = encoded.instances.len(),
            empty = encoded.empty_indexes().len(),
            failures = encoded.failures.len(),
            "Encoded attributes"
        );
        Ok(encoded)
    }

    fn encode_index(&self, definition: &IndexDefinition, slots: &HashMap<String, Slot>) -> IndexInstance {
        let mut sources = Vec::with_capacity(definition.attributes.len());
        for name in &definition.attributes {
            match slots.get(name) {
                Some(Slot::Value { kind, normalized }) => {
                    sources.push(stage_tokens(*kind, normalized, definition.match_type))
                }
                _ => return IndexInstance::empty_for(definition),
            }
        }

        match definition.match_type {
            MatchType::Exact | MatchType::Phonetic => {
                let joined: Vec<String> = sources.iter().map(|tokens| tokens.join(" ")).collect();
                if joined.iter().all(String::is_empty) {
                    return IndexInstance::empty_for(definition);
                }
                let parts: Vec<&[u8]> = joined.iter().map(|s| s.as_bytes()).collect();
                IndexInstance::Digest(Digest(self.hasher.digest(&definition.id, &parts)))
            }
            MatchType::Fuzzy { bits, hashes, ngram } => {
                let mut vector = BitVector::new(bits);
                for token in sources.iter().flatten() {
                    for gram in ngrams(token, ngram) {
                        let digest = self.hasher.digest(&definition.id, &[gram.as_bytes()]);
                        bloom::insert(&mut vector, &digest, hashes);
                    }
                }
                IndexInstance::Bloom(vector)
            }
        }
    }
}

/// Normalize each attribute once, recording absences and failures
fn prepare(attributes: Vec<Attribute>) -> (HashMap<String, Slot>, Vec<AttributeFailure>) {
    let mut slots = HashMap::with_capacity(attributes.len());
    let mut failures = Vec::new();

    for attribute in attributes {
        if slots.contains_key(&attribute.name) {
            failures.push(AttributeFailure {
                attribute: attribute.name,
                error: InputError::Duplicate,
            });
            continue;
        }

        let slot = match attribute.kind {
            AttributeKind::Date => match normalize_date(&attribute.value) {
                Ok(Some(normalized)) => Slot::Value { kind: attribute.kind, normalized },
                Ok(None) => Slot::Absent,
                Err(error) => {
                    failures.push(AttributeFailure {
                        attribute: attribute.name.clone(),
                        error,
                    });
                    Slot::Malformed
                }
            },
            AttributeKind::ExactText | AttributeKind::PhoneticText => {
                let keep_digits = attribute.kind == AttributeKind::ExactText;
                let normalized = normalize_text(&attribute.value, keep_digits);
                if normalized.is_empty() {
                    Slot::Absent
                } else {
                    Slot::Value { kind: attribute.kind, normalized }
                }
            }
        };
        slots.insert(attribute.name, slot);
    }

    (slots, failures)
}

/// Tokens fed to the hasher for one source attribute
fn stage_tokens(kind: AttributeKind, normalized: &str, match_type: MatchType) -> Vec<String> {
    if match_type.uses_phonetic() && kind != AttributeKind::Date {
        phonetic::encode_tokens(normalized)
    } else {
        normalized.split_whitespace().map(str::to_string).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use blindmatch_core::Error;

    fn encoder(byte: u8) -> Encoder {
        Encoder::new(SecretKey::from_bytes(vec![byte; 32]).unwrap()).unwrap()
    }

    fn create_test_catalog() -> IndexCatalog {
        IndexCatalog::new(vec![
            IndexDefinition::exact("dob", &["date_of_birth"], 40.0),
            IndexDefinition::exact("mrn", &["record_number"], 60.0),
            IndexDefinition::phonetic("family", &["family_name"], 30.0),
            IndexDefinition::fuzzy("name", &["given_name", "family_name"], 50.0),
        ])
        .unwrap()
    }

    fn person(given: &str, family: &str, dob: &str) -> Vec<Attribute> {
        vec![
            Attribute::phonetic("given_name", given),
            Attribute::phonetic("family_name", family),
            Attribute::date("date_of_birth", dob),
        ]
    }

    #[test]
    fn test_one_instance_per_definition() {
        let catalog = create_test_catalog();
        let encoded = encoder(1).encode(person("John", "Smith", "1980-04-12"), &catalog).unwrap();

        assert_eq!(encoded.instances().len(), 4);
        for definition in catalog.iter() {
            let instance = encoded.get(&definition.id).unwrap();
            assert!(instance.conforms_to(definition));
            assert_eq!(instance.to_bytes().len(), definition.artifact_len());
        }
        // record_number was not supplied
        assert_eq!(encoded.empty_indexes(), vec!["mrn"]);
        assert!(encoded.failures().is_empty());
        assert!(!encoded.is_unencodable());
    }

    #[test]
    fn test_deterministic() {
        let catalog = create_test_catalog();
        let a = encoder(1).encode(person("John", "Smith", "1980-04-12"), &catalog).unwrap();
        let b = encoder(1).encode(person("John", "Smith", "1980-04-12"), &catalog).unwrap();
        assert_eq!(a, b);
        for id in ["dob", "family", "name"] {
            assert_eq!(a.get(id).unwrap().to_bytes(), b.get(id).unwrap().to_bytes());
        }
    }

    #[test]
    fn test_key_changes_every_artifact() {
        let catalog = create_test_catalog();
        let a = encoder(1).encode(person("John", "Smith", "1980-04-12"), &catalog).unwrap();
        let b = encoder(2).encode(person("John", "Smith", "1980-04-12"), &catalog).unwrap();
        for id in ["dob", "family", "name"] {
            assert_ne!(a.get(id), b.get(id));
        }
    }

    #[test]
    fn test_normalization_variants_collide() {
        let catalog = create_test_catalog();
        let enc = encoder(1);
        let a = enc.encode(person("John", "Smith", "1980-04-12"), &catalog).unwrap();
        let b = enc.encode(person("  JOHN ", "Smyth", "12.04.1980"), &catalog).unwrap();

        assert_eq!(a.get("dob"), b.get("dob"));
        assert_eq!(a.get("family"), b.get("family"));
        assert_eq!(a.get("name"), b.get("name"));
    }

    #[test]
    fn test_exact_is_not_phonetic() {
        let catalog = IndexCatalog::new(vec![IndexDefinition::exact("family", &["family_name"], 30.0)]).unwrap();
        let enc = encoder(1);
        let a = enc.encode(vec![Attribute::phonetic("family_name", "Smith")], &catalog).unwrap();
        let b = enc.encode(vec![Attribute::phonetic("family_name", "Smyth")], &catalog).unwrap();
        assert_ne!(a.get("family"), b.get("family"));
    }

    #[test]
    fn test_same_value_differs_across_indexes() {
        let catalog = IndexCatalog::new(vec![
            IndexDefinition::exact("a", &["dob"], 10.0),
            IndexDefinition::exact("b", &["dob"], 10.0),
        ])
        .unwrap();
        let encoded = encoder(1).encode(vec![Attribute::date("dob", "1980-04-12")], &catalog).unwrap();
        assert_ne!(encoded.get("a"), encoded.get("b"));
    }

    #[test]
    fn test_malformed_date_gives_partial_result() {
        let catalog = create_test_catalog();
        let encoded = encoder(1).encode(person("John", "Smith", "31/31/1980"), &catalog).unwrap();

        assert_eq!(encoded.failures().len(), 1);
        assert_eq!(encoded.failures()[0].attribute, "date_of_birth");
        assert!(matches!(encoded.failures()[0].error, InputError::Malformed { .. }));

        assert!(encoded.get("dob").unwrap().is_empty());
        assert!(!encoded.get("family").unwrap().is_empty());
        assert!(!encoded.get("name").unwrap().is_empty());
    }

    #[test]
    fn test_empty_attribute_is_deterministic_empty_artifact() {
        let catalog = create_test_catalog();
        let enc = encoder(1);
        let a = enc.encode(person("John", "", "1980-04-12"), &catalog).unwrap();
        let b = enc.encode(person("John", "--", "1980-04-12"), &catalog).unwrap();

        assert!(a.failures().is_empty());
        assert!(a.get("family").unwrap().is_empty());
        assert_eq!(a.get("family"), b.get("family"));
        // name needs both given and family name
        assert!(a.get("name").unwrap().is_empty());
    }

    #[test]
    fn test_nothing_encodable() {
        let catalog = create_test_catalog();
        let encoded = encoder(1).encode(vec![Attribute::date("date_of_birth", "soon")], &catalog).unwrap();
        assert!(encoded.is_unencodable());
        assert_eq!(encoded.failures().len(), 1);
    }

    #[test]
    fn test_duplicate_attribute_reported() {
        let catalog = create_test_catalog();
        let mut attributes = person("John", "Smith", "1980-04-12");
        attributes.push(Attribute::phonetic("family_name", "Jones"));

        let encoded = encoder(1).encode(attributes, &catalog).unwrap();
        assert_eq!(
            encoded.failures(),
            &[AttributeFailure { attribute: "family_name".to_string(), error: InputError::Duplicate }]
        );

        let first_wins = encoder(1).encode(person("John", "Smith", "1980-04-12"), &catalog).unwrap();
        assert_eq!(encoded.get("family"), first_wins.get("family"));
    }

    #[test]
    fn test_encode_selected() {
        let catalog = create_test_catalog();
        let encoded = encoder(1)
            .encode_selected(person("John", "Smith", "1980-04-12"), &catalog, &["dob"])
            .unwrap();
        assert_eq!(encoded.instances().len(), 1);

        let result = encoder(1).encode_selected(person("John", "Smith", "1980-04-12"), &catalog, &["ssn"]);
        assert!(matches!(result, Err(Error::UnknownIndex(id)) if id == "ssn"));
    }

    #[test]
    fn test_fuzzy_sets_bits_for_short_names() {
        let catalog = IndexCatalog::new(vec![IndexDefinition::fuzzy("given", &["given_name"], 50.0)]).unwrap();
        let encoded = encoder(1).encode(vec![Attribute::phonetic("given_name", "Al")], &catalog).unwrap();
        let bloom = encoded.get("given").unwrap().as_bloom().unwrap();
        assert!(bloom.count_ones() > 0);
    }

    #[test]
    fn test_serialized_output_has_no_source_text() {
        let catalog = create_test_catalog();
        let mut attributes = person("Bartholomew", "Featherstonehaugh", "1980-04-12");
        attributes.push(Attribute::exact("record_number", "MRN-778812"));
        let encoded = encoder(1).encode(attributes, &catalog).unwrap();

        let json = serde_json::to_string(&encoded).unwrap().to_lowercase();
        for fragment in ["bartholomew", "featherstonehaugh", "b634", "f362", "19800412", "778812"] {
            assert!(!json.contains(fragment), "leaked {}", fragment);
        }
    }
}
