use crate::instance::IndexInstance;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use uuid::Uuid;

/// Encoded artifacts of one identity or query, keyed by index id
pub type InstanceMap = BTreeMap<String, IndexInstance>;

#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(untagged)]
pub enum IdentityId {
    Integer(u64),
    Uuid(Uuid),
    String(String),
}

impl IdentityId {
    pub fn new_v4() -> Self {
        IdentityId::Uuid(Uuid::new_v4())
    }
}

impl std::fmt::Display for IdentityId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            IdentityId::String(s) => write!(f, "{}", s),
            IdentityId::Uuid(u) => write!(f, "{}", u),
            IdentityId::Integer(i) => write!(f, "{}", i),
        }
    }
}

impl From<String> for IdentityId {
    fn from(s: String) -> Self {
        IdentityId::String(s)
    }
}

impl From<&str> for IdentityId {
    fn from(s: &str) -> Self {
        IdentityId::String(s.to_string())
    }
}

impl From<u64> for IdentityId {
    fn from(i: u64) -> Self {
        IdentityId::Integer(i)
    }
}

impl From<Uuid> for IdentityId {
    fn from(u: Uuid) -> Self {
        IdentityId::Uuid(u)
    }
}

/// Stored index entries of one identity
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct IdentityRecord {
    pub id: IdentityId,
    /// Incremented each time the record is replaced
    #[serde(default)]
    pub version: u64,
    pub instances: InstanceMap,
}

impl IdentityRecord {
    #[inline]
    #[must_use]
    pub fn new(id: IdentityId, instances: InstanceMap) -> Self {
        Self {
            id,
            version: 0,
            instances,
        }
    }

    #[inline]
    pub fn instance(&self, index_id: &str) -> Option<&IndexInstance> {
        self.instances.get(index_id)
    }
}
