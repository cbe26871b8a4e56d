//! # blindmatch Core
//!
//! Core library for the blindmatch identity resolution engine.
//!
//! This crate provides the shared data model:
//!
//! - [`Attribute`] - A raw demographic input field with its declared kind
//! - [`IndexDefinition`] / [`IndexCatalog`] - How attributes become artifacts and what they weigh
//! - [`IndexInstance`] - Opaque artifact: keyed [`Digest`] or Bloom [`BitVector`]
//! - [`ScoringPolicy`] / [`EngineConfig`] - Immutable startup configuration
//! - [`IndexStore`] / [`MemoryStore`] - Storage seam for identity records
//!
//! ## Example
//!
//! ```rust
//! use blindmatch_core::{IndexCatalog, IndexDefinition, IndexInstance};
//!
//! let catalog = IndexCatalog::new(vec![
//!     IndexDefinition::exact("dob", &["date_of_birth"], 40.0),
//!     IndexDefinition::fuzzy("name", &["given_name", "family_name"], 50.0),
//! ]).unwrap();
//!
//! let name = catalog.get("name").unwrap();
//! assert_eq!(name.artifact_len(), 128);
//!
//! let empty = IndexInstance::empty_for(name);
//! assert!(empty.is_empty());
//! ```

pub mod attribute;
pub mod config;
pub mod error;
pub mod identity;
pub mod index;
pub mod instance;
pub mod store;

pub use attribute::{Attribute, AttributeKind};
pub use config::{EngineConfig, ScoringPolicy};
pub use error::{Error, InputError, Result};
pub use identity::{IdentityId, IdentityRecord, InstanceMap};
pub use index::{IndexCatalog, IndexDefinition, MatchType, DIGEST_LEN};
pub use instance::{BitVector, Digest, IndexInstance};
pub use store::{IndexStore, MemoryStore};
