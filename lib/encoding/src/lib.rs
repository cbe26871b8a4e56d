//! # blindmatch Encoding
//!
//! The trust boundary of blindmatch: the only place raw demographic text is
//! ever seen.
//!
//! Each attribute runs through a fixed sequence of private stages:
//!
//! ```text
//! raw value ─> normalize ─> phonetic (Soundex) ─> n-grams ─> HMAC-SHA256 ─> Bloom
//!                                    exact / phonetic indexes stop here ─┘
//! ```
//!
//! Only [`IndexInstance`](blindmatch_core::IndexInstance)s leave the crate.
//! The stage modules are private, and [`Encoded`] reports failures by
//! attribute name, never by value.
//!
//! ## Example
//!
//! ```rust
//! use blindmatch_core::{Attribute, IndexCatalog, IndexDefinition};
//! use blindmatch_encoding::{Encoder, SecretKey};
//!
//! let catalog = IndexCatalog::new(vec![
//!     IndexDefinition::exact("dob", &["date_of_birth"], 40.0),
//!     IndexDefinition::fuzzy("name", &["given_name", "family_name"], 50.0),
//! ]).unwrap();
//!
//! let encoder = Encoder::new(SecretKey::from_bytes(vec![7u8; 32]).unwrap()).unwrap();
//! let encoded = encoder.encode(vec![
//!     Attribute::phonetic("given_name", "Jon"),
//!     Attribute::phonetic("family_name", "Smyth"),
//!     Attribute::date("date_of_birth", "1980-04-12"),
//! ], &catalog).unwrap();
//!
//! assert_eq!(encoded.instances().len(), 2);
//! assert!(encoded.failures().is_empty());
//! ```

mod bloom;
mod hasher;
mod ngram;
mod normalize;
mod phonetic;

pub mod key;
pub mod pipeline;

pub use key::{SecretKey, KEY_FILE_ENV};
pub use pipeline::{AttributeFailure, Encoded, Encoder};
