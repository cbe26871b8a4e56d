//! # blindmatch Similarity
//!
//! Comparison and scoring engine over encoded identity artifacts.
//!
//! This crate never sees raw attribute values. It works on
//! [`IndexInstance`](blindmatch_core::IndexInstance)s produced by the
//! encoding pipeline and turns them into explainable confidence scores.
//!
//! ## Features
//!
//! - **Comparison**: Constant-time digest equality and Dice similarity of Bloom vectors
//! - **Scoring**: Per-index weight caps, fuzzy similarity floor, corroboration bonus
//! - **Ranking**: Parallel scoring of candidates with deterministic ordering
//! - **Explainability**: Per-index contribution breakdown for every candidate
//!
//! ## Example
//!
//! ```rust
//! use blindmatch_core::{IndexCatalog, IndexDefinition, ScoringPolicy};
//! use blindmatch_similarity::{score, IndexMatch};
//!
//! let catalog = IndexCatalog::new(vec![
//!     IndexDefinition::exact("dob", &["date_of_birth"], 40.0),
//!     IndexDefinition::phonetic("family", &["family_name"], 30.0),
//! ]).unwrap();
//!
//! let breakdown = score(
//!     &[IndexMatch::exact("dob"), IndexMatch::phonetic("family")],
//!     &catalog,
//!     &ScoringPolicy::default(),
//! );
//!
//! // 40 + 30 * 0.8 + corroboration bonus of 10
//! assert!((breakdown.total - 74.0).abs() < 1e-4);
//! ```
//!
//! ## Architecture
//!
//! ```text
//! ┌─────────────┐     ┌─────────────┐     ┌─────────────┐
//! │   Compare   │────>│   Scoring   │────>│   Ranker    │
//! │ (artifacts) │     │ (breakdown) │     │ (candidates)│
//! └─────────────┘     └─────────────┘     └─────────────┘
//!                                                │
//!                                         ┌─────────────┐
//!                                         │  Explain    │
//!                                         │  (results)  │
//!                                         └─────────────┘
//! ```

pub mod compare;
pub mod explain;
pub mod rank;
pub mod scoring;

pub use compare::{compare, dice, IndexMatch, MatchSignal};
pub use explain::{ExplainedResult, IndexExplanation, LookupResponse, LookupStats};
pub use rank::{MatchList, RankedCandidate, Ranker};
pub use scoring::{score, IndexContribution, ScoreBreakdown, ScoreIssue};
