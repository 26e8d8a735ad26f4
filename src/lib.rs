//! # trial-matcher
//!
//! A library for ranking clinical trials against a patient's medical codes.
//!
//! A free-text patient description is turned into medical codes by a pluggable
//! [`CodeExtractor`]. Codes are reduced to 3-character families (`C50.911` becomes
//! `C50`) and compared against coded trial eligibility criteria held in a
//! [`CriteriaStore`].
//!
//! ## Features
//!
//! - **Family matching**: Codes match criteria by shared 3-character prefix
//! - **Weighted scoring**: Primary disease families outweigh symptoms and status codes
//! - **Safety audit**: Conflicting exclusion criteria are penalized and reported
//! - **Deterministic ranking**: Identical inputs always produce identical output
//! - **Fail-hard**: Store failures and timeouts abort the query instead of
//!   returning partial results
//!
//! ## Example
//!
//! ```rust,no_run
//! use trial_matcher::{InMemoryStore, MatchingEngine, StaticExtractor};
//!
//! # async fn run() -> anyhow::Result<()> {
//! let store = InMemoryStore::load_embedded()?;
//! let extractor = StaticExtractor::default();
//! let engine = MatchingEngine::new(&store, &extractor);
//!
//! let codes = ["C50.911".to_string(), "I10".to_string()].into_iter().collect();
//! let outcome = engine.match_codes(&codes).await?;
//!
//! for trial in outcome.trials() {
//!     println!("{}: {}", trial.nct_id, trial.score);
//! }
//! # Ok(())
//! # }
//! ```
//!
//! ## Modules
//!
//! - [`core`]: Trials, criteria, and code families
//! - [`store`]: Criteria store trait and in-memory implementation
//! - [`extract`]: Code extractors
//! - [`matching`]: Matching engine, scoring, audit, and ranking
//! - [`cli`]: Command-line interface implementation
//! - [`web`]: HTTP API

pub mod cli;
pub mod core;
pub mod extract;
pub mod matching;
pub mod store;
pub mod utils;
pub mod web;

// Re-export commonly used types for convenience
pub use crate::core::code::{CodeFamily, CodeSet};
pub use crate::core::trial::{Criterion, Trial, TrialSummary};
pub use crate::core::types::*;
pub use extract::{CodeExtractor, StaticExtractor};
pub use matching::engine::{MatchError, MatchOutcome, MatchingConfig, MatchingEngine};
pub use matching::ranking::RankedTrial;
pub use store::memory::InMemoryStore;
pub use store::CriteriaStore;
