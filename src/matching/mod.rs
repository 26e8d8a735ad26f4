//! Trial matching engine and scoring.
//!
//! A matching query runs as a fixed pipeline:
//!
//! 1. **Resolve**: patient codes are reduced to their [`CodeFamily`] set
//! 2. **Collect**: every trial with an inclusion criterion in one of those
//!    families becomes a candidate, credited with the family's weight
//! 3. **Audit**: each candidate is checked for an exclusion criterion in each
//!    patient family; each conflicting family costs a fixed penalty and raises
//!    an alert
//! 4. **Rank**: conflict-free trials first, then by score descending
//!
//! Each stage consumes the previous stage's output, so a candidate cannot be
//! ranked before it has been audited.
//!
//! ## Scoring
//!
//! | Family prefix | Weight |
//! |---------------|--------|
//! | C, D, I, J    | 10     |
//! | R             | 5      |
//! | anything else | 1      |
//!
//! ## Example
//!
//! ```rust,no_run
//! use trial_matcher::{InMemoryStore, MatchingEngine};
//! use trial_matcher::extract::keyword::KeywordExtractor;
//!
//! # async fn run() -> anyhow::Result<()> {
//! let store = InMemoryStore::load_embedded()?;
//! let extractor = KeywordExtractor::load_embedded()?;
//!
//! let engine = MatchingEngine::new(&store, &extractor);
//! let outcome = engine
//!     .match_description("58 year old woman with breast cancer and hypertension")
//!     .await?;
//!
//! for trial in outcome.trials() {
//!     println!("{}: {} ({} alerts)", trial.nct_id, trial.score, trial.alerts.len());
//! }
//! # Ok(())
//! # }
//! ```
//!
//! [`CodeFamily`]: crate::core::code::CodeFamily

pub mod audit;
pub mod candidate;
pub mod collector;
pub mod engine;
pub mod ranking;
pub mod scoring;

pub use engine::{MatchError, MatchOutcome, MatchingConfig, MatchingEngine};
pub use ranking::RankedTrial;
pub use scoring::ScoringWeights;
