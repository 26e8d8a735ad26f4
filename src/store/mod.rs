//! Structured eligibility criteria storage.
//!
//! The matching engine needs only two read queries from its store, captured by
//! the [`CriteriaStore`] trait:
//!
//! - all Inclusion criteria (across every trial) whose code starts with a family
//! - whether a given trial has an Exclusion criterion whose code starts with a family
//!
//! [`InMemoryStore`] implements both over trials loaded from JSON. An embedded
//! demonstration dataset is compiled into the binary, and custom stores can be
//! loaded from files exported by the ingestion pipeline.
//!
//! ## Example
//!
//! ```rust,no_run
//! use trial_matcher::store::memory::InMemoryStore;
//! use trial_matcher::core::types::TrialId;
//!
//! let store = InMemoryStore::load_embedded().unwrap();
//! for trial in store.trials() {
//!     println!("{}: {}", trial.nct_id, trial.title);
//! }
//!
//! let trial = store.get(&TrialId::new("NCT90000001"));
//! ```

pub mod enrich;
pub mod memory;
pub mod stats;

use async_trait::async_trait;
use thiserror::Error;

use crate::core::code::CodeFamily;
use crate::core::trial::{Criterion, TrialSummary};
use crate::core::types::TrialId;

#[derive(Error, Debug)]
pub enum StoreError {
    #[error("Failed to read trial store: {0}")]
    ReadError(#[from] std::io::Error),

    #[error("Failed to parse trial store: {0}")]
    ParseError(#[from] serde_json::Error),

    #[error("Trial store backend failure: {0}")]
    Backend(String),
}

/// Read access to structured criteria, as required by the matching engine.
///
/// Prefix comparison is case-insensitive and ignores criteria without a code.
#[async_trait]
pub trait CriteriaStore: Send + Sync {
    /// All Inclusion criteria whose code starts with `family`, paired with their trial
    async fn find_inclusion_by_family(
        &self,
        family: &CodeFamily,
    ) -> Result<Vec<(Criterion, TrialSummary)>, StoreError>;

    /// First Exclusion criterion of `trial_id` whose code starts with `family`
    async fn find_exclusion_by_family(
        &self,
        trial_id: &TrialId,
        family: &CodeFamily,
    ) -> Result<Option<Criterion>, StoreError>;
}
