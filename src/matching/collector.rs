use futures::stream::{self, StreamExt, TryStreamExt};
use std::collections::BTreeSet;
use std::time::Duration;

use crate::core::code::CodeFamily;
use crate::matching::candidate::CandidateSet;
use crate::matching::engine::{with_timeout, MatchError, MAX_IN_FLIGHT_QUERIES};
use crate::matching::scoring::ScoringWeights;
use crate::store::CriteriaStore;

/// Gathers inclusion matches for every family and credits their weights.
///
/// Per-family store queries run concurrently; their results are merged in
/// family order by this single aggregation step once all have returned.
pub struct CandidateCollector<'a> {
    store: &'a dyn CriteriaStore,
    weights: &'a ScoringWeights,
    timeout: Duration,
}

impl<'a> CandidateCollector<'a> {
    pub fn new(store: &'a dyn CriteriaStore, weights: &'a ScoringWeights, timeout: Duration) -> Self {
        Self {
            store,
            weights,
            timeout,
        }
    }

    /// Build the candidate set for `families`.
    ///
    /// A trial becomes a candidate only through an inclusion match here.
    pub async fn collect(&self, families: &BTreeSet<CodeFamily>) -> Result<CandidateSet, MatchError> {
        let fetched: Vec<_> = stream::iter(families)
            .map(|family| async move {
                let rows = with_timeout(
                    "find_inclusion_by_family",
                    self.timeout,
                    self.store.find_inclusion_by_family(family),
                )
                .await?;
                Ok::<_, MatchError>((family, rows))
            })
            .buffered(MAX_IN_FLIGHT_QUERIES)
            .boxed()
            .try_collect()
            .await?;

        let mut candidates = CandidateSet::default();
        for (family, rows) in fetched {
            let weight = self.weights.weight_for(family);
            tracing::debug!(
                "Family {} matched {} inclusion criteria (weight {})",
                family,
                rows.len(),
                weight
            );
            for (criterion, trial) in rows {
                candidates.record(trial, &criterion.text, weight);
            }
        }

        Ok(candidates)
    }
}
