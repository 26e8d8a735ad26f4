use futures::stream::{self, StreamExt, TryStreamExt};
use std::collections::BTreeSet;
use std::time::Duration;

use crate::core::code::CodeFamily;
use crate::matching::candidate::{CandidateMatch, CandidateSet};
use crate::matching::engine::{with_timeout, MatchError, MAX_IN_FLIGHT_QUERIES};
use crate::store::CriteriaStore;

/// Candidates whose exclusion conflicts have been checked
#[derive(Debug)]
pub struct AuditedCandidates(pub(crate) Vec<CandidateMatch>);

impl AuditedCandidates {
    pub fn iter(&self) -> impl Iterator<Item = &CandidateMatch> {
        self.0.iter()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

/// Checks every candidate against every patient family for a conflicting exclusion.
///
/// Only existence matters: one conflicting exclusion per (trial, family) costs one
/// penalty, however many clauses would conflict. Candidates are never added or removed.
pub struct SafetyAuditor<'a> {
    store: &'a dyn CriteriaStore,
    penalty: i64,
    alert_width: usize,
    timeout: Duration,
}

impl<'a> SafetyAuditor<'a> {
    pub fn new(
        store: &'a dyn CriteriaStore,
        penalty: i64,
        alert_width: usize,
        timeout: Duration,
    ) -> Self {
        Self {
            store,
            penalty,
            alert_width,
            timeout,
        }
    }

    /// Run the audit. Takes ownership of the collected set, so it can only start
    /// once collection and scoring are complete.
    pub async fn audit(
        &self,
        mut candidates: CandidateSet,
        families: &BTreeSet<CodeFamily>,
    ) -> Result<AuditedCandidates, MatchError> {
        let pairs: Vec<_> = candidates
            .iter()
            .flat_map(|c| families.iter().map(move |f| (c.trial.nct_id.clone(), f)))
            .collect();

        let checks: Vec<_> = stream::iter(pairs)
            .map(|(trial_id, family)| async move {
                let hit = with_timeout(
                    "find_exclusion_by_family",
                    self.timeout,
                    self.store.find_exclusion_by_family(&trial_id, family),
                )
                .await?;
                Ok::<_, MatchError>((trial_id, family, hit))
            })
            .buffered(MAX_IN_FLIGHT_QUERIES)
            .boxed()
            .try_collect()
            .await?;

        for (trial_id, family, hit) in checks {
            let Some(criterion) = hit else { continue };
            if let Some(candidate) = candidates.get_mut(&trial_id) {
                tracing::debug!("Trial {} excludes family {}", trial_id, family);
                candidate.record_exclusion(family, &criterion.text, self.penalty, self.alert_width);
            }
        }

        let mut audited = candidates.into_vec();
        for candidate in &mut audited {
            candidate.mark_audited();
        }

        Ok(AuditedCandidates(audited))
    }
}
