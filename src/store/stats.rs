//! Store audit statistics and criteria browsing.

use serde::Serialize;
use std::collections::{HashMap, HashSet};

use super::memory::InMemoryStore;
use crate::core::trial::{Criterion, Trial};
use crate::core::types::{Category, TrialId};

/// Summary of what the ingestion pipeline has put into a store
#[derive(Debug, Clone, Serialize)]
pub struct StoreStats {
    pub trial_count: usize,
    pub criteria_count: usize,
    /// Criteria per category, most frequent first
    pub by_category: Vec<(Category, usize)>,
    /// Condition criteria, and how many of them carry a code
    pub condition_total: usize,
    pub condition_coded: usize,
    pub per_trial: Vec<TrialBalance>,
}

/// Inclusion/exclusion counts for one trial
#[derive(Debug, Clone, Serialize)]
pub struct TrialBalance {
    pub nct_id: TrialId,
    pub inclusion: usize,
    pub exclusion: usize,
}

impl StoreStats {
    /// Fraction of condition criteria mapped to a code (0.0 when there are none)
    #[must_use]
    pub fn coding_coverage(&self) -> f64 {
        if self.condition_total == 0 {
            return 0.0;
        }
        #[allow(clippy::cast_precision_loss)]
        {
            self.condition_coded as f64 / self.condition_total as f64
        }
    }
}

/// Browse filter over stored criteria
#[derive(Debug, Clone, Default)]
pub struct CriteriaFilter {
    /// Restrict to one trial
    pub trial_id: Option<TrialId>,
    /// Case-insensitive substring of the criterion entity or code
    pub condition: Option<String>,
    /// Patient age in years. Trials with any Age criterion excluding it are dropped whole.
    pub age: Option<u32>,
}

impl CriteriaFilter {
    fn accepts(&self, trial: &Trial, criterion: &Criterion) -> bool {
        if let Some(id) = &self.trial_id {
            if &trial.nct_id != id {
                return false;
            }
        }

        match self.condition.as_deref().map(str::trim) {
            None | Some("") => true,
            Some(needle) => {
                let needle = needle.to_lowercase();
                let contains = |s: &Option<String>| {
                    s.as_deref()
                        .is_some_and(|v| v.to_lowercase().contains(&needle))
                };
                contains(&criterion.entity) || contains(&criterion.code)
            }
        }
    }
}

impl InMemoryStore {
    /// Compute audit statistics over the whole store
    pub fn stats(&self) -> StoreStats {
        let mut category_counts: HashMap<Category, usize> = HashMap::new();
        let mut condition_total = 0;
        let mut condition_coded = 0;
        let mut per_trial = Vec::with_capacity(self.len());

        for trial in self.trials() {
            for criterion in &trial.criteria {
                *category_counts.entry(criterion.category).or_default() += 1;
                if criterion.category == Category::Condition {
                    condition_total += 1;
                    if criterion.code.is_some() {
                        condition_coded += 1;
                    }
                }
            }
            per_trial.push(TrialBalance {
                nct_id: trial.nct_id.clone(),
                inclusion: trial.inclusion_count(),
                exclusion: trial.exclusion_count(),
            });
        }

        let mut by_category: Vec<_> = category_counts.into_iter().collect();
        by_category.sort_by(|a, b| b.1.cmp(&a.1).then(a.0.cmp(&b.0)));

        StoreStats {
            trial_count: self.len(),
            criteria_count: by_category.iter().map(|(_, n)| n).sum(),
            by_category,
            condition_total,
            condition_coded,
            per_trial,
        }
    }

    /// Criteria accepted by `filter`, paired with their trial, in store order
    pub fn search(&self, filter: &CriteriaFilter) -> Vec<(&Trial, &Criterion)> {
        let disqualified: HashSet<&TrialId> = match filter.age {
            Some(age) => self
                .trials()
                .iter()
                .filter(|t| t.criteria.iter().any(|c| c.rejects_age(age)))
                .map(|t| &t.nct_id)
                .collect(),
            None => HashSet::new(),
        };

        self.trials()
            .iter()
            .filter(|trial| !disqualified.contains(&trial.nct_id))
            .flat_map(|trial| trial.criteria.iter().map(move |c| (trial, c)))
            .filter(|(trial, c)| filter.accepts(trial, c))
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_stats_on_embedded_store() {
        let store = InMemoryStore::load_embedded().unwrap();
        let stats = store.stats();

        assert_eq!(stats.trial_count, 5);
        assert_eq!(stats.per_trial.len(), 5);
        assert_eq!(
            stats.criteria_count,
            stats.per_trial.iter().map(|t| t.inclusion + t.exclusion).sum::<usize>()
        );
        assert_eq!(stats.by_category[0].0, Category::Condition);
        assert!(stats.coding_coverage() > 0.9);
    }

    #[test]
    fn test_coverage_without_conditions() {
        let stats = InMemoryStore::new().stats();
        assert_eq!(stats.trial_count, 0);
        assert!((stats.coding_coverage() - 0.0).abs() < f64::EPSILON);
    }

    #[test]
    fn test_search_by_condition_matches_entity_or_code() {
        let store = InMemoryStore::load_embedded().unwrap();

        let by_entity = store.search(&CriteriaFilter {
            condition: Some("heart FAILURE".to_string()),
            ..Default::default()
        });
        assert_eq!(by_entity.len(), 2);

        let by_code = store.search(&CriteriaFilter {
            condition: Some("c50".to_string()),
            ..Default::default()
        });
        assert_eq!(by_code.len(), 2);
    }

    #[test]
    fn test_search_by_trial() {
        let store = InMemoryStore::load_embedded().unwrap();
        let rows = store.search(&CriteriaFilter {
            trial_id: Some(TrialId::new("NCT90000004")),
            ..Default::default()
        });
        assert_eq!(rows.len(), 3);
        assert!(rows.iter().all(|(t, _)| t.nct_id.as_str() == "NCT90000004"));
    }

    #[test]
    fn test_search_by_age_drops_whole_trial() {
        let mut store = InMemoryStore::new();
        store.add_trial(Trial::new("NCT1", "Adults only").with_criteria(vec![
            Criterion::inclusion(Category::Condition, "Asthma").with_code("J45"),
            Criterion::inclusion(Category::Age, "Aged 18 to 65").with_age_range(Some(18), Some(65)),
            Criterion::exclusion(Category::Lifestyle, "Current smoker"),
        ]));
        store.add_trial(Trial::new("NCT2", "Any age").with_criteria(vec![
            Criterion::inclusion(Category::Condition, "Asthma").with_code("J45"),
            Criterion::inclusion(Category::Age, "Any age"),
        ]));

        let rows = store.search(&CriteriaFilter {
            age: Some(70),
            ..Default::default()
        });
        assert_eq!(rows.len(), 2);
        assert!(rows.iter().all(|(t, _)| t.nct_id.as_str() == "NCT2"));

        let rows = store.search(&CriteriaFilter {
            age: Some(40),
            ..Default::default()
        });
        assert_eq!(rows.len(), 5);
    }

    #[test]
    fn test_search_by_age_on_embedded_store() {
        let store = InMemoryStore::load_embedded().unwrap();
        let rows = store.search(&CriteriaFilter {
            age: Some(16),
            ..Default::default()
        });
        assert!(!rows.is_empty());
        assert!(rows.iter().all(|(t, _)| t.nct_id.as_str() != "NCT90000001"));
    }
}
