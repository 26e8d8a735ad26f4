use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::Path;

use super::{CriteriaStore, StoreError};
use crate::core::code::{CodeFamily, FAMILY_LENGTH};
use crate::core::trial::{Criterion, Trial, TrialSummary};
use crate::core::types::{CriterionType, TrialId};

/// Store version for compatibility checking
pub const STORE_VERSION: &str = "1.0.0";

/// Serializable store format
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StoreData {
    pub version: String,
    #[serde(default)]
    pub created_at: String,
    pub trials: Vec<Trial>,
}

/// Trials and their criteria held in memory, with lookup indexes
#[derive(Debug)]
pub struct InMemoryStore {
    /// All trials, in insertion order
    trials: Vec<Trial>,

    /// Index: trial ID -> index in trials vec
    id_to_index: HashMap<TrialId, usize>,

    /// Index: code family -> (trial index, criterion index), in insertion order
    family_to_criteria: HashMap<CodeFamily, Vec<(usize, usize)>>,
}

impl InMemoryStore {
    /// Create an empty store
    pub fn new() -> Self {
        Self {
            trials: Vec::new(),
            id_to_index: HashMap::new(),
            family_to_criteria: HashMap::new(),
        }
    }

    /// Load the embedded demonstration store
    pub fn load_embedded() -> Result<Self, StoreError> {
        // Validated at compile time by build.rs
        const EMBEDDED_STORE: &str = include_str!("../../data/trials.json");
        Self::from_json(EMBEDDED_STORE)
    }

    /// Load a store from a JSON file
    pub fn load_from_file(path: &Path) -> Result<Self, StoreError> {
        let content = std::fs::read_to_string(path)?;
        Self::from_json(&content)
    }

    /// Parse a store from a JSON string
    pub fn from_json(json: &str) -> Result<Self, StoreError> {
        let data: StoreData = serde_json::from_str(json)?;

        if data.version != STORE_VERSION {
            tracing::warn!(
                "Trial store version mismatch (expected {}, found {})",
                STORE_VERSION,
                data.version
            );
        }

        let mut store = Self::new();
        for trial in data.trials {
            store.add_trial(trial);
        }

        tracing::debug!(
            "Loaded trial store with {} trials and {} coded families",
            store.len(),
            store.family_to_criteria.len()
        );

        Ok(store)
    }

    /// Add a trial, replacing any previous trial with the same ID
    pub fn add_trial(&mut self, trial: Trial) {
        if let Some(&index) = self.id_to_index.get(&trial.nct_id) {
            self.trials[index] = trial;
            self.rebuild_family_index();
            return;
        }

        let index = self.trials.len();
        self.id_to_index.insert(trial.nct_id.clone(), index);
        self.index_criteria(index, &trial);
        self.trials.push(trial);
    }

    fn index_criteria(&mut self, trial_index: usize, trial: &Trial) {
        for (criterion_index, criterion) in trial.criteria.iter().enumerate() {
            if let Some(family) = criterion.code.as_deref().and_then(CodeFamily::from_code) {
                self.family_to_criteria
                    .entry(family)
                    .or_default()
                    .push((trial_index, criterion_index));
            }
        }
    }

    /// Set codes on criteria by (trial index, criterion index), then reindex
    pub(super) fn assign_codes(&mut self, assignments: Vec<((usize, usize), String)>) {
        if assignments.is_empty() {
            return;
        }
        for ((t, c), code) in assignments {
            if let Some(criterion) = self.trials.get_mut(t).and_then(|tr| tr.criteria.get_mut(c)) {
                criterion.code = Some(code);
            }
        }
        self.rebuild_family_index();
    }

    fn rebuild_family_index(&mut self) {
        self.family_to_criteria.clear();
        let trials = std::mem::take(&mut self.trials);
        for (index, trial) in trials.iter().enumerate() {
            self.index_criteria(index, trial);
        }
        self.trials = trials;
    }

    /// Get a trial by ID
    pub fn get(&self, id: &TrialId) -> Option<&Trial> {
        self.id_to_index.get(id).map(|&idx| &self.trials[idx])
    }

    /// All trials in insertion order
    pub fn trials(&self) -> &[Trial] {
        &self.trials
    }

    /// Criteria of type `kind` whose code starts with `family`, in store order
    pub fn criteria_by_family(
        &self,
        kind: CriterionType,
        family: &CodeFamily,
    ) -> Vec<(&Criterion, &Trial)> {
        // Full-length families are served from the index; shorter ones need a scan
        if family.as_str().chars().count() == FAMILY_LENGTH {
            return self
                .family_to_criteria
                .get(family)
                .map(|positions| {
                    positions
                        .iter()
                        .map(|&(t, c)| (&self.trials[t].criteria[c], &self.trials[t]))
                        .filter(|(criterion, _)| criterion.kind == kind)
                        .collect()
                })
                .unwrap_or_default();
        }

        self.trials
            .iter()
            .flat_map(|trial| trial.criteria.iter().map(move |c| (c, trial)))
            .filter(|(c, _)| c.kind == kind && c.code_starts_with(family.as_str()))
            .collect()
    }

    /// First Exclusion criterion of a trial whose code starts with `family`
    pub fn first_exclusion(&self, trial_id: &TrialId, family: &CodeFamily) -> Option<&Criterion> {
        self.get(trial_id)?.criteria.iter().find(|c| {
            c.kind == CriterionType::Exclusion && c.code_starts_with(family.as_str())
        })
    }

    /// Export the store to JSON
    pub fn to_json(&self) -> Result<String, StoreError> {
        let data = StoreData {
            version: STORE_VERSION.to_string(),
            created_at: chrono::Utc::now().to_rfc3339(),
            trials: self.trials.clone(),
        };
        Ok(serde_json::to_string_pretty(&data)?)
    }

    /// Number of trials in the store
    pub fn len(&self) -> usize {
        self.trials.len()
    }

    /// Check if the store is empty
    pub fn is_empty(&self) -> bool {
        self.trials.is_empty()
    }
}

impl Default for InMemoryStore {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl CriteriaStore for InMemoryStore {
    async fn find_inclusion_by_family(
        &self,
        family: &CodeFamily,
    ) -> Result<Vec<(Criterion, TrialSummary)>, StoreError> {
        Ok(self
            .criteria_by_family(CriterionType::Inclusion, family)
            .into_iter()
            .map(|(criterion, trial)| (criterion.clone(), trial.summary()))
            .collect())
    }

    async fn find_exclusion_by_family(
        &self,
        trial_id: &TrialId,
        family: &CodeFamily,
    ) -> Result<Option<Criterion>, StoreError> {
        Ok(self.first_exclusion(trial_id, family).cloned())
    }
}
