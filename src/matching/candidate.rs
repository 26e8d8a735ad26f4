use std::collections::HashMap;

use crate::core::code::CodeFamily;
use crate::core::trial::TrialSummary;
use crate::core::types::TrialId;
use crate::utils::text::truncate_chars;

/// Lifecycle of a per-trial working record within one query
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum MatchPhase {
    /// Created, no inclusion credited yet
    New,
    /// One or more inclusion matches credited
    Scored,
    /// Exclusion conflicts checked (zero or more penalties applied)
    Audited,
    /// Ordered for output; no further mutation
    Ranked,
}

/// Working record for one trial during a single matching query
#[derive(Debug, Clone)]
pub struct CandidateMatch {
    pub trial: TrialSummary,
    score: i64,
    matched_texts: Vec<String>,
    alerts: Vec<String>,
    conflicts: Vec<CodeFamily>,
    phase: MatchPhase,
}

impl CandidateMatch {
    pub(crate) fn new(trial: TrialSummary) -> Self {
        Self {
            trial,
            score: 0,
            matched_texts: Vec::new(),
            alerts: Vec::new(),
            conflicts: Vec::new(),
            phase: MatchPhase::New,
        }
    }

    /// Credit one inclusion match. Identical criterion texts are kept once,
    /// but every match still adds its weight.
    pub(crate) fn record_inclusion(&mut self, text: &str, weight: i64) {
        debug_assert!(self.phase <= MatchPhase::Scored, "inclusion after audit");
        if !self.matched_texts.iter().any(|t| t == text) {
            self.matched_texts.push(text.to_string());
        }
        self.score = self.score.saturating_add(weight);
        self.phase = MatchPhase::Scored;
    }

    /// Penalize a conflicting exclusion for `family` and record an alert
    pub(crate) fn record_exclusion(
        &mut self,
        family: &CodeFamily,
        text: &str,
        penalty: i64,
        alert_width: usize,
    ) {
        debug_assert!(self.phase < MatchPhase::Ranked, "exclusion after ranking");
        self.alerts.push(format!(
            "Excludes {family}: {}",
            truncate_chars(text, alert_width)
        ));
        self.conflicts.push(family.clone());
        self.score = self.score.saturating_sub(penalty);
    }

    pub(crate) fn mark_audited(&mut self) {
        self.phase = MatchPhase::Audited;
    }

    pub(crate) fn mark_ranked(&mut self) {
        self.phase = MatchPhase::Ranked;
    }

    pub fn score(&self) -> i64 {
        self.score
    }

    pub fn matched_texts(&self) -> &[String] {
        &self.matched_texts
    }

    pub fn alerts(&self) -> &[String] {
        &self.alerts
    }

    /// Patient families with a conflicting exclusion, in audit order
    pub fn conflicts(&self) -> &[CodeFamily] {
        &self.conflicts
    }

    pub fn is_conflicted(&self) -> bool {
        !self.conflicts.is_empty()
    }

    pub fn phase(&self) -> MatchPhase {
        self.phase
    }
}

/// Candidates keyed by trial, in the order they were first matched
#[derive(Debug, Default)]
pub struct CandidateSet {
    candidates: Vec<CandidateMatch>,

    /// Index: trial ID -> index in candidates vec
    id_to_index: HashMap<TrialId, usize>,
}

impl CandidateSet {
    /// Credit an inclusion match, creating the trial's record on first sight
    pub(crate) fn record(&mut self, trial: TrialSummary, text: &str, weight: i64) {
        let index = match self.id_to_index.get(&trial.nct_id) {
            Some(&index) => index,
            None => {
                let index = self.candidates.len();
                self.id_to_index.insert(trial.nct_id.clone(), index);
                self.candidates.push(CandidateMatch::new(trial));
                index
            }
        };
        self.candidates[index].record_inclusion(text, weight);
    }

    pub fn get(&self, id: &TrialId) -> Option<&CandidateMatch> {
        self.id_to_index.get(id).map(|&idx| &self.candidates[idx])
    }

    pub(crate) fn get_mut(&mut self, id: &TrialId) -> Option<&mut CandidateMatch> {
        self.id_to_index
            .get(id)
            .map(|&idx| &mut self.candidates[idx])
    }

    pub fn iter(&self) -> impl Iterator<Item = &CandidateMatch> {
        self.candidates.iter()
    }

    pub fn len(&self) -> usize {
        self.candidates.len()
    }

    pub fn is_empty(&self) -> bool {
        self.candidates.is_empty()
    }

    pub(crate) fn into_vec(self) -> Vec<CandidateMatch> {
        self.candidates
    }
}
