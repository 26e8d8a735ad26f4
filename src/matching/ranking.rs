use serde::Serialize;

use crate::core::types::TrialId;
use crate::matching::audit::AuditedCandidates;
use crate::utils::text::truncate_chars;

/// One ranked trial as presented to callers
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RankedTrial {
    pub nct_id: TrialId,
    pub title: String,
    pub score: i64,
    /// Display-bounded prefix of the matched inclusion texts
    pub matched_texts: Vec<String>,
    /// Number of distinct matched inclusion texts before display bounding
    pub matched_total: usize,
    pub alerts: Vec<String>,
}

impl RankedTrial {
    pub fn is_conflicted(&self) -> bool {
        !self.alerts.is_empty()
    }
}

/// Display bounds applied when shaping ranked output
#[derive(Debug, Clone, Copy)]
pub struct DisplayLimits {
    pub max_matched_texts: usize,
    pub match_text_width: usize,
}

/// Order audited candidates for output.
///
/// Conflict-free trials come first, each group by score descending. The sort is
/// stable, so equal scores keep collection order.
pub fn rank(audited: AuditedCandidates, limits: DisplayLimits) -> Vec<RankedTrial> {
    let mut candidates = audited.0;
    candidates.sort_by(|a, b| {
        a.is_conflicted()
            .cmp(&b.is_conflicted())
            .then_with(|| b.score().cmp(&a.score()))
    });

    candidates
        .into_iter()
        .map(|mut candidate| {
            candidate.mark_ranked();
            RankedTrial {
                nct_id: candidate.trial.nct_id.clone(),
                title: candidate.trial.title.clone(),
                score: candidate.score(),
                matched_texts: candidate
                    .matched_texts()
                    .iter()
                    .take(limits.max_matched_texts)
                    .map(|t| truncate_chars(t, limits.match_text_width))
                    .collect(),
                matched_total: candidate.matched_texts().len(),
                alerts: candidate.alerts().to_vec(),
            }
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::code::CodeFamily;
    use crate::core::trial::TrialSummary;
    use crate::matching::candidate::CandidateMatch;

    const LIMITS: DisplayLimits = DisplayLimits {
        max_matched_texts: 2,
        match_text_width: 10,
    };

    fn candidate(id: &str, inclusion: &[(&str, i64)], conflicts: &[&str]) -> CandidateMatch {
        let mut c = CandidateMatch::new(TrialSummary {
            nct_id: TrialId::new(id),
            title: id.to_string(),
        });
        for (text, weight) in inclusion {
            c.record_inclusion(text, *weight);
        }
        for family in conflicts {
            c.record_exclusion(&CodeFamily::from_code(family).unwrap(), "x", 100, 80);
        }
        c.mark_audited();
        c
    }

    fn ids(ranked: &[RankedTrial]) -> Vec<&str> {
        ranked.iter().map(|r| r.nct_id.as_str()).collect()
    }

    #[test]
    fn test_sorted_by_score_descending_with_stable_ties() {
        let audited = AuditedCandidates(vec![
            candidate("A", &[("a", 5)], &[]),
            candidate("B", &[("b", 10)], &[]),
            candidate("C", &[("c", 5)], &[]),
        ]);
        let ranked = rank(audited, LIMITS);
        assert_eq!(ids(&ranked), vec!["B", "A", "C"]);
    }

    #[test]
    fn test_conflicted_trials_rank_below_clean_trials() {
        // 30 inclusion matches minus one penalty still outscores "clean" numerically
        let heavy: Vec<(&str, i64)> = (0..30).map(|_| ("same", 10)).collect();
        let audited = AuditedCandidates(vec![
            candidate("CONFLICTED", &heavy, &["C50"]),
            candidate("CLEAN", &[("c", 1)], &[]),
        ]);
        let ranked = rank(audited, LIMITS);
        assert_eq!(ids(&ranked), vec!["CLEAN", "CONFLICTED"]);
        assert_eq!(ranked[1].score, 200);
        assert!(ranked[1].is_conflicted());
    }

    #[test]
    fn test_matched_texts_are_display_bounded() {
        let audited = AuditedCandidates(vec![candidate(
            "A",
            &[("first clause is long", 1), ("second", 1), ("third", 1)],
            &[],
        )]);
        let ranked = rank(audited, LIMITS);

        assert_eq!(ranked[0].score, 3);
        assert_eq!(ranked[0].matched_total, 3);
        assert_eq!(
            ranked[0].matched_texts,
            vec!["first clau...".to_string(), "second".to_string()]
        );
    }
}
