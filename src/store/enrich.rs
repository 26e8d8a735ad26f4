//! Backfill codes on criteria the ingestion pipeline left uncoded.

use serde::Serialize;
use std::time::Duration;

use super::memory::InMemoryStore;
use crate::core::types::Category;
use crate::extract::CodeExtractor;
use crate::utils::validation::normalize_code;

/// Categories whose uncoded criteria are sent to the extractor
pub const ENRICHED_CATEGORIES: [Category; 3] =
    [Category::Condition, Category::Other, Category::Medication];

/// Outcome of one enrichment pass
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct EnrichReport {
    /// Uncoded criteria in an enriched category
    pub examined: usize,
    /// Criteria that received a code
    pub coded: usize,
    /// Extractor failures and timeouts; the criterion stays uncoded
    pub failed: usize,
}

impl InMemoryStore {
    /// Run `extractor` over the text of every uncoded criterion in
    /// [`ENRICHED_CATEGORIES`] and store the first valid code it returns.
    ///
    /// Criteria are visited one at a time in store order. A failed or timed-out
    /// extraction leaves that criterion uncoded and the pass continues. The
    /// family index is rebuilt once at the end.
    pub async fn enrich(&mut self, extractor: &dyn CodeExtractor, timeout: Duration) -> EnrichReport {
        let pending: Vec<((usize, usize), String)> = self
            .trials()
            .iter()
            .enumerate()
            .flat_map(|(t, trial)| {
                trial
                    .criteria
                    .iter()
                    .enumerate()
                    .filter(|(_, c)| c.code.is_none() && ENRICHED_CATEGORIES.contains(&c.category))
                    .map(move |(c, criterion)| ((t, c), criterion.text.clone()))
            })
            .collect();

        let mut report = EnrichReport {
            examined: pending.len(),
            ..Default::default()
        };
        let mut assignments = Vec::new();

        for (position, text) in pending {
            let codes = match tokio::time::timeout(timeout, extractor.extract(&text)).await {
                Ok(Ok(codes)) => codes,
                Ok(Err(e)) => {
                    tracing::warn!("Extraction failed for '{}': {}", text, e);
                    report.failed += 1;
                    continue;
                }
                Err(_) => {
                    tracing::warn!("Extraction timed out for '{}'", text);
                    report.failed += 1;
                    continue;
                }
            };

            if let Some(code) = codes.iter().find_map(|c| normalize_code(c)) {
                tracing::debug!("Coded '{}' as {}", text, code);
                assignments.push((position, code));
            }
        }

        report.coded = assignments.len();
        self.assign_codes(assignments);
        report
    }
}
