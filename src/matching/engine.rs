use serde::{Deserialize, Serialize};
use std::future::Future;
use std::path::Path;
use std::time::Duration;
use thiserror::Error;

use crate::core::code::{resolve_families, CodeFamily, CodeSet};
use crate::extract::{CodeExtractor, ExtractError};
use crate::matching::audit::SafetyAuditor;
use crate::matching::collector::CandidateCollector;
use crate::matching::ranking::{rank, DisplayLimits, RankedTrial};
use crate::matching::scoring::ScoringWeights;
use crate::store::{CriteriaStore, StoreError};
use crate::utils::validation::{validate_description, ValidationError};

/// Maximum number of store queries in flight at once within one matching query
pub const MAX_IN_FLIGHT_QUERIES: usize = 16;

/// Default number of matched texts shown per trial
pub const DEFAULT_MAX_MATCHED_TEXTS: usize = 5;

#[derive(Debug, Error)]
pub enum MatchError {
    #[error("invalid input: {0}")]
    InvalidInput(#[from] ValidationError),

    #[error("code extraction failed: {0}")]
    Extraction(#[from] ExtractError),

    #[error("criteria store failed: {0}")]
    Store(#[from] StoreError),

    #[error("{operation} timed out after {limit_ms} ms")]
    Timeout {
        operation: &'static str,
        limit_ms: u64,
    },
}

impl MatchError {
    /// True when the caller supplied unusable input, as opposed to a collaborator failure
    pub fn is_input_error(&self) -> bool {
        matches!(self, Self::InvalidInput(_))
    }
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read config: {0}")]
    ReadError(#[from] std::io::Error),

    #[error("Failed to parse config: {0}")]
    ParseError(#[from] serde_json::Error),

    #[error("Invalid config: {0}")]
    Invalid(String),
}

/// Configuration for the matching engine
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct MatchingConfig {
    /// Inclusion weights and exclusion penalty
    pub scoring: ScoringWeights,
    /// Matched texts shown per trial
    pub max_matched_texts: usize,
    /// Characters shown per matched text
    pub match_text_width: usize,
    /// Characters of the exclusion clause quoted in an alert
    pub alert_text_width: usize,
    pub extractor_timeout_ms: u64,
    pub store_timeout_ms: u64,
    /// Maximum number of ranked trials returned
    pub result_limit: Option<usize>,
}

impl Default for MatchingConfig {
    fn default() -> Self {
        Self {
            scoring: ScoringWeights::default(),
            max_matched_texts: DEFAULT_MAX_MATCHED_TEXTS,
            match_text_width: 100,
            alert_text_width: 80,
            extractor_timeout_ms: 30_000,
            store_timeout_ms: 5_000,
            result_limit: None,
        }
    }
}

impl MatchingConfig {
    /// Load configuration from a JSON file; missing fields take their defaults
    pub fn load_from_file(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path)?;
        Self::from_json(&content)
    }

    pub fn from_json(json: &str) -> Result<Self, ConfigError> {
        let config: Self = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        self.scoring.validate().map_err(ConfigError::Invalid)?;
        if self.extractor_timeout_ms == 0 || self.store_timeout_ms == 0 {
            return Err(ConfigError::Invalid("timeouts must be positive".to_string()));
        }
        if self.result_limit == Some(0) {
            return Err(ConfigError::Invalid("result limit must be positive".to_string()));
        }
        Ok(())
    }

    fn display_limits(&self) -> DisplayLimits {
        DisplayLimits {
            max_matched_texts: self.max_matched_texts,
            match_text_width: self.match_text_width,
        }
    }
}

/// Terminal state of a matching query that did not fail
#[derive(Debug, Clone, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum MatchOutcome {
    /// No codes could be inferred; no store query was issued
    NoIdentifiableCodes,
    /// Codes were found but no trial has a matching inclusion criterion
    NoCandidates { families: Vec<CodeFamily> },
    /// Ranked trials, best first
    Ranked {
        families: Vec<CodeFamily>,
        trials: Vec<RankedTrial>,
    },
}

impl MatchOutcome {
    /// Machine-readable status, matching the serialized `status` tag
    pub fn status(&self) -> &'static str {
        match self {
            Self::NoIdentifiableCodes => "no_identifiable_codes",
            Self::NoCandidates { .. } => "no_candidates",
            Self::Ranked { .. } => "ranked",
        }
    }

    pub fn trials(&self) -> &[RankedTrial] {
        match self {
            Self::Ranked { trials, .. } => trials,
            _ => &[],
        }
    }

    pub fn families(&self) -> &[CodeFamily] {
        match self {
            Self::NoIdentifiableCodes => &[],
            Self::NoCandidates { families } | Self::Ranked { families, .. } => families,
        }
    }
}

/// Await a collaborator call, failing the query if it exceeds `limit`
pub(crate) async fn with_timeout<T, E, F>(
    operation: &'static str,
    limit: Duration,
    fut: F,
) -> Result<T, MatchError>
where
    F: Future<Output = Result<T, E>>,
    MatchError: From<E>,
{
    match tokio::time::timeout(limit, fut).await {
        Ok(result) => result.map_err(MatchError::from),
        Err(_) => {
            #[allow(clippy::cast_possible_truncation)] // Configured timeouts fit in u64
            let limit_ms = limit.as_millis() as u64;
            tracing::warn!("{} timed out after {} ms", operation, limit_ms);
            Err(MatchError::Timeout {
                operation,
                limit_ms,
            })
        }
    }
}

/// The main matching engine.
///
/// Each call is an independent pipeline: resolve families, collect and score
/// inclusion matches, audit exclusions, rank. Nothing is shared between calls.
pub struct MatchingEngine<'a> {
    store: &'a dyn CriteriaStore,
    extractor: &'a dyn CodeExtractor,
    /// Configuration including scoring weights and display bounds
    config: MatchingConfig,
}

impl<'a> MatchingEngine<'a> {
    /// Create a new matching engine with default configuration
    pub fn new(store: &'a dyn CriteriaStore, extractor: &'a dyn CodeExtractor) -> Self {
        Self::with_config(store, extractor, MatchingConfig::default())
    }

    /// Create a new matching engine with custom configuration
    pub fn with_config(
        store: &'a dyn CriteriaStore,
        extractor: &'a dyn CodeExtractor,
        config: MatchingConfig,
    ) -> Self {
        Self {
            store,
            extractor,
            config,
        }
    }

    pub fn config(&self) -> &MatchingConfig {
        &self.config
    }

    /// Match a free-text patient description.
    ///
    /// Extraction failures other than timeouts are treated as "no codes found".
    pub async fn match_description(&self, description: &str) -> Result<MatchOutcome, MatchError> {
        let description = validate_description(description)?;

        let codes = match with_timeout(
            "extract",
            Duration::from_millis(self.config.extractor_timeout_ms),
            self.extractor.extract(description),
        )
        .await
        {
            Ok(codes) => codes,
            Err(MatchError::Extraction(e)) => {
                tracing::warn!("Code extraction failed, treating as no codes: {}", e);
                CodeSet::new()
            }
            Err(e) => return Err(e),
        };

        tracing::info!("Extracted {} codes from description", codes.len());
        self.match_codes(&codes).await
    }

    /// Match an already extracted code set
    pub async fn match_codes(&self, codes: &CodeSet) -> Result<MatchOutcome, MatchError> {
        let families = resolve_families(codes);
        if families.is_empty() {
            tracing::info!("No identifiable codes; skipping store queries");
            return Ok(MatchOutcome::NoIdentifiableCodes);
        }

        let store_timeout = Duration::from_millis(self.config.store_timeout_ms);

        let collector = CandidateCollector::new(self.store, &self.config.scoring, store_timeout);
        let candidates = collector.collect(&families).await?;
        tracing::debug!(
            "Collected {} candidate trials from {} families",
            candidates.len(),
            families.len()
        );

        if candidates.is_empty() {
            return Ok(MatchOutcome::NoCandidates {
                families: families.into_iter().collect(),
            });
        }

        let auditor = SafetyAuditor::new(
            self.store,
            self.config.scoring.exclusion_penalty,
            self.config.alert_text_width,
            store_timeout,
        );
        let audited = auditor.audit(candidates, &families).await?;

        let mut trials = rank(audited, self.config.display_limits());
        if let Some(limit) = self.config.result_limit {
            trials.truncate(limit);
        }

        Ok(MatchOutcome::Ranked {
            families: families.into_iter().collect(),
            trials,
        })
    }
}
