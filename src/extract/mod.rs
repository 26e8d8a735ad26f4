//! Medical code extraction from free-text patient descriptions.
//!
//! Extraction is an external collaborator: the engine only sees the
//! [`CodeExtractor`] trait, which turns text into a [`CodeSet`]. Implementations:
//!
//! - [`StaticExtractor`]: always returns the same codes (tests, `--codes`)
//! - [`keyword::KeywordExtractor`]: deterministic term lexicon
//! - [`http::HttpExtractor`]: remote extraction service
//!
//! [`CodeSet`]: crate::core::code::CodeSet

pub mod http;
pub mod keyword;

use async_trait::async_trait;
use thiserror::Error;

use crate::core::code::CodeSet;

#[derive(Debug, Error)]
pub enum ExtractError {
    #[error("extraction service request failed: {0}")]
    Request(#[from] reqwest::Error),

    #[error("extraction service returned status {status}")]
    HttpStatus { status: u16 },

    #[error("failed to read lexicon: {0}")]
    Read(#[from] std::io::Error),

    #[error("failed to parse lexicon: {0}")]
    Parse(#[from] serde_json::Error),

    #[error("invalid lexicon term '{term}': {source}")]
    InvalidTerm {
        term: String,
        #[source]
        source: regex::Error,
    },
}

/// Turns a patient description into medical codes.
///
/// May return an empty set. Implementations should not retry on the engine's behalf.
#[async_trait]
pub trait CodeExtractor: Send + Sync {
    async fn extract(&self, text: &str) -> Result<CodeSet, ExtractError>;
}

/// Extractor returning a fixed code set regardless of input
#[derive(Debug, Clone, Default)]
pub struct StaticExtractor {
    codes: CodeSet,
}

impl StaticExtractor {
    pub fn new<I, S>(codes: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            codes: codes.into_iter().map(Into::into).collect(),
        }
    }
}

#[async_trait]
impl CodeExtractor for StaticExtractor {
    async fn extract(&self, _text: &str) -> Result<CodeSet, ExtractError> {
        Ok(self.codes.clone())
    }
}
