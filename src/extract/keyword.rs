use async_trait::async_trait;
use regex::{Regex, RegexBuilder};
use serde::{Deserialize, Serialize};
use std::path::Path;

use super::{CodeExtractor, ExtractError};
use crate::core::code::CodeSet;

/// A lexicon term and the codes it implies
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LexiconEntry {
    pub term: String,
    pub codes: Vec<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LexiconData {
    pub version: String,
    pub entries: Vec<LexiconEntry>,
}

/// Deterministic extractor matching lexicon terms on word boundaries, ignoring case
#[derive(Debug)]
pub struct KeywordExtractor {
    rules: Vec<(Regex, Vec<String>)>,
}

impl KeywordExtractor {
    pub fn new(entries: Vec<LexiconEntry>) -> Result<Self, ExtractError> {
        let rules = entries
            .into_iter()
            .filter(|e| !e.term.trim().is_empty())
            .map(|entry| {
                let regex = RegexBuilder::new(&term_pattern(entry.term.trim()))
                    .case_insensitive(true)
                    .build()
                    .map_err(|source| ExtractError::InvalidTerm {
                        term: entry.term.clone(),
                        source,
                    })?;
                Ok((regex, entry.codes))
            })
            .collect::<Result<Vec<_>, ExtractError>>()?;

        Ok(Self { rules })
    }

    /// Load the embedded default lexicon
    pub fn load_embedded() -> Result<Self, ExtractError> {
        // Validated at compile time by build.rs
        const EMBEDDED_LEXICON: &str = include_str!("../../data/lexicon.json");
        Self::from_json(EMBEDDED_LEXICON)
    }

    pub fn load_from_file(path: &Path) -> Result<Self, ExtractError> {
        let content = std::fs::read_to_string(path)?;
        Self::from_json(&content)
    }

    pub fn from_json(json: &str) -> Result<Self, ExtractError> {
        let data: LexiconData = serde_json::from_str(json)?;
        Self::new(data.entries)
    }

    /// Codes for every term present in `text`
    #[must_use]
    pub fn extract_sync(&self, text: &str) -> CodeSet {
        self.rules
            .iter()
            .filter(|(regex, _)| regex.is_match(text))
            .flat_map(|(_, codes)| codes.iter().cloned())
            .collect()
    }

    pub fn len(&self) -> usize {
        self.rules.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rules.is_empty()
    }
}

/// Escaped pattern for a term, anchored on word boundaries where the term has word edges
fn term_pattern(term: &str) -> String {
    let is_word = |c: char| c.is_alphanumeric() || c == '_';
    let start = if term.chars().next().is_some_and(is_word) { r"\b" } else { "" };
    let end = if term.chars().last().is_some_and(is_word) { r"\b" } else { "" };
    format!("{start}{}{end}", regex::escape(term))
}

#[async_trait]
impl CodeExtractor for KeywordExtractor {
    async fn extract(&self, text: &str) -> Result<CodeSet, ExtractError> {
        let codes = self.extract_sync(text);
        tracing::debug!("Keyword extractor found {} codes", codes.len());
        Ok(codes)
    }
}
