//! Command-line interface for trial-matcher.
//!
//! This module implements the CLI using clap. Available commands:
//!
//! - **match**: Rank trials for a patient description or a list of codes
//! - **catalog**: List, show, search, or export trials from the criteria store
//! - **serve**: Start the HTTP matching API
//!
//! ## Usage
//!
//! ```text
//! # Match a free-text description
//! trial-matcher match "62 year old with breast cancer and hypertension"
//!
//! # Read the description from stdin
//! cat note.txt | trial-matcher match -
//!
//! # Skip extraction and match known codes
//! trial-matcher match --codes C50.911,I10 --format json
//!
//! # Browse the store
//! trial-matcher catalog search --condition "heart failure"
//!
//! # Start the API
//! trial-matcher serve --port 8080
//! ```

use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

use clap::{Parser, Subcommand};

use crate::extract::http::HttpExtractor;
use crate::extract::keyword::KeywordExtractor;
use crate::extract::CodeExtractor;
use crate::matching::engine::MatchingConfig;
use crate::store::memory::InMemoryStore;

/// Environment variable holding a bearer token for the extraction service
pub const EXTRACTOR_KEY_ENV: &str = "TRIAL_MATCHER_EXTRACTOR_KEY";

pub mod catalog;
pub mod match_cmd;

#[derive(Parser)]
#[command(name = "trial-matcher")]
#[command(version)]
#[command(about = "Match patient descriptions against clinical trial eligibility criteria")]
#[command(
    long_about = "trial-matcher ranks clinical trials for a patient.\n\nPatient codes are reduced to 3-character code families and compared against coded trial criteria:\n- Inclusion matches add a weight by family\n- Conflicting exclusions subtract a penalty and raise a safety alert\n- Trials with safety alerts always rank below trials without"
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// Enable verbose output
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Output format
    #[arg(short, long, global = true, default_value = "text")]
    pub format: OutputFormat,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Rank trials for a patient
    Match(match_cmd::MatchArgs),

    /// Browse the trial criteria store
    Catalog(catalog::CatalogArgs),

    /// Start the web server
    Serve(ServeArgs),
}

#[derive(clap::Args)]
pub struct ServeArgs {
    /// Port to listen on
    #[arg(short, long, default_value = "8080")]
    pub port: u16,

    /// Address to bind to
    #[arg(short, long, default_value = "127.0.0.1")]
    pub address: String,

    /// Open browser automatically
    #[arg(long)]
    pub open: bool,

    /// Path to custom trial store file
    #[arg(long)]
    pub store: Option<PathBuf>,

    /// Path to custom keyword lexicon file
    #[arg(long)]
    pub lexicon: Option<PathBuf>,

    /// URL of a code extraction service (replaces the keyword lexicon)
    #[arg(long)]
    pub extractor_url: Option<String>,

    /// Path to matching configuration file (JSON)
    #[arg(long)]
    pub config: Option<PathBuf>,
}

#[derive(Clone, Copy, Debug, clap::ValueEnum)]
pub enum OutputFormat {
    Text,
    Json,
    Tsv,
}

/// Load the store at `path`, or the embedded demonstration store
pub(crate) fn load_store(path: Option<&Path>) -> anyhow::Result<InMemoryStore> {
    let store = match path {
        Some(path) => InMemoryStore::load_from_file(path)?,
        None => InMemoryStore::load_embedded()?,
    };
    tracing::debug!("Loaded store with {} trials", store.len());
    Ok(store)
}

/// Load matching configuration, applying a result limit override from the command line
pub(crate) fn load_config(
    path: Option<&Path>,
    limit: Option<usize>,
) -> anyhow::Result<MatchingConfig> {
    let mut config = match path {
        Some(path) => MatchingConfig::load_from_file(path)?,
        None => MatchingConfig::default(),
    };
    if limit.is_some() {
        config.result_limit = limit;
    }
    config.validate()?;
    Ok(config)
}

/// Build the code extractor selected on the command line.
///
/// An extraction service URL takes precedence over a lexicon file; with neither,
/// the embedded keyword lexicon is used.
pub(crate) fn build_extractor(
    lexicon: Option<&Path>,
    extractor_url: Option<&str>,
    config: &MatchingConfig,
) -> anyhow::Result<Arc<dyn CodeExtractor>> {
    if let Some(url) = extractor_url {
        let mut extractor =
            HttpExtractor::new(url, Duration::from_millis(config.extractor_timeout_ms))?;
        if let Ok(key) = std::env::var(EXTRACTOR_KEY_ENV) {
            extractor = extractor.with_api_key(key);
        }
        tracing::debug!("Using extraction service at {}", url);
        return Ok(Arc::new(extractor));
    }

    let extractor = match lexicon {
        Some(path) => KeywordExtractor::load_from_file(path)?,
        None => KeywordExtractor::load_embedded()?,
    };
    tracing::debug!("Loaded lexicon with {} terms", extractor.len());
    Ok(Arc::new(extractor))
}
