use std::io::{self, Read};
use std::path::PathBuf;
use std::sync::Arc;

use clap::Args;

use crate::cli::{build_extractor, load_config, load_store, OutputFormat};
use crate::core::code::CodeFamily;
use crate::extract::{CodeExtractor, StaticExtractor};
use crate::matching::engine::{MatchOutcome, MatchingEngine};
use crate::matching::ranking::RankedTrial;
use crate::utils::text::tsv_field;
use crate::utils::validation::parse_code_list;

#[derive(Args)]
pub struct MatchArgs {
    /// Patient description. Use '-' to read it from stdin
    #[arg(required_unless_present = "codes")]
    pub description: Option<String>,

    /// Comma-separated medical codes (skips extraction)
    #[arg(long, conflicts_with_all = ["lexicon", "extractor_url"])]
    pub codes: Option<String>,

    /// Number of trials to show
    #[arg(short = 'n', long)]
    pub limit: Option<usize>,

    /// Path to custom trial store file
    #[arg(long)]
    pub store: Option<PathBuf>,

    /// Path to custom keyword lexicon file
    #[arg(long)]
    pub lexicon: Option<PathBuf>,

    /// URL of a code extraction service
    #[arg(long)]
    pub extractor_url: Option<String>,

    /// Path to matching configuration file (JSON)
    #[arg(long)]
    pub config: Option<PathBuf>,
}

/// Execute match subcommand
///
/// # Errors
///
/// Returns an error if inputs cannot be loaded, the input is invalid, or a
/// store or extractor call fails.
#[allow(clippy::needless_pass_by_value)] // CLI entry point, values from clap
pub fn run(args: MatchArgs, format: OutputFormat, verbose: bool) -> anyhow::Result<()> {
    let store = load_store(args.store.as_deref())?;
    let config = load_config(args.config.as_deref(), args.limit)?;

    if verbose {
        eprintln!("Loaded store with {} trials", store.len());
    }

    let rt = tokio::runtime::Runtime::new()?;
    let outcome = if let Some(codes) = &args.codes {
        let codes = parse_code_list(codes)?;
        let extractor = StaticExtractor::default();
        let engine = MatchingEngine::with_config(&store, &extractor, config);
        rt.block_on(engine.match_codes(&codes))?
    } else {
        let description = read_description(args.description.as_deref())?;
        let extractor: Arc<dyn CodeExtractor> =
            build_extractor(args.lexicon.as_deref(), args.extractor_url.as_deref(), &config)?;
        let engine = MatchingEngine::with_config(&store, extractor.as_ref(), config);
        rt.block_on(engine.match_description(&description))?
    };

    match format {
        OutputFormat::Text => print_text_results(&outcome, verbose),
        OutputFormat::Json => println!("{}", serde_json::to_string_pretty(&outcome)?),
        OutputFormat::Tsv => print_tsv_results(outcome.trials()),
    }

    Ok(())
}

fn read_description(arg: Option<&str>) -> anyhow::Result<String> {
    match arg {
        Some("-") => {
            let mut buffer = String::new();
            io::stdin().read_to_string(&mut buffer)?;
            Ok(buffer)
        }
        Some(text) => Ok(text.to_string()),
        None => anyhow::bail!("a description or --codes is required"),
    }
}

fn print_text_results(outcome: &MatchOutcome, verbose: bool) {
    match outcome {
        MatchOutcome::NoIdentifiableCodes => {
            println!("No identifiable medical codes found in the description.");
            return;
        }
        MatchOutcome::NoCandidates { families } => {
            println!("Code families: {}", join_families(families));
            println!("No trials have inclusion criteria matching these families.");
            return;
        }
        MatchOutcome::Ranked { families, .. } => {
            println!("Code families: {}", join_families(families));
        }
    }

    for (i, trial) in outcome.trials().iter().enumerate() {
        if i > 0 {
            println!("\n{}", "─".repeat(60));
        }

        let flag = if trial.is_conflicted() { " [SAFETY ALERT]" } else { "" };
        println!("\n#{} {}{}", i + 1, trial.title, flag);
        println!("   ID: {}", trial.nct_id);
        println!("   Score: {}", trial.score);

        if !trial.matched_texts.is_empty() {
            println!("\n   Matched inclusion criteria:");
            for text in &trial.matched_texts {
                println!("   - {text}");
            }
            let hidden = trial.matched_total - trial.matched_texts.len();
            if hidden > 0 {
                println!("   ... and {hidden} more");
            }
        }

        if !trial.alerts.is_empty() {
            println!("\n   Alerts:");
            for alert in &trial.alerts {
                println!("   ! {alert}");
            }
        }
    }

    if verbose {
        let conflicted = outcome.trials().iter().filter(|t| t.is_conflicted()).count();
        eprintln!(
            "\n{} trials ranked, {} with safety alerts",
            outcome.trials().len(),
            conflicted
        );
    }
}

fn print_tsv_results(trials: &[RankedTrial]) {
    println!("rank\tnct_id\ttitle\tscore\tmatched_count\talert_count\talerts");
    for (i, trial) in trials.iter().enumerate() {
        println!("{}", tsv_row(i + 1, trial));
    }
}

fn tsv_row(rank: usize, trial: &RankedTrial) -> String {
    format!(
        "{}\t{}\t{}\t{}\t{}\t{}\t{}",
        rank,
        trial.nct_id,
        tsv_field(&trial.title),
        trial.score,
        trial.matched_total,
        trial.alerts.len(),
        tsv_field(&trial.alerts.join("; "))
    )
}

fn join_families(families: &[CodeFamily]) -> String {
    families
        .iter()
        .map(CodeFamily::as_str)
        .collect::<Vec<_>>()
        .join(", ")
}
