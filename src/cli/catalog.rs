use std::path::PathBuf;
use std::time::Duration;

use clap::{Args, Subcommand};

use crate::cli::{build_extractor, load_config, load_store, OutputFormat};
use crate::core::trial::Criterion;
use crate::core::types::TrialId;
use crate::store::stats::CriteriaFilter;
use crate::utils::text::{tsv_field, truncate_chars};

#[derive(Args)]
pub struct CatalogArgs {
    #[command(subcommand)]
    pub command: CatalogCommands,
}

#[derive(Subcommand)]
pub enum CatalogCommands {
    /// List all trials in the store
    List {
        /// Path to custom trial store file
        #[arg(long)]
        store: Option<PathBuf>,
    },

    /// Show a trial and its criteria
    Show {
        /// Trial ID (e.g., "NCT90000001")
        #[arg(required = true)]
        id: String,

        /// Path to custom trial store file
        #[arg(long)]
        store: Option<PathBuf>,
    },

    /// Summarize store contents and coding coverage
    Stats {
        /// Path to custom trial store file
        #[arg(long)]
        store: Option<PathBuf>,
    },

    /// Browse criteria by trial and condition
    Search {
        /// Restrict to one trial ID
        #[arg(long)]
        trial: Option<String>,

        /// Case-insensitive substring of the criterion entity or code
        #[arg(long)]
        condition: Option<String>,

        /// Patient age in years; hides trials whose Age criteria exclude it
        #[arg(long)]
        age: Option<u32>,

        /// Path to custom trial store file
        #[arg(long)]
        store: Option<PathBuf>,
    },

    /// Code uncoded Condition, Medication and Other criteria, and write the result
    Enrich {
        /// Output file path
        #[arg(required = true)]
        output: PathBuf,

        /// Path to custom trial store file to enrich (defaults to embedded)
        #[arg(long)]
        store: Option<PathBuf>,

        /// Path to a keyword lexicon file (defaults to embedded)
        #[arg(long)]
        lexicon: Option<PathBuf>,

        /// URL of a code extraction service (replaces the keyword lexicon)
        #[arg(long, conflicts_with = "lexicon")]
        extractor_url: Option<String>,

        /// Path to matching configuration file (JSON), for the extractor timeout
        #[arg(long)]
        config: Option<PathBuf>,
    },

    /// Export the store to a file
    Export {
        /// Output file path
        #[arg(required = true)]
        output: PathBuf,

        /// Path to custom trial store file to export (defaults to embedded)
        #[arg(long)]
        store: Option<PathBuf>,
    },
}

/// Execute catalog subcommand
///
/// # Errors
///
/// Returns an error if the store cannot be loaded, a trial is not found, or
/// the export cannot be written.
pub fn run(args: CatalogArgs, format: OutputFormat, verbose: bool) -> anyhow::Result<()> {
    match args.command {
        CatalogCommands::List { store } => run_list(store, format, verbose),
        CatalogCommands::Show { id, store } => run_show(&id, store, format),
        CatalogCommands::Stats { store } => run_stats(store, format),
        CatalogCommands::Search {
            trial,
            condition,
            age,
            store,
        } => {
            let filter = CriteriaFilter {
                trial_id: trial.map(TrialId::new),
                condition,
                age,
            };
            run_search(&filter, store, format)
        }
        CatalogCommands::Export { output, store } => run_export(output, store),
        CatalogCommands::Enrich {
            output,
            store,
            lexicon,
            extractor_url,
            config,
        } => run_enrich(&EnrichArgs {
            output,
            store,
            lexicon,
            extractor_url,
            config,
        }),
    }
}

fn run_list(store_path: Option<PathBuf>, format: OutputFormat, verbose: bool) -> anyhow::Result<()> {
    let store = load_store(store_path.as_deref())?;

    if verbose {
        eprintln!("Loaded store with {} trials", store.len());
    }

    match format {
        OutputFormat::Text => {
            let id_width = store
                .trials()
                .iter()
                .map(|t| t.nct_id.as_str().len())
                .max()
                .unwrap_or(2)
                .max(2);

            println!("Trial Store ({} trials)\n", store.len());
            println!(
                "{:<id_w$} {:<50} {:>9} {:>9}",
                "ID",
                "Title",
                "Inclusion",
                "Exclusion",
                id_w = id_width
            );
            println!("{}", "-".repeat(id_width + 50 + 9 + 9 + 3));
            for trial in store.trials() {
                println!(
                    "{:<id_w$} {:<50} {:>9} {:>9}",
                    trial.nct_id,
                    truncate_chars(&trial.title, 47),
                    trial.inclusion_count(),
                    trial.exclusion_count(),
                    id_w = id_width
                );
            }
        }
        OutputFormat::Json => {
            let output: Vec<serde_json::Value> = store
                .trials()
                .iter()
                .map(|t| {
                    serde_json::json!({
                        "nct_id": t.nct_id,
                        "title": t.title,
                        "inclusion_count": t.inclusion_count(),
                        "exclusion_count": t.exclusion_count(),
                    })
                })
                .collect();
            println!("{}", serde_json::to_string_pretty(&output)?);
        }
        OutputFormat::Tsv => {
            println!("nct_id\ttitle\tinclusion_count\texclusion_count");
            for t in store.trials() {
                println!(
                    "{}\t{}\t{}\t{}",
                    t.nct_id,
                    tsv_field(&t.title),
                    t.inclusion_count(),
                    t.exclusion_count()
                );
            }
        }
    }

    Ok(())
}

fn run_show(id: &str, store_path: Option<PathBuf>, format: OutputFormat) -> anyhow::Result<()> {
    let store = load_store(store_path.as_deref())?;

    let trial = store
        .get(&TrialId::new(id))
        .ok_or_else(|| anyhow::anyhow!("Trial '{}' not found", id))?;

    match format {
        OutputFormat::Text => {
            println!("Trial: {}\n", trial.title);
            println!("ID:        {}", trial.nct_id);
            println!("Inclusion: {}", trial.inclusion_count());
            println!("Exclusion: {}", trial.exclusion_count());

            println!("\nCriteria:");
            println!("{:<10} {:<11} {:<9} Text", "Type", "Category", "Code");
            println!("{}", "-".repeat(80));
            for criterion in &trial.criteria {
                println!(
                    "{:<10} {:<11} {:<9} {}",
                    criterion.kind.to_string(),
                    criterion.category.to_string(),
                    criterion.code.as_deref().unwrap_or("-"),
                    criterion.text
                );
            }
        }
        OutputFormat::Json => {
            println!("{}", serde_json::to_string_pretty(&trial)?);
        }
        OutputFormat::Tsv => {
            print_criteria_tsv(trial.criteria.iter().map(|c| (&trial.nct_id, c)));
        }
    }

    Ok(())
}

fn run_stats(store_path: Option<PathBuf>, format: OutputFormat) -> anyhow::Result<()> {
    let store = load_store(store_path.as_deref())?;
    let stats = store.stats();

    match format {
        OutputFormat::Text => {
            println!("Trials:   {}", stats.trial_count);
            println!("Criteria: {}", stats.criteria_count);

            println!("\nCriteria by category:");
            for (category, count) in &stats.by_category {
                println!("  {:<12} {:>5}", category.to_string(), count);
            }

            println!(
                "\nCondition coding: {}/{} ({:.0}%)",
                stats.condition_coded,
                stats.condition_total,
                stats.coding_coverage() * 100.0
            );
            if stats.condition_coded < stats.condition_total {
                println!("  Uncoded condition criteria cannot be matched or audited.");
            }

            println!("\nInclusion/exclusion balance:");
            for balance in &stats.per_trial {
                println!(
                    "  {:<14} {:>3} inclusion {:>3} exclusion",
                    balance.nct_id.as_str(),
                    balance.inclusion,
                    balance.exclusion
                );
            }
        }
        OutputFormat::Json => {
            let mut json = serde_json::to_value(&stats)?;
            json["coding_coverage"] = serde_json::json!(stats.coding_coverage());
            println!("{}", serde_json::to_string_pretty(&json)?);
        }
        OutputFormat::Tsv => {
            println!("nct_id\tinclusion\texclusion");
            for balance in &stats.per_trial {
                println!(
                    "{}\t{}\t{}",
                    balance.nct_id, balance.inclusion, balance.exclusion
                );
            }
        }
    }

    Ok(())
}

fn run_search(
    filter: &CriteriaFilter,
    store_path: Option<PathBuf>,
    format: OutputFormat,
) -> anyhow::Result<()> {
    let store = load_store(store_path.as_deref())?;
    let rows = store.search(filter);

    match format {
        OutputFormat::Text => {
            if rows.is_empty() {
                println!("No criteria match the filter.");
                return Ok(());
            }
            println!("{} matching criteria\n", rows.len());
            for (trial, criterion) in &rows {
                println!(
                    "{} [{}] {} {}: {}",
                    trial.nct_id,
                    criterion.kind,
                    criterion.code.as_deref().unwrap_or("-"),
                    criterion.entity.as_deref().unwrap_or(""),
                    truncate_chars(&criterion.text, 80)
                );
            }
        }
        OutputFormat::Json => {
            let output: Vec<serde_json::Value> = rows
                .iter()
                .map(|(trial, criterion)| {
                    serde_json::json!({
                        "nct_id": trial.nct_id,
                        "criterion": criterion,
                    })
                })
                .collect();
            println!("{}", serde_json::to_string_pretty(&output)?);
        }
        OutputFormat::Tsv => {
            print_criteria_tsv(rows.iter().map(|(t, c)| (&t.nct_id, *c)));
        }
    }

    Ok(())
}

fn print_criteria_tsv<'a>(rows: impl Iterator<Item = (&'a TrialId, &'a Criterion)>) {
    println!("nct_id\ttype\tcategory\tentity\tcode\ttext");
    for (id, c) in rows {
        println!("{}", criterion_tsv_row(id, c));
    }
}

fn criterion_tsv_row(id: &TrialId, c: &Criterion) -> String {
    format!(
        "{}\t{}\t{}\t{}\t{}\t{}",
        id,
        c.kind,
        c.category,
        tsv_field(c.entity.as_deref().unwrap_or("")),
        c.code.as_deref().unwrap_or(""),
        tsv_field(&c.text)
    )
}

fn run_export(output: PathBuf, store_path: Option<PathBuf>) -> anyhow::Result<()> {
    let store = load_store(store_path.as_deref())?;

    let json = store.to_json()?;
    std::fs::write(&output, json)?;

    println!("Exported {} trials to {}", store.len(), output.display());

    Ok(())
}

struct EnrichArgs {
    output: PathBuf,
    store: Option<PathBuf>,
    lexicon: Option<PathBuf>,
    extractor_url: Option<String>,
    config: Option<PathBuf>,
}

fn run_enrich(args: &EnrichArgs) -> anyhow::Result<()> {
    let mut store = load_store(args.store.as_deref())?;
    let config = load_config(args.config.as_deref(), None)?;
    let extractor = build_extractor(
        args.lexicon.as_deref(),
        args.extractor_url.as_deref(),
        &config,
    )?;

    let rt = tokio::runtime::Runtime::new()?;
    let report = rt.block_on(store.enrich(
        extractor.as_ref(),
        Duration::from_millis(config.extractor_timeout_ms),
    ));

    std::fs::write(&args.output, store.to_json()?)?;

    println!(
        "Coded {} of {} uncoded criteria ({} extraction failures)",
        report.coded, report.examined, report.failed
    );
    println!("Wrote {} trials to {}", store.len(), args.output.display());

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::types::Category;

    #[test]
    fn test_criterion_tsv_row_flattens_multiline_text() {
        let c = Criterion::exclusion(Category::Condition, "Prior cardiac disease:\n\t- heart failure")
            .with_code("I50.9");
        let row = criterion_tsv_row(&TrialId::new("NCT1"), &c);

        assert!(!row.contains('\n'));
        assert_eq!(row.split('\t').count(), 6);
        assert!(row.ends_with("I50.9\tPrior cardiac disease:  - heart failure"));
    }
}
