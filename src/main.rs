use clap::{Parser, Subcommand};
use std::path::{Path, PathBuf};
use tracing_subscriber::EnvFilter;

mod config;
mod error;
mod input;
mod models;
mod output;
mod pricing;
mod providers;
mod runner;
mod scoring;
mod summary;

use crate::config::Config;
use crate::output::OutputFormat;
use crate::runner::Runner;

/// Audit document Q&A evaluation across several language models
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Verbose output - debug logging for every model call
    #[arg(short, long, global = true)]
    verbose: bool,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Ask every configured model every question and score the answers
    Run {
        /// Questions JSON grouped by report
        #[arg(short, long)]
        questions: PathBuf,

        /// Document the questions are asked against
        #[arg(short, long)]
        document: PathBuf,

        /// Path to a TOML configuration file (built-in models when omitted)
        #[arg(short, long)]
        config: Option<PathBuf>,

        /// Where to store the detailed JSON results
        #[arg(long)]
        json_out: Option<PathBuf>,

        /// Where to store the per-report CSV summary
        #[arg(long)]
        csv_out: Option<PathBuf>,

        /// Where to store a flat per-question CSV export
        #[arg(long)]
        detail_csv: Option<PathBuf>,

        /// Output format: plain or json
        #[arg(short, long, default_value = "plain")]
        output: OutputFormat,

        /// Maximum number of model calls in flight (overrides the config)
        #[arg(long)]
        concurrency: Option<usize>,
    },

    /// Convert a question CSV into the grouped questions JSON
    Import {
        /// CSV with `Report #`, `#`, `Question` and `Answer` columns
        #[arg(long)]
        csv: PathBuf,

        /// Output JSON path (defaults to the CSV path with a .json extension)
        #[arg(long)]
        out: Option<PathBuf>,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    match cli.command {
        Commands::Run {
            questions,
            document,
            config,
            json_out,
            csv_out,
            detail_csv,
            output,
            concurrency,
        } => {
            let json_out = json_out.unwrap_or_else(|| default_json_path(&questions));
            run(RunArgs {
                questions,
                document,
                config,
                json_out,
                csv_out,
                detail_csv,
                output,
                concurrency,
            })
            .await
        }
        Commands::Import { csv, out } => {
            let out = out.unwrap_or_else(|| csv.with_extension("json"));
            let set = input::import_questions_csv(&csv)?;
            input::write_questions_json(&set, &out)
        }
    }
}

fn init_logging(verbose: bool) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| {
        if verbose {
            EnvFilter::new("audit_eval=debug,info")
        } else {
            EnvFilter::new("audit_eval=info,warn")
        }
    });

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

/// `<questions dir>/models/model_comparison_responses.json`
fn default_json_path(questions: &Path) -> PathBuf {
    questions
        .parent()
        .unwrap_or_else(|| Path::new(""))
        .join("models")
        .join("model_comparison_responses.json")
}

struct RunArgs {
    questions: PathBuf,
    document: PathBuf,
    config: Option<PathBuf>,
    json_out: PathBuf,
    csv_out: Option<PathBuf>,
    detail_csv: Option<PathBuf>,
    output: OutputFormat,
    concurrency: Option<usize>,
}

async fn run(args: RunArgs) -> anyhow::Result<()> {
    if let Err(e) = dotenvy::dotenv() {
        tracing::debug!("No .env file loaded: {}", e);
    }

    let mut config = match &args.config {
        Some(path) => Config::from_file(path)?,
        None => Config::default(),
    };
    if let Some(concurrency) = args.concurrency {
        config.concurrency = concurrency;
    }

    let adapters = providers::create_adapters(&config)?;
    let runner = Runner::new(adapters, config.concurrency)?;
    let models = runner.models();

    let reports = input::load_questions(&args.questions)?;
    let document = input::load_document(&args.document)?;

    let results = runner.run_reports(&document, &reports).await;

    let summaries = results
        .iter()
        .filter(|(_, records)| !records.is_empty())
        .map(|(name, records)| summary::summarize(name, records, &models))
        .collect::<Result<Vec<_>, _>>()?;

    output::write_json_results(&results, &args.json_out)?;
    if let Some(path) = &args.csv_out {
        output::write_file(path, &output::render_summary_csv(&results, &summaries)?)?;
    }
    if let Some(path) = &args.detail_csv {
        output::write_file(path, &output::render_detail_csv(&results, &models)?)?;
    }

    output::print_results(&results, &summaries, &models, args.output)
}
