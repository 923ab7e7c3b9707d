use std::path::PathBuf;

use anyhow::Context;
use clap::{Parser, Subcommand};
use tracing::info;
use tracing_subscriber::EnvFilter;

mod batch;
mod cohort;
mod completion;
mod config;
mod dates;
mod error;
mod ingest;
mod models;
mod normalize;
mod pipeline;
mod report;
mod schema;

use config::RunConfig;

#[derive(Parser)]
#[command(name = "cohort-completion-report")]
#[command(about = "Course completion and start-month cohort reports from learner activity exports", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Validate, process and summarize a full batch of exports
    Process {
        #[arg(long, default_value = "data_files")]
        input: PathBuf,
        #[arg(long, default_value = "output")]
        out: PathBuf,
        #[arg(long, default_value = config::DEFAULT_PREFIX)]
        prefix: String,
        /// Earliest start date to include (inclusive)
        #[arg(long, requires = "to")]
        from: Option<String>,
        /// Latest start date to include (inclusive)
        #[arg(long, requires = "from")]
        to: Option<String>,
    },
    /// Check batch composition and every header without writing output
    Validate {
        #[arg(long, default_value = "data_files")]
        input: PathBuf,
        #[arg(long, default_value = config::DEFAULT_PREFIX)]
        prefix: String,
    },
    /// Show the start-date range found across the exports
    Dates {
        #[arg(long, default_value = "data_files")]
        input: PathBuf,
        #[arg(long, default_value = config::DEFAULT_PREFIX)]
        prefix: String,
    },
}

fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    let cli = Cli::parse();

    match cli.command {
        Commands::Process {
            input,
            out,
            prefix,
            from,
            to,
        } => {
            let run_config = RunConfig {
                prefix,
                filter: config::parse_filter(from.as_deref(), to.as_deref())?,
                ..RunConfig::new(input, out)
            };

            let report = pipeline::run(&run_config)?;
            let (json_path, md_path) = report::write_outputs(&report, &run_config.output_dir)?;

            println!(
                "Processed {} datasets ({} rejected).",
                report.datasets.len(),
                report.rejected.len()
            );
            for summary in &report.datasets {
                println!(
                    "- {}: {} users, {} started, {} at 100%",
                    summary.language,
                    summary.total_rows,
                    summary.started_with_completion,
                    summary.completed_100
                );
            }
            for rejected in &report.rejected {
                println!("- {} failed validation: {}", rejected.source_file, rejected.reason);
            }
            println!("Summary written to {} and {}.", json_path.display(), md_path.display());
            println!("Processed CSVs are in {}.", run_config.processed_dir().display());
        }
        Commands::Validate { input, prefix } => {
            let run_config = RunConfig {
                prefix,
                ..RunConfig::new(input, PathBuf::new())
            };

            let files = batch::discover(&run_config.input_dir, &run_config.prefix)?;
            batch::check_composition(&files, &run_config.languages)?;
            info!(files = files.len(), "batch composition accepted");

            for file in &files {
                let dataset = ingest::read_dataset(&file.path)?;
                match run_config.schema.validate(&dataset.header) {
                    Ok(_) => println!("✓ {} ({} rows)", file.file_name, dataset.rows.len()),
                    Err(err) => println!("✗ {}: {}", file.file_name, err),
                }
            }
        }
        Commands::Dates { input, prefix } => {
            let run_config = RunConfig {
                prefix,
                ..RunConfig::new(input, PathBuf::new())
            };
            let files = batch::discover(&run_config.input_dir, &run_config.prefix)?;

            let mut all_dates = Vec::new();
            for file in &files {
                let found = ingest::scan_start_dates(&file.path, run_config.schema.start_date_column)
                    .with_context(|| format!("failed to scan {}", file.file_name))?;
                info!(file = %file.file_name, dates = found.len(), "scanned start dates");
                all_dates.extend(found);
            }

            print!("{}", report::build_date_preview(&all_dates));
        }
    }

    Ok(())
}
