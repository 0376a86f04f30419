use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use clap::{Parser, Subcommand};
use tracing::warn;

use showlist_etl::config::PipelineConfig;
use showlist_etl::logging;
use showlist_etl::pipeline::orchestrator::{self, PipelineOutcome, RunOptions};

#[derive(Parser)]
#[command(name = "showlist_etl")]
#[command(about = "ETL pipeline for hand-authored live music listings")]
#[command(version)]
struct Cli {
    /// Path to the TOML config file
    #[arg(long, global = true, default_value = "etl.toml")]
    config: String,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run the full pipeline and write all output artifacts
    Run {
        #[command(flatten)]
        overrides: Overrides,
    },
    /// Parse and normalize without writing artifacts, reporting diagnostics
    Validate {
        #[command(flatten)]
        overrides: Overrides,
    },
    /// Run the pipeline and print summary statistics only
    Stats {
        #[command(flatten)]
        overrides: Overrides,
    },
}

#[derive(clap::Args)]
struct Overrides {
    /// Events source file (overrides config)
    #[arg(long)]
    events: Option<String>,
    /// Venues source file (overrides config)
    #[arg(long)]
    venues: Option<String>,
    /// Output directory (overrides config)
    #[arg(long)]
    output: Option<String>,
    /// Reference instant (RFC3339) for year inference and upcoming counts
    #[arg(long)]
    as_of: Option<String>,
}

impl Overrides {
    fn apply(&self, config: &mut PipelineConfig) {
        if let Some(events) = &self.events {
            config.events_file = events.clone();
        }
        if let Some(venues) = &self.venues {
            config.venues_file = venues.clone();
        }
        if let Some(output) = &self.output {
            config.output_dir = output.clone();
        }
    }

    fn as_of(&self) -> Result<Option<DateTime<Utc>>> {
        self.as_of
            .as_deref()
            .map(|raw| {
                DateTime::parse_from_rfc3339(raw)
                    .map(|t| t.with_timezone(&Utc))
                    .with_context(|| format!("invalid --as-of instant '{raw}'"))
            })
            .transpose()
    }
}

fn print_outcome(outcome: &PipelineOutcome, verbose_diagnostics: bool) {
    println!("\n📊 Pipeline results:");
    println!("   Events:   {}", outcome.stats.total_events);
    println!("   Artists:  {}", outcome.stats.total_artists);
    println!("   Venues:   {}", outcome.stats.total_venues);
    println!("   Chunks:   {}", outcome.stats.total_chunks);
    if let Some(range) = &outcome.stats.date_range {
        println!("   Range:    {} .. {}", range.start, range.end);
    }
    println!("   Errors:   {}", outcome.stats.validation_errors);
    println!("   Warnings: {}", outcome.stats.validation_warnings);

    if verbose_diagnostics {
        if !outcome.errors.is_empty() {
            println!("\n❌ Rejected records:");
            for error in &outcome.errors {
                match error.line_number {
                    Some(line) => println!("   - line {}: {}", line, error.message),
                    None => println!("   - {}", error.message),
                }
            }
        }
        if !outcome.warnings.is_empty() {
            println!("\n⚠️  Flagged records:");
            for warning in &outcome.warnings {
                match warning.line_number {
                    Some(line) => println!("   - line {}: {}", line, warning.message),
                    None => println!("   - {}", warning.message),
                }
            }
        }
    } else if !outcome.warnings.is_empty() {
        warn!("{} records flagged during run", outcome.warnings.len());
    }
}

fn main() -> Result<()> {
    logging::init_logging();

    let cli = Cli::parse();
    let mut config = PipelineConfig::load_or_default(&cli.config);

    let outcome = match &cli.command {
        Commands::Run { overrides } => {
            println!("🚀 Running full ETL pipeline...");
            overrides.apply(&mut config);
            let options = RunOptions {
                as_of: overrides.as_of()?,
                skip_write: false,
            };
            let outcome = orchestrator::run(&config, &options);
            print_outcome(&outcome, true);
            if outcome.success {
                println!("\n✅ Artifacts written to {}", config.output_dir);
            }
            outcome
        }
        Commands::Validate { overrides } => {
            println!("🔎 Validating source files...");
            overrides.apply(&mut config);
            let options = RunOptions {
                as_of: overrides.as_of()?,
                skip_write: true,
            };
            let outcome = orchestrator::run(&config, &options);
            print_outcome(&outcome, true);
            outcome
        }
        Commands::Stats { overrides } => {
            println!("📈 Computing dataset statistics...");
            overrides.apply(&mut config);
            let options = RunOptions {
                as_of: overrides.as_of()?,
                skip_write: true,
            };
            let outcome = orchestrator::run(&config, &options);
            print_outcome(&outcome, false);
            outcome
        }
    };

    if !outcome.success {
        println!("\n❌ Run failed:");
        for error in &outcome.errors {
            println!("   - {}", error.message);
        }
        std::process::exit(1);
    }
    Ok(())
}
