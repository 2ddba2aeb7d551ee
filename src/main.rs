//! Prop Portfolio - Main Entry Point
//!
//! Scores candidate prop wagers and allocates a risk-limited stake budget
//! across them, from a local JSON file or a live prop board.

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use prop_portfolio::config::Config;
use prop_portfolio::error::ProviderError;
use prop_portfolio::pipeline::{BatchReport, ExplanationGenerator, Pipeline};
use prop_portfolio::provider::{CandidateProvider, PropApiClient, StaticSource};
use serde::Serialize;
use tracing::{info, warn, Level};
use tracing_subscriber::fmt::format::FmtSpan;
use tracing_subscriber::EnvFilter;

/// Prop Portfolio CLI
#[derive(Parser)]
#[command(name = "prop-portfolio")]
#[command(version, about = "Risk-limited portfolio allocation across prop wagers")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Analyze candidates from a local JSON file
    Analyze {
        /// Path to JSON file containing a candidate array
        #[arg(short, long)]
        input: String,

        /// Restrict to one sport (case insensitive)
        #[arg(short, long)]
        sport: Option<String>,

        /// Minimum confidence threshold (overrides config)
        #[arg(short, long)]
        min_confidence: Option<f64>,

        /// Include explanation records in the output
        #[arg(short, long)]
        explain: bool,

        /// Emit the full report as JSON instead of a summary
        #[arg(short, long)]
        json: bool,
    },

    /// Fetch candidates from the configured prop board and analyze them
    Fetch {
        /// Restrict to one sport (case insensitive)
        #[arg(short, long)]
        sport: Option<String>,

        /// Minimum confidence threshold (overrides config)
        #[arg(short, long)]
        min_confidence: Option<f64>,

        /// Include explanation records in the output
        #[arg(short, long)]
        explain: bool,

        /// Emit the full report as JSON instead of a summary
        #[arg(short, long)]
        json: bool,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    init_logging()?;

    let config = Config::load()?;
    config.validate()?;

    match cli.command {
        Commands::Analyze {
            input,
            sport,
            min_confidence,
            explain,
            json,
        } => {
            let raw = std::fs::read_to_string(&input)
                .with_context(|| format!("Failed to read candidate file {input}"))?;
            let source = StaticSource::from_json(&raw)
                .with_context(|| format!("Failed to parse candidate file {input}"))?;
            run_batch(&source, &config, sport.as_deref(), min_confidence, explain, json).await
        }
        Commands::Fetch {
            sport,
            min_confidence,
            explain,
            json,
        } => {
            let client = PropApiClient::new(&config.provider)
                .context("Failed to create prop board client")?;
            run_batch(&client, &config, sport.as_deref(), min_confidence, explain, json).await
        }
    }
}

/// Report shape for the `--json` output path.
#[derive(Serialize)]
struct JsonOutput<'a> {
    #[serde(flatten)]
    report: &'a BatchReport,
    #[serde(skip_serializing_if = "Option::is_none")]
    explanations: Option<Vec<prop_portfolio::pipeline::ExplanationRecord>>,
}

/// Fetch, analyze, and print one batch.
async fn run_batch(
    provider: &dyn CandidateProvider,
    config: &Config,
    sport: Option<&str>,
    min_confidence: Option<f64>,
    explain: bool,
    json: bool,
) -> Result<()> {
    let sport = sport.or_else(|| {
        let configured = config.filters.sport.as_str();
        (!configured.is_empty()).then_some(configured)
    });
    let min_confidence = min_confidence.unwrap_or(config.filters.min_confidence);

    // Provider failure is recoverable: run the pipeline on an empty batch so
    // the caller still sees an "initializing/empty" result.
    let candidates = match provider.fetch_candidates(sport, min_confidence).await {
        Ok(candidates) => candidates,
        Err(ProviderError::Unavailable(reason)) | Err(ProviderError::Malformed(reason)) => {
            warn!(%reason, "Provider unavailable, proceeding with empty batch");
            Vec::new()
        }
    };

    info!(
        fetched = candidates.len(),
        ?sport,
        min_confidence,
        "Running allocation pipeline"
    );

    let pipeline = Pipeline::new(config.pipeline.clone());
    let report = pipeline.run(candidates)?;

    let explanations =
        explain.then(|| ExplanationGenerator::new().explain_batch(&report.candidates));

    if json {
        let output = JsonOutput {
            report: &report,
            explanations,
        };
        println!("{}", serde_json::to_string_pretty(&output)?);
        return Ok(());
    }

    print_report(&report);
    if let Some(explanations) = &explanations {
        for record in explanations {
            println!("\n[{}]", record.candidate_id);
            println!("  {}", record.rationale);
            println!("  risk factors: {}", record.risk_factors.join(", "));
        }
    }

    Ok(())
}

/// Print a human-readable view of the batch report.
fn print_report(report: &BatchReport) {
    if report.candidates.is_empty() {
        println!("No candidates to allocate (empty batch).");
    }

    for candidate in &report.candidates {
        println!(
            "{:<12} {:<20} {:>6.1}%  stake {:>6.2}%  EV {:>8.4}  risk {}",
            candidate.id(),
            candidate.candidate.player_name,
            candidate.candidate.confidence,
            candidate.optimal_stake * 100.0,
            candidate.expected_value,
            candidate.risk.risk_level,
        );
    }

    for rejected in &report.rejected {
        println!("dropped {:<12} ({})", rejected.id, rejected.reason);
    }

    println!("{}", report.metrics.summary());
}

/// Initialize logging with file output.
fn init_logging() -> Result<()> {
    use tracing_subscriber::fmt::writer::MakeWriterExt;

    std::fs::create_dir_all("logs")?;

    let file_appender = tracing_appender::rolling::hourly("logs", "prop-portfolio.log");
    let (file_writer, guard) = tracing_appender::non_blocking(file_appender);

    // Leak the guard to keep it alive for the program duration
    Box::leak(Box::new(guard));

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::from_default_env()
                .add_directive("prop_portfolio=debug".parse()?)
                .add_directive(Level::INFO.into()),
        )
        .with_writer(std::io::stderr.and(file_writer))
        .with_target(true)
        .with_thread_ids(false)
        .with_file(true)
        .with_line_number(true)
        .with_span_events(FmtSpan::CLOSE)
        .with_ansi(true)
        .init();

    Ok(())
}
