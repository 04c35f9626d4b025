//! `test-collector`: upload test reports to Test Engine from the command line.

mod report;

use std::path::{Path, PathBuf};
use std::time::Duration;

use anyhow::{Context, Result};
use clap::{Args, Parser, Subcommand};
use collector_api::{API_TOKEN_VAR, CollectorConfig, TestAnalyticsApi};
use collector_core::{
    DEFAULT_BATCH_SIZE, Instant, Payload, PayloadJson, RunEnv, RunEnvBuilder, TestResult,
};
use collector_proto::{RunEnvironment, StderrDiagnostics};
use futures::StreamExt;
use tracing::{debug, warn};
use tracing_subscriber::EnvFilter;

use crate::report::Report;

#[derive(Parser, Debug)]
#[command(name = "test-collector", version, about)]
struct Cli {
    /// Enable debug logging
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Print the detected run environment
    Env,

    /// Print the upload batches for a report without sending them
    Preview(PreviewArgs),

    /// Upload a report to Test Engine
    Submit(SubmitArgs),
}

#[derive(Args, Debug)]
struct PreviewArgs {
    /// Path to the JSON report
    report: PathBuf,

    /// Maximum number of tests per upload request
    #[arg(long, default_value_t = DEFAULT_BATCH_SIZE)]
    batch_size: usize,
}

#[derive(Args, Debug)]
struct SubmitArgs {
    /// Path to the JSON report
    report: PathBuf,

    /// Maximum number of tests per upload request
    #[arg(long, default_value_t = DEFAULT_BATCH_SIZE)]
    batch_size: usize,

    /// Override the API endpoint (defaults to BUILDKITE_ANALYTICS_API_URL)
    #[arg(long, value_name = "URL")]
    api_url: Option<String>,

    /// Request timeout in seconds
    #[arg(long, value_name = "SECONDS")]
    timeout: Option<u64>,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // Logs go to stderr so stdout stays machine-readable
    let filter = if cli.verbose { "debug" } else { "warn" };
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(filter)),
        )
        .with_writer(std::io::stderr)
        .init();

    match cli.command {
        Commands::Env => env_command(),
        Commands::Preview(args) => preview_command(args),
        Commands::Submit(args) => submit_command(args).await,
    }
}

fn detect_run_env() -> RunEnv {
    RunEnvBuilder::from_env().build().unwrap_or_else(|| {
        debug!("No CI environment detected, using a generic run environment");
        RunEnv::generic()
    })
}

fn load_payload(path: &Path) -> Result<Payload> {
    let report = Report::load(path)?;
    let payload = report
        .into_payload(detect_run_env(), Instant::now())
        .with_context(|| format!("Failed to build payload from {}", path.display()))?;
    debug!("Loaded {} tests from {}", payload.len(), path.display());
    Ok(payload)
}

fn env_command() -> Result<()> {
    let run_env = detect_run_env();
    println!("{}", serde_json::to_string_pretty(&run_env.as_json())?);
    Ok(())
}

fn preview_command(args: PreviewArgs) -> Result<()> {
    let payload = load_payload(&args.report)?;
    let batches = payload.into_batches(args.batch_size);

    let wire: Vec<PayloadJson<'_>> = batches
        .iter()
        .map(|batch| batch.as_json(&StderrDiagnostics))
        .collect();
    println!("{}", serde_json::to_string_pretty(&wire)?);
    Ok(())
}

async fn submit_command(args: SubmitArgs) -> Result<()> {
    let mut config = CollectorConfig::from_env();
    if let Some(api_url) = args.api_url {
        config = config.with_api_url(api_url);
    }
    if let Some(timeout) = args.timeout {
        config = config.with_timeout(Duration::from_secs(timeout));
    }

    let api = TestAnalyticsApi::new(config).context("Failed to create upload client")?;
    if !api.is_enabled() {
        warn!("{} is not set, uploads are disabled", API_TOKEN_VAR);
    }

    let payload = load_payload(&args.report)?;
    let total = payload.len().div_ceil(args.batch_size.max(1)).max(1);
    let failed = payload
        .data()
        .iter()
        .filter(|test| test.result().is_some_and(TestResult::is_failed))
        .count();
    println!(
        "Submitting {} tests ({} failed) in {} batches",
        payload.len(),
        failed,
        total
    );

    let mut results = Box::pin(api.submit(payload, args.batch_size));
    let mut rejected = 0;
    let mut index = 0;
    while let Some(result) = results.next().await {
        index += 1;
        match result {
            Some(response) => match response.receipt() {
                Ok(receipt) => {
                    println!(
                        "batch {}/{}: queued={} skipped={} errors={}",
                        index,
                        total,
                        receipt.queued,
                        receipt.skipped,
                        receipt.errors.len()
                    );
                    if let Some(run_url) = receipt.run_url {
                        println!("  {}", run_url);
                    }
                }
                Err(_) => println!(
                    "batch {}/{}: accepted (status {})",
                    index,
                    total,
                    response.status_code()
                ),
            },
            None => {
                rejected += 1;
                println!("batch {}/{}: not submitted", index, total);
            }
        }
    }

    if api.is_enabled() && rejected > 0 {
        anyhow::bail!("{} of {} batches were not accepted", rejected, total);
    }

    Ok(())
}
