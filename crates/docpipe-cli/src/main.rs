//! docpipe - batch document extraction to CSV.
//!
//! Runs the extraction pipeline over a folder of documents, writing one CSV
//! plus raw JSON results. `docpipe` with no subcommand is equivalent to
//! `docpipe run` with defaults taken from the environment.

use anyhow::{Context, Result};
use clap::{Args, Parser, Subcommand};
use docpipe::core::config::{
    EXTRACTION_API_KEY_VAR, STRUCTURING_API_KEY_VAR,
};
use docpipe::{LandingAiClient, Pipeline, RunConfig, enumerate_documents};
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "docpipe", version, about = "Batch document extraction to CSV")]
struct Cli {
    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Subcommand)]
enum Command {
    /// Process a folder of documents into one combined CSV (default)
    Run(RunArgs),
    /// Generate one CSV per schema profile per document
    Multi(MultiArgs),
    /// Check configuration and API connectivity without processing anything
    Verify,
}

#[derive(Args, Default)]
struct RunArgs {
    /// Folder scanned for input documents
    #[arg(long)]
    documents: Option<PathBuf>,

    /// Path of the combined CSV output
    #[arg(long)]
    output: Option<PathBuf>,

    /// Directory receiving one raw JSON result per document
    #[arg(long)]
    results: Option<PathBuf>,

    /// Reshape extracted text into structured rows with the language model
    #[arg(long)]
    structured: bool,

    /// Custom structuring prompt (implies --structured)
    #[arg(long)]
    prompt: Option<String>,

    /// Upper bound on concurrent in-flight API calls
    #[arg(long)]
    max_concurrent: Option<usize>,
}

#[derive(Args)]
struct MultiArgs {
    /// Folder scanned for input documents
    #[arg(long)]
    documents: Option<PathBuf>,

    /// Directory receiving per-document CSV subdirectories
    #[arg(long, default_value = "output")]
    output: PathBuf,
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let cli = Cli::parse();
    match cli.command.unwrap_or(Command::Run(RunArgs::default())) {
        Command::Run(args) => run(args),
        Command::Multi(args) => run_multi(args),
        Command::Verify => verify(),
    }
}

fn run(args: RunArgs) -> Result<()> {
    let mut config = RunConfig::from_env().context("configuration error")?;

    if let Some(documents) = args.documents {
        config.documents_dir = documents;
    }
    if let Some(output) = args.output {
        config.output_csv = output;
    }
    if let Some(results) = args.results {
        config.results_dir = results;
    }
    if let Some(max_concurrent) = args.max_concurrent {
        config.max_concurrent = max_concurrent;
    }
    config.use_structuring = args.structured || args.prompt.is_some();
    config.custom_prompt = args.prompt;

    let pipeline = Pipeline::new(config)?;
    let report = pipeline.run_sync()?;
    println!("{report}");

    if report.succeeded == 0 && report.failed > 0 {
        anyhow::bail!("every document failed");
    }
    Ok(())
}

fn run_multi(args: MultiArgs) -> Result<()> {
    let mut config = RunConfig::from_env().context("configuration error")?;
    if let Some(documents) = args.documents {
        config.documents_dir = documents;
    }
    config.use_structuring = true;

    let pipeline = Pipeline::new(config)?;
    let report = pipeline.run_multi_csv_sync(&args.output)?;
    println!("{report}");

    if report.succeeded == 0 && report.failed > 0 {
        anyhow::bail!("every document failed");
    }
    Ok(())
}

/// Check keys, folders, and extraction API reachability.
///
/// The structuring key is only checked for presence; no billable call is
/// made against it.
fn verify() -> Result<()> {
    let mut failed = false;

    match std::env::var(EXTRACTION_API_KEY_VAR) {
        Ok(v) if !v.trim().is_empty() => println!("ok   {EXTRACTION_API_KEY_VAR} is set"),
        _ => {
            println!("FAIL {EXTRACTION_API_KEY_VAR} is not set");
            failed = true;
        }
    }

    match std::env::var(STRUCTURING_API_KEY_VAR) {
        Ok(v) if !v.trim().is_empty() => {
            println!("ok   {STRUCTURING_API_KEY_VAR} is set (structuring available)");
        }
        _ => println!("ok   {STRUCTURING_API_KEY_VAR} is not set (structuring disabled)"),
    }

    let config = match RunConfig::from_env() {
        Ok(config) => config,
        Err(e) => {
            println!("FAIL configuration: {e}");
            anyhow::bail!("verification failed");
        }
    };

    match enumerate_documents(&config.documents_dir) {
        Ok(enumeration) => println!(
            "ok   documents folder {} ({} supported, {} skipped)",
            config.documents_dir.display(),
            enumeration.documents.len(),
            enumeration.skipped
        ),
        Err(e) => {
            println!("FAIL documents folder: {e}");
            failed = true;
        }
    }

    match check_results_dir_writable(&config) {
        Ok(()) => println!("ok   results dir {} is writable", config.results_dir.display()),
        Err(e) => {
            println!("FAIL results dir: {e}");
            failed = true;
        }
    }

    let client = LandingAiClient::new(config.extraction_api_key.clone(), config.timeout_secs)?;
    let health = tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()
        .context("failed to create runtime")?
        .block_on(client.health_check());
    match health {
        Ok(()) => println!("ok   extraction API round trip"),
        Err(e) => {
            println!("FAIL extraction API: {e}");
            failed = true;
        }
    }

    if failed {
        anyhow::bail!("verification failed");
    }
    println!("all checks passed");
    Ok(())
}

fn check_results_dir_writable(config: &RunConfig) -> Result<()> {
    std::fs::create_dir_all(&config.results_dir)?;
    let probe = config.results_dir.join(".docpipe-write-check");
    std::fs::write(&probe, b"ok")?;
    std::fs::remove_file(&probe)?;
    Ok(())
}
