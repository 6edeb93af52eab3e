//! Forgeflow - dependent repository workflow runner
//!
//! CLI entry point: creates a repository, an issue in it, and a comment on
//! that issue.

// Allow multiple crate versions from dependencies (can't easily control)
#![allow(clippy::multiple_crate_versions)]

use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::{Context, Result};
use clap::Parser;
use tracing::warn;

use forgeflow::cli::{render_run_summary, RunDisplay};
use forgeflow::config::ForgeConfig;
use forgeflow::log::{init_tracing, RunLog};
use forgeflow::pipeline::{CancelToken, Executor, Observers, RunReport};
use forgeflow::publish::{EnvSink, FileSink, Publisher};
use forgeflow::remote::HttpClient;
use forgeflow::workflow::issue_workflow;

/// Repository → issue → comment workflow runner
///
/// Each step's identifier feeds the next; the first failure stops the run
/// and is reported with its step, kind and HTTP status.
#[derive(Parser, Debug)]
#[command(name = "forgeflow", version, about)]
struct Cli {
    /// Path to the forgeflow.toml configuration file
    #[arg(long, default_value = "forgeflow.toml")]
    config: PathBuf,

    /// Append `key=value` outputs to this file (e.g. "$GITHUB_OUTPUT")
    #[arg(long)]
    outputs: Option<PathBuf>,

    /// Do not export outputs to the process environment
    #[arg(long)]
    no_env: bool,

    /// Print the run report as JSON on stdout
    #[arg(long)]
    json: bool,

    /// Append the run report to <DIR>/runs.jsonl
    #[arg(long, value_name = "DIR")]
    report_log: Option<PathBuf>,

    /// Log at debug level (RUST_LOG takes precedence)
    #[arg(short, long)]
    verbose: bool,
}

/// Exit code for a finished run: 0 on success, 1 on any step failure.
const fn exit_code(report: &RunReport) -> i32 {
    if report.succeeded() {
        0
    } else {
        1
    }
}

/// Build the publisher from the requested sinks.
fn build_publisher(outputs: Option<&Path>, export_env: bool) -> Result<Publisher> {
    let mut publisher = Publisher::new();
    if export_env {
        publisher = publisher.with_sink(Box::new(EnvSink));
    }
    if let Some(path) = outputs {
        let sink = FileSink::new(path)
            .with_context(|| format!("Failed to prepare outputs file '{}'", path.display()))?;
        publisher = publisher.with_sink(Box::new(sink));
    }
    Ok(publisher)
}

/// Raise `cancel` on Ctrl-C. The run stops before the next step's call.
fn cancel_on_ctrl_c(cancel: CancelToken) {
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            warn!("Interrupted; stopping before the next step");
            cancel.cancel();
        }
    });
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    // Load configuration
    let config = ForgeConfig::from_path(&cli.config)
        .with_context(|| format!("Failed to load config from '{}'", cli.config.display()))?;
    let credentials = config.credentials()?;
    let base_url = credentials.base_url().to_string();

    // Initialize
    let client = HttpClient::new(credentials, config.user_agent(), config.timeout())?;
    let executor = Executor::new(Arc::new(client));
    let steps = issue_workflow(&config);
    let mut publisher = build_publisher(cli.outputs.as_deref(), !cli.no_env)?;
    let mut display = RunDisplay::new(steps.len());
    let cancel = CancelToken::new();
    cancel_on_ctrl_c(cancel.clone());

    // Execute the workflow
    display.print_header(&base_url);
    let mut observers = Observers::new().with(&mut display).with(&mut publisher);
    let report = executor.run_observed(&steps, &cancel, &mut observers).await;
    render_run_summary(&report);

    if let Some(dir) = &cli.report_log {
        RunLog::new(dir)
            .and_then(|log| log.append(&report))
            .context("Failed to write run report log")?;
    }

    if cli.json {
        let json =
            serde_json::to_string_pretty(&report).context("Failed to serialize run report")?;
        println!("{json}");
    }

    // Exit with appropriate code
    match exit_code(&report) {
        0 => Ok(()),
        code => std::process::exit(code),
    }
}
