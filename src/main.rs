//! Commit statistics pipeline binary.
//!
//! Runs extraction and aggregation for one or more local repository
//! checkouts and writes the derived tables to the results directory.

use std::path::PathBuf;

use anyhow::Context;
use clap::Parser;
use tokio_util::sync::CancellationToken;
use tracing::{error, info};

use commitstats::pipeline::write_run_summary;
use commitstats::{DelimitedDirSink, LocalCheckout, Pipeline, PipelineConfig};

#[derive(Debug, Parser)]
#[command(
    name = "commitstats",
    about = "Extract and aggregate commit history from Git repositories"
)]
struct Cli {
    /// Paths to local repository checkouts to analyze.
    #[arg(required = true)]
    repos: Vec<PathBuf>,

    /// Directory receiving the raw per-repository tables.
    #[arg(long, default_value = "raw_data")]
    raw_data_dir: PathBuf,

    /// Directory receiving the derived tables and run summary.
    #[arg(long, default_value = "results")]
    results_dir: PathBuf,

    /// Upper bound on concurrent per-commit stat extractions.
    #[arg(long)]
    stat_workers: Option<usize>,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt::init();

    let cli = Cli::parse();

    let mut config = PipelineConfig::new(&cli.raw_data_dir, &cli.results_dir);
    if let Some(workers) = cli.stat_workers {
        config = config.with_stat_workers(workers);
    }

    let cancel = CancellationToken::new();
    {
        let cancel = cancel.clone();
        tokio::spawn(async move {
            if tokio::signal::ctrl_c().await.is_ok() {
                info!("interrupt received, keeping rows already collected");
                cancel.cancel();
            }
        });
    }

    let pipeline = Pipeline::new(config);
    let sink = DelimitedDirSink::new(&cli.results_dir);

    let mut summaries = Vec::new();
    let mut failures = 0usize;
    for repo in &cli.repos {
        let source = LocalCheckout::new(repo);
        match pipeline.run_repo(&source, &sink, &cancel).await {
            Ok(summary) => summaries.push(summary),
            Err(err) => {
                failures += 1;
                error!(repo = %repo.display(), %err, "repository failed");
            }
        }
    }

    write_run_summary(&cli.results_dir, &summaries).context("writing run summary")?;

    if failures > 0 {
        anyhow::bail!("{failures} of {} repositories failed", cli.repos.len());
    }
    Ok(())
}
