//! Urltally CLI: reads urls from stdin, fetches each with bounded
//! concurrency, prints a per-url count plus a final total.

use anyhow::{ensure, Result};
use clap::Parser;
use std::sync::Arc;
use std::time::Duration;
use urltally::{
    init_tracing, ConsoleReport, HttpFetchClient, LinkScorer, Runner, Scorer, ShutdownMode,
    SubstringScorer, TallyConfig,
};

#[derive(Debug, Parser)]
#[command(
    name = "urltally",
    version,
    about = "Read urls from stdin, fetch each one, and tally a per-page score."
)]
struct Cli {
    /// Maximum number of concurrent fetches.
    #[arg(short = 'k', long, default_value_t = 4)]
    max_concurrent: usize,

    /// Capacity of the pending-url buffer; urls offered beyond it are dropped.
    #[arg(short = 'b', long, default_value_t = 100)]
    buffer_size: usize,

    /// Per-request timeout in seconds.
    #[arg(long, default_value_t = 10)]
    timeout_secs: u64,

    /// Count occurrences of this substring instead of counting links.
    #[arg(long)]
    needle: Option<String>,

    /// On interrupt, print the total immediately instead of draining
    /// in-flight fetches.
    #[arg(long)]
    abort_on_interrupt: bool,
}

#[tokio::main]
async fn main() -> Result<()> {
    init_tracing();
    let cli = Cli::parse();

    if let Some(needle) = &cli.needle {
        ensure!(!needle.is_empty(), "--needle must not be empty");
    }

    let config = TallyConfig::builder()
        .max_concurrent(cli.max_concurrent)
        .buffer_size(cli.buffer_size)
        .fetch_timeout(Duration::from_secs(cli.timeout_secs))
        .shutdown_mode(if cli.abort_on_interrupt {
            ShutdownMode::ImmediateAbort
        } else {
            ShutdownMode::GracefulDrain
        })
        .build()?;

    let client = Arc::new(HttpFetchClient::from_config(&config)?);
    let scorer: Arc<dyn Scorer> = match cli.needle {
        Some(needle) => Arc::new(SubstringScorer::new(needle)),
        None => Arc::new(LinkScorer),
    };

    let runner = Runner::new(config, client, scorer, ConsoleReport);
    runner.run_until_ctrl_c(tokio::io::stdin()).await?;

    Ok(())
}
