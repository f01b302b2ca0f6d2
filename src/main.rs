//! # ctask - recurring compliance task CLI
//!
//! Turns one task form into a chain of dated compliance tasks on the task
//! service.
//!
//! ## Quick Start
//!
//! ```bash
//! # Preview the four quarterly occurrences of a GST return
//! ctask expand "File GST return" --deadline 2025-01-15 --recur Quarterly
//!
//! # Create them, attaching the working papers to the first task
//! ctask submit "File GST return" --deadline 2025-01-15 --recur Quarterly \
//!     --assignee u-12 --reviewer u-3 --attach gst-workpapers.xlsx
//!
//! # Three years of monthly NAV reports, numbered
//! ctask submit "NAV report" --deadline eom --recur Monthly --years 3 --annotate
//!
//! # See what a submission would send without touching the service
//! ctask submit "Board pack" --deadline 2025-03-31 --recur Yearly --dry-run
//! ```
//!
//! Settings live in `~/.ctask/config.toml`:
//!
//! ```toml
//! api_url = "https://compliance.example.com/api"
//! timeout_secs = 10
//! span_years = 1
//! annotate_descriptions = false
//! document_type = "Task Attachment"
//! ```
//!
//! Ctrl-C stops a chain after the request in flight completes; tasks already
//! created are listed on exit.

use anyhow::{Context, Result};
use clap::Parser;
use tokio_util::sync::CancellationToken;
use tracing_subscriber::EnvFilter;

use compliance_tasks::cli::Cli;
use compliance_tasks::cmd::*;
use compliance_tasks::config::Config;

fn init_tracing(verbose: bool) {
    let filter = if verbose {
        EnvFilter::new("debug")
    } else {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"))
    };
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    let mut config = Config::load(cli.config.as_deref()).context("loading configuration")?;
    cli.apply(&mut config);

    let cancel = CancellationToken::new();
    let on_interrupt = cancel.clone();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            tracing::warn!("interrupted, stopping after the request in flight");
            on_interrupt.cancel();
        }
    });

    match cli.command {
        Commands::Expand { template } => cmd_expand(&config, &template),

        Commands::Submit {
            template,
            attachments,
            document_type,
            dry_run,
        } => cmd_submit(&config, &template, &attachments, document_type, dry_run, cancel).await,

        Commands::List { page, page_size, all } => cmd_list(&config, page, page_size, all).await,

        Commands::Completions { shell } => {
            cmd_completions(shell);
            Ok(())
        }
    }
}
