//! Wires the CLI arguments into a run and reports its result.

use std::io::{self, IsTerminal};
use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result};
use clap::Parser;
use timelapse_core::{
    CancellationFlag, CatalogClient, Credentials, DEFAULT_CHUNK_SIZE, DigestSession,
    DownloadOptions, RateLimit, ReconcilePolicy, RetryPolicy, RunExit, RunOrchestrator,
    RunOutcome, StreamingDownloader,
};
use tracing::{debug, info};

use crate::app::console::ConsoleReporter;
use crate::app::{signals, terminal};
use crate::cli::Args;

pub(crate) async fn run_timelapse_download() -> Result<RunExit> {
    let args = Args::parse();

    terminal::init_tracing(terminal::resolve_log_level(args.verbose, args.quiet));
    debug!(
        host = %args.host,
        user = %args.user,
        outdir = %args.outdir.display(),
        "CLI arguments parsed"
    );

    let rate_limit = if args.no_rate_limit {
        RateLimit::Unlimited
    } else {
        RateLimit::from_megabits_per_second(args.rate_limit).context("invalid --rate-limit")?
    };

    std::fs::create_dir_all(&args.outdir).with_context(|| {
        format!(
            "failed to create output directory {}",
            args.outdir.display()
        )
    })?;

    println!("Fetching timelapse archives from {}...", args.host);

    let session = DigestSession::new(
        Credentials::new(args.user, args.password),
        Duration::from_secs(args.timeout),
    )?;
    let catalog = match CatalogClient::new(&args.host, session.clone()) {
        Ok(catalog) => catalog,
        Err(e) => {
            eprintln!("ERROR: Failed to fetch archives: {e}");
            return Ok(RunExit::CatalogUnavailable);
        }
    };

    let reporter = Arc::new(ConsoleReporter::new(terminal::should_show_progress(
        args.no_progress,
        io::stderr().is_terminal(),
        terminal::is_dumb_terminal(),
    )));
    let cancel = CancellationFlag::new();

    let downloader = StreamingDownloader::new(
        session,
        DownloadOptions {
            rate_limit,
            retry_policy: RetryPolicy::new(
                args.max_retries,
                Duration::from_secs(args.retry_delay),
            ),
            chunk_size: DEFAULT_CHUNK_SIZE,
            progress: Some(reporter.clone()),
            cancellation: Some(cancel.clone()),
        },
    );
    let policy = ReconcilePolicy {
        overwrite: args.overwrite,
        check_size: args.check_size,
    };
    info!(%rate_limit, ?policy, "starting run");

    let orchestrator =
        RunOrchestrator::new(catalog, policy, downloader, &args.outdir).with_observer(reporter);

    let listener = signals::spawn_interrupt_listener(cancel.clone());
    let result = orchestrator.run(&cancel).await;
    listener.abort();

    match result {
        Ok(outcome) => {
            println!("\n{}", summary_line(&outcome));
            Ok(outcome.exit_status())
        }
        Err(e) => {
            eprintln!("ERROR: Failed to fetch archives: {e}");
            Ok(e.exit_status())
        }
    }
}

pub(crate) fn summary_line(outcome: &RunOutcome) -> String {
    let status = if outcome.interrupted {
        "Interrupted"
    } else {
        "Done"
    };
    format!(
        "{status}. downloaded={} skipped={} failed={}",
        outcome.succeeded, outcome.skipped, outcome.failed
    )
}
