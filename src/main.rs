//! # News Harvest
//!
//! Harvests dated news articles from a site that publishes one index page
//! per day. For every date in the requested range it fetches that day's
//! index page, follows each article link, extracts the article's fields and
//! writes everything to CSV, checkpointing as it goes.
//!
//! ## Usage
//!
//! ```sh
//! news_harvest --start 2022-01-01 --end 2023-01-01 -o ./data
//! ```
//!
//! ## Architecture
//!
//! 1. **Units**: expand the date range into one unit per date
//! 2. **Harvest**: run units concurrently (10 at a time by default); each
//!    fetches its index page, then its article pages one by one
//! 3. **Checkpoint**: every 1000 records are written to an intermediate CSV
//! 4. **Output**: write the full CSV, then audit which dates came back empty

use chrono::Local;
use clap::Parser;
use std::error::Error;
use tracing::{error, info, warn};

use news_harvest::checkpoint::CheckpointWriter;
use news_harvest::cli::Cli;
use news_harvest::config::HarvestConfig;
use news_harvest::fetch::HttpFetcher;
use news_harvest::harvester::PageHarvester;
use news_harvest::models::{DateRange, HarvestAggregate};
use news_harvest::outputs::csv::{CsvArtifactSink, write_records};
use news_harvest::outputs::json;
use news_harvest::progress::ProgressReporter;
use news_harvest::scheduler::TaskScheduler;
use news_harvest::utils::ensure_writable_dir;
use news_harvest::{audit, logging, pipeline};

#[tokio::main(flavor = "current_thread")]
async fn main() -> Result<(), Box<dyn Error>> {
    let args = Cli::parse();

    let mut config = match &args.config {
        Some(path) => HarvestConfig::load(path)?,
        None => HarvestConfig::default(),
    };
    config.apply_cli(&args);
    config.validate()?;

    // --- Tracing init, scoped to this run ---
    let _log_guard = logging::init(config.log_file.as_deref())?;

    let start_time = std::time::Instant::now();
    info!(
        start = %args.start,
        end = %args.end,
        concurrency = config.concurrency,
        flush_threshold = config.flush_threshold,
        output_dir = %config.output_dir.display(),
        started_at = %Local::now(),
        "news_harvest starting up"
    );

    if let Err(e) = ensure_writable_dir(&config.output_dir).await {
        error!(
            path = %config.output_dir.display(),
            error = %e,
            "Output directory is not writable (fix perms or choose a different path)"
        );
        return Err(e.into());
    }

    let range = DateRange::new(args.start, args.end);
    let units = config.units(&range);
    if units.is_empty() {
        warn!("Requested date range is empty; nothing to harvest");
    }

    let fetcher = HttpFetcher::new(&config.user_agent, config.request_timeout())?;
    let harvester = PageHarvester::new(fetcher, config.build_ruleset()?, config.harvester_settings()?);
    let mut checkpoint = CheckpointWriter::new(
        CsvArtifactSink::new(&config.output_dir),
        config.prefix.clone(),
        config.flush_threshold,
    );
    let mut progress = ProgressReporter::new(std::io::stderr());
    let mut aggregate = HarvestAggregate::new();

    // ---- Harvest ----
    let summary = pipeline::run_harvest(
        &harvester,
        TaskScheduler::new(config.concurrency),
        units,
        &mut checkpoint,
        &mut progress,
        &mut aggregate,
    )
    .await;
    eprintln!();
    println!("Total articles collected: {}", aggregate.len());

    // ---- Checkpoint remainder ----
    match checkpoint.finalize() {
        Ok(Some(path)) => info!(path = %path.display(), "Final checkpoint written"),
        Ok(None) => {}
        Err(e) => error!(
            error = %e,
            buffered = checkpoint.buffered(),
            "Failed to write final checkpoint"
        ),
    }

    // ---- Full dataset ----
    let full_path = config.output_dir.join(format!("{}_full.csv", config.prefix));
    match write_records(&full_path, aggregate.records()) {
        Ok(()) => {
            info!(path = %full_path.display(), records = aggregate.len(), "Full dataset saved");
            println!("Full dataset saved to {}", full_path.display());
        }
        Err(e) => {
            error!(path = %full_path.display(), error = %e, "Failed to save full dataset");
            println!(
                "Failed to save full dataset: {} (intermediate files remain in {})",
                e,
                config.output_dir.display()
            );
        }
    }

    // ---- Completeness audit ----
    let report = audit::audit(&range, &aggregate);
    print!("{}", report);
    if let Err(e) = json::write_report(&report, &config.output_dir, &config.prefix).await {
        error!(error = %e, "Failed to write completeness report");
    }

    let elapsed = start_time.elapsed();
    info!(
        ?elapsed,
        secs = elapsed.as_secs(),
        units = summary.units,
        empty_units = summary.empty_units,
        records = summary.records,
        checkpoints = checkpoint.written().len(),
        "Execution complete"
    );

    Ok(())
}
