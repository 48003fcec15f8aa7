//! Command-line interface definitions for News Harvest.
//!
//! Only the date range is required. Everything else overrides the matching
//! key of the optional YAML config file (see [`crate::config`]).

use crate::harvester::CommentsPolicy;
use chrono::NaiveDate;
use clap::Parser;
use std::path::PathBuf;

/// Command-line arguments for the News Harvest application.
///
/// # Examples
///
/// ```sh
/// # Harvest all of 2022 with the defaults
/// news_harvest --start 2022-01-01 --end 2023-01-01
///
/// # Fewer workers, older markup, custom output directory
/// news_harvest --start 2022-01-01 --end 2022-02-01 -c 4 --ruleset fontanka-2022 -o ./data
///
/// # Everything else from a config file
/// news_harvest --start 2022-01-01 --end 2022-02-01 --config harvest.yaml
/// ```
#[derive(Parser, Debug)]
#[command(author, version, about)]
pub struct Cli {
    /// First date to harvest (YYYY-MM-DD)
    #[arg(short, long)]
    pub start: NaiveDate,

    /// Date to stop before, exclusive (YYYY-MM-DD)
    #[arg(short, long)]
    pub end: NaiveDate,

    /// Optional path to a YAML config file
    #[arg(long)]
    pub config: Option<PathBuf>,

    /// Maximum number of dates harvested concurrently
    #[arg(short = 'c', long)]
    pub concurrency: Option<usize>,

    /// Number of records per intermediate CSV file
    #[arg(long)]
    pub flush_threshold: Option<usize>,

    /// Directory receiving the CSV and report files
    #[arg(short, long)]
    pub output_dir: Option<PathBuf>,

    /// File name prefix for every output file
    #[arg(long)]
    pub prefix: Option<String>,

    /// Built-in extraction ruleset (fontanka-2023, fontanka-2022)
    #[arg(long)]
    pub ruleset: Option<String>,

    /// What to do with articles whose comment counter is missing
    #[arg(long, value_enum)]
    pub comments_policy: Option<CommentsPolicy>,

    /// Also write debug logs to this file
    #[arg(long)]
    pub log_file: Option<PathBuf>,
}
