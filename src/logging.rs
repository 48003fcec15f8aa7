//! Tracing subscriber setup.
//!
//! The subscriber is installed with [`tracing::subscriber::set_default`]
//! rather than as the process-wide global: it lives exactly as long as the
//! returned guard. The binary runs on a current-thread runtime, so every
//! component sees it.

use crate::error::Result;
use std::fs::OpenOptions;
use std::path::Path;
use std::sync::Mutex;
use tracing::subscriber::DefaultGuard;
use tracing_subscriber::filter::LevelFilter;
use tracing_subscriber::fmt::time::UtcTime;
use tracing_subscriber::prelude::*;
use tracing_subscriber::{EnvFilter, fmt};

/// Build and install the run's subscriber.
///
/// Console output goes to stderr, filtered by `RUST_LOG` (default `info`).
/// With `log_file` set, a second layer appends everything at `debug` and
/// above to that file.
pub fn init(log_file: Option<&Path>) -> Result<DefaultGuard> {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    let console = fmt::layer()
        .with_target(true)
        .with_file(false)
        .with_line_number(false)
        .with_timer(UtcTime::rfc_3339())
        .with_writer(std::io::stderr)
        .with_filter(filter);

    let file_layer = match log_file {
        Some(path) => {
            let file = OpenOptions::new().create(true).append(true).open(path)?;
            Some(
                fmt::layer()
                    .with_ansi(false)
                    .with_target(true)
                    .with_timer(UtcTime::rfc_3339())
                    .with_writer(Mutex::new(file))
                    .with_filter(LevelFilter::DEBUG),
            )
        }
        None => None,
    };

    let subscriber = tracing_subscriber::registry().with(console).with(file_layer);
    Ok(tracing::subscriber::set_default(subscriber))
}
