//! Best-effort progress output.

use std::io::Write;
use tracing::warn;

/// Writes `\rProgress: N%` lines to a sink, swallowing write failures.
pub struct ProgressReporter<W> {
    sink: W,
    failures: usize,
}

impl<W: Write> ProgressReporter<W> {
    pub fn new(sink: W) -> Self {
        Self { sink, failures: 0 }
    }

    /// Emit the percentage of `completed` out of `total` and return it.
    pub fn report(&mut self, completed: usize, total: usize) -> u8 {
        let pct = percentage(completed, total);
        let emitted = write!(self.sink, "\rProgress: {}%", pct).and_then(|_| self.sink.flush());
        if let Err(e) = emitted {
            self.failures += 1;
            warn!(error = %e, completed, total, "Failed to print progress");
        }
        pct
    }

    /// Number of reports that could not be written.
    pub fn failures(&self) -> usize {
        self.failures
    }

    pub fn into_inner(self) -> W {
        self.sink
    }
}

/// Integer percentage, clamped to 100. An empty batch counts as done.
pub fn percentage(completed: usize, total: usize) -> u8 {
    if total == 0 {
        return 100;
    }
    (completed.min(total) * 100 / total) as u8
}
