//! Threshold-based checkpointing of harvested records.
//!
//! Records are buffered as unit results arrive. Once the buffer holds at
//! least `threshold` records it is written out as one numbered artifact
//! (`<prefix>_intermediate_<n>`) and cleared. [`CheckpointWriter::finalize`]
//! writes any remainder under the next number, so after a run the
//! artifacts `0..n` together hold every record exactly once.
//!
//! A failed write leaves the buffer and the counter untouched; the next
//! `accept` or `finalize` tries again with the same name.

use crate::error::Result;
use crate::models::ArticleRecord;
use std::path::PathBuf;
use tracing::{debug, info, instrument};

pub const DEFAULT_FLUSH_THRESHOLD: usize = 1000;

/// Somewhere a batch of records can be persisted under a name.
pub trait ArtifactSink {
    /// Persist `records` as an immutable artifact called `name`.
    fn persist(&mut self, name: &str, records: &[ArticleRecord]) -> Result<PathBuf>;
}

pub struct CheckpointWriter<S> {
    sink: S,
    prefix: String,
    threshold: usize,
    buffer: Vec<ArticleRecord>,
    index: usize,
    written: Vec<PathBuf>,
}

impl<S: ArtifactSink> CheckpointWriter<S> {
    /// A threshold of zero is treated as one.
    pub fn new(sink: S, prefix: impl Into<String>, threshold: usize) -> Self {
        Self {
            sink,
            prefix: prefix.into(),
            threshold: threshold.max(1),
            buffer: Vec::new(),
            index: 0,
            written: Vec::new(),
        }
    }

    /// Buffer `records`, flushing if the threshold is reached.
    ///
    /// Returns the artifact path when a flush happened.
    pub fn accept(&mut self, records: &[ArticleRecord]) -> Result<Option<PathBuf>> {
        self.buffer.extend_from_slice(records);
        if self.buffer.len() >= self.threshold {
            self.flush().map(Some)
        } else {
            Ok(None)
        }
    }

    /// Flush whatever is left. Writes nothing if the buffer is empty.
    pub fn finalize(&mut self) -> Result<Option<PathBuf>> {
        if self.buffer.is_empty() {
            debug!("Nothing left to checkpoint");
            return Ok(None);
        }
        self.flush().map(Some)
    }

    #[instrument(level = "info", skip(self), fields(index = self.index, records = self.buffer.len()))]
    fn flush(&mut self) -> Result<PathBuf> {
        let name = artifact_name(&self.prefix, self.index);
        let path = self.sink.persist(&name, &self.buffer)?;
        info!(path = %path.display(), "Checkpoint written");
        self.index += 1;
        self.buffer.clear();
        self.written.push(path.clone());
        Ok(path)
    }

    pub fn buffered(&self) -> usize {
        self.buffer.len()
    }

    /// Index the next artifact will be written under.
    pub fn next_index(&self) -> usize {
        self.index
    }

    /// Paths of every artifact written so far, oldest first.
    pub fn written(&self) -> &[PathBuf] {
        &self.written
    }

    pub fn threshold(&self) -> usize {
        self.threshold
    }
}

pub fn artifact_name(prefix: &str, index: usize) -> String {
    format!("{}_intermediate_{}", prefix, index)
}
