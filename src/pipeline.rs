//! The driving loop of a harvest run.
//!
//! [`run_harvest`] is the only place that mutates run state. It drains the
//! scheduler's completion stream and, for each finished unit, feeds the
//! aggregate, the checkpoint writer and the progress reporter in turn. Unit
//! futures never touch that state themselves.

use crate::checkpoint::{ArtifactSink, CheckpointWriter};
use crate::fetch::PageFetcher;
use crate::harvester::PageHarvester;
use crate::models::{HarvestAggregate, HarvestUnit};
use crate::progress::ProgressReporter;
use crate::scheduler::TaskScheduler;
use futures::StreamExt;
use std::io::Write;
use std::pin::pin;
use tracing::{debug, error, info, instrument};

/// Counters describing a finished run.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RunSummary {
    pub units: usize,
    pub empty_units: usize,
    pub records: usize,
    /// Checkpoint flushes that failed and were deferred.
    pub checkpoint_failures: usize,
}

/// Harvest every unit and stream the results into the run's state.
///
/// Returns once every unit has completed. Never fails: unit faults are
/// absorbed by the harvester and scheduler, and checkpoint faults are
/// logged and retried on the next flush.
#[instrument(level = "info", skip_all, fields(units = units.len(), limit = scheduler.limit()))]
pub async fn run_harvest<F, S, W>(
    harvester: &PageHarvester<F>,
    scheduler: TaskScheduler,
    units: Vec<HarvestUnit>,
    checkpoint: &mut CheckpointWriter<S>,
    progress: &mut ProgressReporter<W>,
    aggregate: &mut HarvestAggregate,
) -> RunSummary
where
    F: PageFetcher,
    S: ArtifactSink,
    W: Write,
{
    let total = units.len();
    let mut summary = RunSummary {
        units: total,
        ..RunSummary::default()
    };

    let mut completions = pin!(scheduler.run(units, |unit| harvester.harvest(unit)));
    let mut completed = 0;
    while let Some(result) = completions.next().await {
        completed += 1;
        if result.records.is_empty() {
            summary.empty_units += 1;
        }
        summary.records += result.records.len();
        aggregate.absorb(&result);

        if let Err(e) = checkpoint.accept(&result.records) {
            summary.checkpoint_failures += 1;
            error!(
                error = %e,
                buffered = checkpoint.buffered(),
                "Checkpoint write failed; records stay buffered for the next attempt"
            );
        }

        progress.report(completed, total);
        debug!(
            date = %result.unit.date,
            records = result.records.len(),
            completed,
            total,
            "Unit completed"
        );
    }

    info!(
        records = summary.records,
        empty_units = summary.empty_units,
        checkpoint_failures = summary.checkpoint_failures,
        "All units completed"
    );
    summary
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::audit::audit;
    use crate::error::{HarvestError, Result};
    use crate::harvester::tests::{INDEX_URL, MockFetcher, detail_page, index_page, settings};
    use crate::models::{ArticleRecord, DateRange};
    use crate::outputs::csv::{CsvArtifactSink, read_records};
    use crate::ruleset::{DEFAULT_PRESET, SelectorRuleset};
    use chrono::NaiveDate;
    use std::path::PathBuf;

    fn date(d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(2022, 1, d).unwrap()
    }

    fn index_url(d: u32) -> String {
        format!("https://news.test/2022/01/{:02}/news.html", d)
    }

    /// The 15th has three articles, the 16th one, the 17th's index is down.
    fn harvester() -> PageHarvester<MockFetcher> {
        let fetcher = MockFetcher::default()
            .with_page(
                INDEX_URL,
                &index_page(&[
                    ("Город", "Один", "/a/1/"),
                    ("Город", "Два", "/a/2/"),
                    ("Афиша Plus", "Реклама", "/a/promo/"),
                    ("Спорт", "Три", "/a/3/"),
                ]),
            )
            .with_page(&index_url(16), &index_page(&[("Город", "Четыре", "/a/4/")]))
            .with_page("https://news.test/a/1/", &detail_page(Some("1"), "10", "15 января 2022, 09:00"))
            .with_page("https://news.test/a/2/", &detail_page(Some("2"), "20", "15 января 2022, 10:00"))
            .with_page("https://news.test/a/3/", &detail_page(Some("3"), "30", "15 января 2022, 11:00"))
            .with_page("https://news.test/a/4/", &detail_page(Some("4"), "40", "16 января 2022, 12:00"));
        let ruleset = SelectorRuleset::from_preset(DEFAULT_PRESET).unwrap();
        PageHarvester::new(fetcher, Box::new(ruleset), settings())
    }

    fn range() -> DateRange {
        DateRange::new(date(15), date(18))
    }

    fn units() -> Vec<HarvestUnit> {
        (15..18)
            .map(|d| HarvestUnit {
                date: date(d),
                index_url: index_url(d),
            })
            .collect()
    }

    fn sorted_urls(records: &[ArticleRecord]) -> Vec<String> {
        let mut urls: Vec<String> = records.iter().map(|r| r.source_url.clone()).collect();
        urls.sort();
        urls
    }

    fn persisted(paths: &[PathBuf]) -> Vec<ArticleRecord> {
        paths.iter().flat_map(|p| read_records(p).unwrap()).collect()
    }

    /// Fails its first write, then delegates to a CSV sink.
    struct FailOnceSink {
        inner: CsvArtifactSink,
        failed: bool,
    }

    impl ArtifactSink for FailOnceSink {
        fn persist(&mut self, name: &str, records: &[ArticleRecord]) -> Result<PathBuf> {
            if !self.failed {
                self.failed = true;
                return Err(HarvestError::Io(std::io::Error::other("disk full")));
            }
            self.inner.persist(name, records)
        }
    }

    #[tokio::test]
    async fn test_run_checkpoints_reports_and_audits() {
        let harvester = harvester();
        assert_eq!(units()[0].index_url, INDEX_URL);

        let dir = tempfile::tempdir().unwrap();
        let mut checkpoint = CheckpointWriter::new(CsvArtifactSink::new(dir.path()), "news", 2);
        let mut progress = ProgressReporter::new(Vec::new());
        let mut aggregate = HarvestAggregate::new();

        let summary = run_harvest(
            &harvester,
            TaskScheduler::new(2),
            units(),
            &mut checkpoint,
            &mut progress,
            &mut aggregate,
        )
        .await;
        checkpoint.finalize().unwrap();

        assert_eq!(summary.units, 3);
        assert_eq!(summary.records, 4);
        assert_eq!(summary.empty_units, 1);
        assert_eq!(summary.checkpoint_failures, 0);
        assert_eq!(aggregate.len(), 4);
        assert!(aggregate.records().iter().all(|r| r.topic != "Афиша Plus"));

        assert_eq!(
            sorted_urls(&persisted(checkpoint.written())),
            sorted_urls(aggregate.records())
        );

        let out = String::from_utf8(progress.into_inner()).unwrap();
        assert!(out.ends_with("\rProgress: 100%"));
        assert_eq!(out.matches("Progress:").count(), 3);

        let report = audit(&range(), &aggregate);
        assert_eq!(report.missing, vec![date(17)]);
    }

    #[tokio::test]
    async fn test_failed_checkpoint_is_counted_and_retried() {
        let harvester = harvester();
        let dir = tempfile::tempdir().unwrap();
        let sink = FailOnceSink {
            inner: CsvArtifactSink::new(dir.path()),
            failed: false,
        };
        let mut checkpoint = CheckpointWriter::new(sink, "news", 2);
        let mut progress = ProgressReporter::new(Vec::new());
        let mut aggregate = HarvestAggregate::new();

        let summary = run_harvest(
            &harvester,
            TaskScheduler::new(2),
            units(),
            &mut checkpoint,
            &mut progress,
            &mut aggregate,
        )
        .await;
        checkpoint.finalize().unwrap();

        assert_eq!(summary.checkpoint_failures, 1);
        assert_eq!(summary.records, 4);
        assert_eq!(checkpoint.buffered(), 0);

        let stored = persisted(checkpoint.written());
        assert_eq!(stored.len(), 4);
        assert_eq!(sorted_urls(&stored), sorted_urls(aggregate.records()));
    }
}
