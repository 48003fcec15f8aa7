//! CSV persistence of article records.
//!
//! Columns follow [`ArticleRecord`]'s field order: `source_url, title,
//! content, topic, timestamp, views, comments_amount`. An absent timestamp
//! is written as an empty cell.

use crate::checkpoint::ArtifactSink;
use crate::error::Result;
use crate::models::ArticleRecord;
use std::path::{Path, PathBuf};
use tracing::{debug, instrument};

/// Writes each artifact as `<dir>/<name>.csv`.
#[derive(Debug, Clone)]
pub struct CsvArtifactSink {
    dir: PathBuf,
}

impl CsvArtifactSink {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    pub fn path_for(&self, name: &str) -> PathBuf {
        self.dir.join(format!("{}.csv", name))
    }
}

impl ArtifactSink for CsvArtifactSink {
    fn persist(&mut self, name: &str, records: &[ArticleRecord]) -> Result<PathBuf> {
        let path = self.path_for(name);
        write_records(&path, records)?;
        Ok(path)
    }
}

/// Write `records` to a new CSV file at `path`, replacing any existing file.
#[instrument(level = "info", skip_all, fields(path = %path.display(), count = records.len()))]
pub fn write_records(path: &Path, records: &[ArticleRecord]) -> Result<()> {
    let mut writer = ::csv::Writer::from_path(path)?;
    if records.is_empty() {
        writer.write_record(COLUMNS)?;
    }
    for record in records {
        writer.serialize(record)?;
    }
    writer.flush()?;
    debug!("CSV written");
    Ok(())
}

/// Header row, used when there is no record to derive it from.
pub const COLUMNS: [&str; 7] = [
    "source_url",
    "title",
    "content",
    "topic",
    "timestamp",
    "views",
    "comments_amount",
];

/// Load records back from a CSV artifact.
pub fn read_records(path: &Path) -> Result<Vec<ArticleRecord>> {
    let mut reader = ::csv::Reader::from_path(path)?;
    let mut records = Vec::new();
    for row in reader.deserialize() {
        records.push(row?);
    }
    Ok(records)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    fn sample() -> Vec<ArticleRecord> {
        vec![
            ArticleRecord {
                source_url: "https://news.test/a/1/".to_string(),
                title: "Мост, \"развели\"".to_string(),
                content: "Первый абзац. Второй абзац.".to_string(),
                topic: "Город".to_string(),
                timestamp: NaiveDate::from_ymd_opt(2022, 1, 15)
                    .unwrap()
                    .and_hms_opt(10, 30, 0),
                views: 12345,
                comments_amount: 17,
            },
            ArticleRecord {
                source_url: "https://news.test/a/2/".to_string(),
                title: "Без даты".to_string(),
                content: String::new(),
                topic: "Спорт".to_string(),
                timestamp: None,
                views: 1,
                comments_amount: 0,
            },
        ]
    }

    #[test]
    fn test_sink_writes_named_artifact_with_header() {
        let dir = tempfile::tempdir().unwrap();
        let mut sink = CsvArtifactSink::new(dir.path());

        let path = sink.persist("news_intermediate_0", &sample()).unwrap();

        assert_eq!(path, dir.path().join("news_intermediate_0.csv"));
        let text = std::fs::read_to_string(&path).unwrap();
        let header = text.lines().next().unwrap();
        assert_eq!(header, COLUMNS.join(","));
        assert!(text.contains("2022-01-15 10:30:00"));
        assert_eq!(read_records(&path).unwrap(), sample());
    }

    #[test]
    fn test_empty_artifact_still_has_header() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("empty.csv");
        write_records(&path, &[]).unwrap();
        let text = std::fs::read_to_string(&path).unwrap();
        assert_eq!(text.trim_end(), COLUMNS.join(","));
        assert!(read_records(&path).unwrap().is_empty());
    }

    #[test]
    fn test_missing_directory_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        let mut sink = CsvArtifactSink::new(dir.path().join("nope"));
        assert!(sink.persist("x", &sample()).is_err());
    }
}
