//! Data models for harvest units and the articles they produce.
//!
//! - [`DateRange`]: the requested `[start, end)` span of calendar dates
//! - [`HarvestUnit`]: one date and the index page that lists its articles
//! - [`ArticleStub`]: a candidate link pulled from an index page
//! - [`ArticleRecord`]: a fully extracted article, one CSV row
//! - [`HarvestResult`]: everything one unit produced
//! - [`HarvestAggregate`]: the owned accumulator the driver fills

use chrono::{Days, NaiveDate, NaiveDateTime};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Serialization format for [`ArticleRecord::timestamp`].
pub const TIMESTAMP_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

/// A half-open range of calendar dates, `[start, end)`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DateRange {
    pub start: NaiveDate,
    pub end: NaiveDate,
}

impl DateRange {
    pub fn new(start: NaiveDate, end: NaiveDate) -> Self {
        Self { start, end }
    }

    /// Expand into every date in the range, in ascending order.
    ///
    /// Returns an empty vector when `end <= start`.
    pub fn dates(&self) -> Vec<NaiveDate> {
        let mut dates = Vec::new();
        let mut day = self.start;
        while day < self.end {
            dates.push(day);
            match day.checked_add_days(Days::new(1)) {
                Some(next) => day = next,
                None => break,
            }
        }
        dates
    }

    pub fn contains(&self, date: NaiveDate) -> bool {
        self.start <= date && date < self.end
    }
}

/// One date's worth of harvesting work.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HarvestUnit {
    /// The calendar date this unit covers.
    pub date: NaiveDate,
    /// Absolute URL of the index page listing that date's articles.
    pub index_url: String,
}

/// A candidate article reference pulled from an index page.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ArticleStub {
    /// Section or rubric the index page files the article under.
    pub topic: String,
    pub title: String,
    /// The link target exactly as it appears in the markup, usually relative.
    pub href: String,
}

/// A fully extracted article.
///
/// Field order matches the CSV column order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ArticleRecord {
    /// Absolute URL of the detail page.
    pub source_url: String,
    pub title: String,
    /// Text of every content block, space-joined in document order.
    pub content: String,
    pub topic: String,
    /// Publication time, absent when the page's date string did not parse.
    #[serde(with = "timestamp_format")]
    pub timestamp: Option<NaiveDateTime>,
    pub views: u64,
    pub comments_amount: u64,
}

mod timestamp_format {
    use super::TIMESTAMP_FORMAT;
    use chrono::NaiveDateTime;
    use serde::{Deserialize, Deserializer, Serializer};

    pub fn serialize<S>(value: &Option<NaiveDateTime>, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        match value {
            Some(ts) => serializer.serialize_str(&ts.format(TIMESTAMP_FORMAT).to_string()),
            None => serializer.serialize_str(""),
        }
    }

    pub fn deserialize<'de, D>(deserializer: D) -> Result<Option<NaiveDateTime>, D::Error>
    where
        D: Deserializer<'de>,
    {
        let raw = String::deserialize(deserializer)?;
        if raw.is_empty() {
            return Ok(None);
        }
        NaiveDateTime::parse_from_str(&raw, TIMESTAMP_FORMAT)
            .map(Some)
            .map_err(serde::de::Error::custom)
    }
}

/// The records one [`HarvestUnit`] produced. Possibly empty.
#[derive(Debug, Clone)]
pub struct HarvestResult {
    pub unit: HarvestUnit,
    pub records: Vec<ArticleRecord>,
}

impl HarvestResult {
    pub fn empty(unit: HarvestUnit) -> Self {
        Self {
            unit,
            records: Vec::new(),
        }
    }
}

/// Owned accumulator of everything a run produced.
///
/// Besides the records themselves it remembers how many records each unit
/// yielded, so a date whose records all lack a timestamp can still be told
/// apart from a date that produced nothing.
#[derive(Debug, Default)]
pub struct HarvestAggregate {
    records: Vec<ArticleRecord>,
    per_unit: BTreeMap<NaiveDate, usize>,
}

impl HarvestAggregate {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn absorb(&mut self, result: &HarvestResult) {
        *self.per_unit.entry(result.unit.date).or_default() += result.records.len();
        self.records.extend(result.records.iter().cloned());
    }

    pub fn records(&self) -> &[ArticleRecord] {
        &self.records
    }

    /// Record counts keyed by the unit date that produced them.
    pub fn per_unit(&self) -> &BTreeMap<NaiveDate, usize> {
        &self.per_unit
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }
}
