//! Post-run completeness check against the requested date range.
//!
//! Two sources of evidence say a date was harvested:
//!
//! - **confirmed**: some record's parsed timestamp falls on that date
//! - **produced**: the unit for that date returned at least one record
//!
//! A date with neither is *missing*. A date that was produced but never
//! confirmed is reported separately as *unconfirmed*: its articles exist but
//! none carried a readable publication date for that day.

use crate::models::{DateRange, HarvestAggregate};
use chrono::NaiveDate;
use itertools::Itertools;
use serde::Serialize;
use std::collections::BTreeSet;
use std::fmt;
use tracing::{info, instrument, warn};

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CompletenessReport {
    pub start: NaiveDate,
    pub end: NaiveDate,
    pub requested_dates: usize,
    pub records: usize,
    pub missing: Vec<NaiveDate>,
    pub unconfirmed: Vec<NaiveDate>,
}

impl CompletenessReport {
    pub fn is_complete(&self) -> bool {
        self.missing.is_empty()
    }
}

impl fmt::Display for CompletenessReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.is_complete() {
            writeln!(
                f,
                "All data collected without gaps: {} dates, {} articles",
                self.requested_dates, self.records
            )?;
        } else {
            writeln!(
                f,
                "Data lost for the following dates: {}",
                self.missing.iter().join(", ")
            )?;
            writeln!(f, "Total lost: {}", self.missing.len())?;
        }
        if !self.unconfirmed.is_empty() {
            writeln!(
                f,
                "Articles without a readable date on: {} ({})",
                self.unconfirmed.iter().join(", "),
                self.unconfirmed.len()
            )?;
        }
        Ok(())
    }
}

/// Compare what was harvested against what was asked for.
#[instrument(level = "info", skip_all, fields(start = %range.start, end = %range.end))]
pub fn audit(range: &DateRange, aggregate: &HarvestAggregate) -> CompletenessReport {
    let confirmed: BTreeSet<NaiveDate> = aggregate
        .records()
        .iter()
        .filter_map(|r| r.timestamp.map(|ts| ts.date()))
        .filter(|d| range.contains(*d))
        .collect();

    let produced: BTreeSet<NaiveDate> = aggregate
        .per_unit()
        .iter()
        .filter(|(date, count)| **count > 0 && range.contains(**date))
        .map(|(date, _)| *date)
        .collect();

    let requested = range.dates();
    let missing: Vec<NaiveDate> = requested
        .iter()
        .filter(|d| !confirmed.contains(*d) && !produced.contains(*d))
        .copied()
        .collect();
    let unconfirmed: Vec<NaiveDate> = produced.difference(&confirmed).copied().collect();

    if missing.is_empty() {
        info!(dates = requested.len(), "Every requested date is represented");
    } else {
        warn!(missing = missing.len(), "Some requested dates produced no articles");
    }
    if !unconfirmed.is_empty() {
        warn!(
            dates = %unconfirmed.iter().join(", "),
            "Dates with articles but no parsed timestamp on that day"
        );
    }

    CompletenessReport {
        start: range.start,
        end: range.end,
        requested_dates: requested.len(),
        records: aggregate.len(),
        missing,
        unconfirmed,
    }
}
