//! Parsing of the localized publication timestamps found on article pages.
//!
//! Pages print dates like `15 января 2022, 10:30`: day, genitive month name,
//! year with a trailing comma, then a 24-hour clock time.

use chrono::{NaiveDate, NaiveDateTime, NaiveTime};
use once_cell::sync::Lazy;
use std::collections::HashMap;
use tracing::warn;

static MONTHS: Lazy<HashMap<&'static str, u32>> = Lazy::new(|| {
    [
        ("января", 1),
        ("февраля", 2),
        ("марта", 3),
        ("апреля", 4),
        ("мая", 5),
        ("июня", 6),
        ("июля", 7),
        ("августа", 8),
        ("сентября", 9),
        ("октября", 10),
        ("ноября", 11),
        ("декабря", 12),
    ]
    .into_iter()
    .collect()
});

/// Parse a `"<day> <month-name> <year>, <HH:MM>"` string.
///
/// Returns `None` on any malformed input and logs a warning; never panics.
///
/// # Examples
///
/// ```ignore
/// let ts = parse_timestamp("15 января 2022, 10:30").unwrap();
/// assert_eq!(ts.to_string(), "2022-01-15 10:30:00");
/// assert!(parse_timestamp("garbage").is_none());
/// ```
pub fn parse_timestamp(raw: &str) -> Option<NaiveDateTime> {
    match try_parse(raw) {
        Ok(ts) => Some(ts),
        Err(reason) => {
            warn!(raw, reason, "Could not parse publication date");
            None
        }
    }
}

fn try_parse(raw: &str) -> Result<NaiveDateTime, &'static str> {
    let tokens: Vec<&str> = raw.split_whitespace().collect();
    let [day, month, year, time] = tokens.as_slice() else {
        return Err("expected four tokens");
    };

    let day: u32 = trim_punct(day).parse().map_err(|_| "bad day")?;
    let month = month_number(month).ok_or("unknown month name")?;
    let year: i32 = trim_punct(year).parse().map_err(|_| "bad year")?;
    let time = NaiveTime::parse_from_str(trim_punct(time), "%H:%M").map_err(|_| "bad time")?;

    let date = NaiveDate::from_ymd_opt(year, month, day).ok_or("date out of range")?;
    Ok(date.and_time(time))
}

/// Look up a month name after normalizing case and trailing punctuation.
pub fn month_number(name: &str) -> Option<u32> {
    let normalized = trim_punct(name).to_lowercase();
    MONTHS.get(normalized.as_str()).copied()
}

fn trim_punct(token: &str) -> &str {
    token.trim_end_matches(|c: char| c.is_ascii_punctuation())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn at(y: i32, m: u32, d: u32, h: u32, min: u32) -> NaiveDateTime {
        NaiveDate::from_ymd_opt(y, m, d)
            .unwrap()
            .and_hms_opt(h, min, 0)
            .unwrap()
    }

    #[test]
    fn test_parse_reference_string() {
        assert_eq!(
            parse_timestamp("15 января 2022, 10:30"),
            Some(at(2022, 1, 15, 10, 30))
        );
    }

    #[test]
    fn test_parse_garbage_is_absent() {
        assert_eq!(parse_timestamp("garbage"), None);
        assert_eq!(parse_timestamp(""), None);
    }

    #[test]
    fn test_parse_normalizes_month_case_and_punctuation() {
        assert_eq!(
            parse_timestamp("1 Декабря, 2023, 23:59"),
            Some(at(2023, 12, 1, 23, 59))
        );
        assert_eq!(month_number("МАЯ."), Some(5));
    }

    #[test]
    fn test_parse_tolerates_extra_whitespace() {
        assert_eq!(
            parse_timestamp("  7   марта 2022,  08:05 "),
            Some(at(2022, 3, 7, 8, 5))
        );
    }

    #[test]
    fn test_parse_rejects_bad_fields() {
        assert_eq!(parse_timestamp("15 январь 2022, 10:30"), None);
        assert_eq!(parse_timestamp("31 февраля 2022, 10:30"), None);
        assert_eq!(parse_timestamp("15 января 2022, 25:30"), None);
        assert_eq!(parse_timestamp("x января 2022, 10:30"), None);
        assert_eq!(parse_timestamp("15 января 2022"), None);
        assert_eq!(parse_timestamp("15 января 2022, 10:30 МСК"), None);
    }

    #[test]
    fn test_every_month_maps() {
        let names = [
            "января", "февраля", "марта", "апреля", "мая", "июня", "июля", "августа",
            "сентября", "октября", "ноября", "декабря",
        ];
        for (i, name) in names.iter().enumerate() {
            assert_eq!(month_number(name), Some(i as u32 + 1));
        }
    }
}
