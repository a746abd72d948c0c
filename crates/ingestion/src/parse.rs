//! Tolerant cell parsers.
//!
//! Exchange files are noisy: placeholders for missing values, thousands
//! separators, trailing percent signs and a handful of date layouts. These
//! helpers turn a single cell into a typed value or `None`.

use chrono::{DateTime, Datelike, NaiveDate, NaiveDateTime};

/// Placeholder tokens that mean "no value".
pub const MISSING_TOKENS: [&str; 5] = ["-", "NA", "N/A", "na", ""];

/// Date-only layouts, tried in order. Month-first wins for ambiguous
/// numeric dates; day-first is the fallback when the first field exceeds 12.
const DATE_FORMATS: &[&str] = &[
    "%Y-%m-%d",
    "%d-%b-%Y",
    "%d-%B-%Y",
    "%d %b %Y",
    "%d %B %Y",
    "%b %d, %Y",
    "%B %d, %Y",
    "%b %d %Y",
    "%Y/%m/%d",
    "%m/%d/%Y",
    "%d/%m/%Y",
    "%m-%d-%Y",
    "%d-%m-%Y",
    "%d.%m.%Y",
    "%Y%m%d",
];

/// Two-digit-year layouts, tried after every four-digit layout. Years 00-68
/// map to 20xx and 69-99 to 19xx.
const SHORT_YEAR_FORMATS: &[&str] = &[
    "%d-%b-%y",
    "%d %b %y",
    "%m/%d/%y",
    "%d/%m/%y",
    "%m-%d-%y",
    "%d-%m-%y",
    "%d.%m.%y",
];

/// `%Y` also accepts one to three digits; anything before this year came
/// from a short year token.
const MIN_FULL_YEAR: i32 = 1000;

/// Date-time layouts; the time part is discarded.
const DATETIME_FORMATS: &[&str] = &[
    "%Y-%m-%d %H:%M:%S",
    "%Y-%m-%d %H:%M:%S%.f",
    "%Y-%m-%dT%H:%M:%S",
    "%Y-%m-%dT%H:%M:%S%.f",
    "%Y-%m-%d %H:%M",
    "%d-%b-%Y %H:%M:%S",
    "%d-%b-%Y %H:%M",
];

/// Whether a cell holds a missing-value placeholder.
#[inline]
pub fn is_missing(cell: &str) -> bool {
    MISSING_TOKENS.contains(&cell)
}

/// Cell contents with placeholders mapped to `None`.
#[inline]
pub fn non_missing(cell: &str) -> Option<&str> {
    if is_missing(cell) {
        None
    } else {
        Some(cell)
    }
}

/// Parse a date in any of the accepted layouts.
pub fn parse_date(raw: &str) -> Option<NaiveDate> {
    let s = raw.trim();
    if s.is_empty() {
        return None;
    }

    let full_year = |date: &NaiveDate| date.year() >= MIN_FULL_YEAR;

    DATE_FORMATS
        .iter()
        .find_map(|fmt| NaiveDate::parse_from_str(s, fmt).ok().filter(full_year))
        .or_else(|| {
            DATETIME_FORMATS
                .iter()
                .find_map(|fmt| NaiveDateTime::parse_from_str(s, fmt).ok())
                .map(|dt| dt.date())
                .filter(full_year)
        })
        .or_else(|| {
            DateTime::parse_from_rfc3339(s)
                .ok()
                .map(|dt| dt.date_naive())
                .filter(full_year)
        })
        .or_else(|| {
            SHORT_YEAR_FORMATS
                .iter()
                .find_map(|fmt| NaiveDate::parse_from_str(s, fmt).ok())
        })
}

/// Parse a number after stripping thousands separators and percent signs.
/// Non-finite results count as unparseable.
pub fn parse_number(raw: &str) -> Option<f64> {
    let cleaned: String = raw.chars().filter(|c| *c != ',' && *c != '%').collect();
    let cleaned = cleaned.trim();
    if cleaned.is_empty() {
        return None;
    }
    cleaned.parse::<f64>().ok().filter(|v| v.is_finite())
}

/// Parse a count, truncating fractional noise. Negative counts and counts
/// too large for a `u64` are rejected.
pub fn parse_quantity(raw: &str) -> Option<u64> {
    // u64::MAX rounds up to 2^64 as f64, so the bound is exclusive.
    parse_number(raw)
        .filter(|v| *v >= 0.0 && *v < u64::MAX as f64)
        .map(|v| v.trunc() as u64)
}

/// Parse a price. Negative prices are treated as missing.
pub fn parse_price(raw: &str) -> Option<f64> {
    parse_number(raw).filter(|v| *v >= 0.0)
}
