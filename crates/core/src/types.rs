//! Core data types for the delivery statistics pipeline.

use chrono::{Datelike, Duration, NaiveDate};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Share/contract count.
pub type Quantity = u64;

/// One crore (10 million), the unit net-value thresholds are quoted in.
pub const CRORE: f64 = 10_000_000.0;

/// Canonical field names of the logical schema.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Field {
    Symbol,
    Date,
    TradedQty,
    DeliverableQty,
    DeliveryPct,
    Open,
    Close,
}

impl Field {
    /// Fields every input must provide.
    pub const REQUIRED: [Field; 5] = [
        Field::Symbol,
        Field::Date,
        Field::TradedQty,
        Field::DeliverableQty,
        Field::DeliveryPct,
    ];

    /// Canonical column name.
    pub fn as_str(self) -> &'static str {
        match self {
            Field::Symbol => "symbol",
            Field::Date => "date",
            Field::TradedQty => "traded_qty",
            Field::DeliverableQty => "deliverable_qty",
            Field::DeliveryPct => "delivery_pct",
            Field::Open => "open",
            Field::Close => "close",
        }
    }
}

impl fmt::Display for Field {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A cleaned, typed trading record for one symbol on one day.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CanonicalRecord {
    /// Instrument identifier.
    pub symbol: String,
    /// Trading day.
    pub date: NaiveDate,
    /// Total traded quantity.
    pub traded_qty: Quantity,
    /// Quantity marked for delivery.
    pub deliverable_qty: Quantity,
    /// Delivery percentage as reported by the source (never clamped).
    pub delivery_pct: f64,
    /// Opening price, when the source has one.
    pub open: Option<f64>,
    /// Closing price, when the source has one.
    pub close: Option<f64>,
    /// Deliverable quantity times opening price.
    pub net_value: Option<f64>,
}

impl CanonicalRecord {
    /// Deduplication key.
    #[inline]
    pub fn key(&self) -> (&str, NaiveDate) {
        (&self.symbol, self.date)
    }

    /// Fill `net_value` from `open`.
    pub fn with_net_value(mut self) -> Self {
        self.net_value = net_value(self.deliverable_qty, self.open);
        self
    }
}

/// Net value of a delivery: deliverable quantity times opening price.
#[inline]
pub fn net_value(deliverable_qty: Quantity, open: Option<f64>) -> Option<f64> {
    open.map(|px| deliverable_qty as f64 * px)
}

/// Delivery percentage of summed quantities, absent when nothing traded.
#[inline]
pub fn delivery_ratio_pct(deliverable: Quantity, traded: Quantity) -> Option<f64> {
    if traded == 0 {
        None
    } else {
        Some(100.0 * deliverable as f64 / traded as f64)
    }
}

/// Percent change from `previous` to `current`, absent when `previous` is zero.
#[inline]
pub fn pct_change(previous: Quantity, current: Quantity) -> Option<f64> {
    if previous == 0 {
        None
    } else {
        let prev = previous as f64;
        Some(100.0 * (current as f64 - prev) / prev)
    }
}

/// Round to two decimals for display tables.
#[inline]
pub fn round2(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}

/// Time granularity for period aggregation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Granularity {
    Day,
    Week,
    Month,
    Quarter,
    HalfYear,
    Year,
}

impl Granularity {
    /// All granularities, finest first.
    pub const ALL: [Granularity; 6] = [
        Granularity::Day,
        Granularity::Week,
        Granularity::Month,
        Granularity::Quarter,
        Granularity::HalfYear,
        Granularity::Year,
    ];

    /// Start date of the bucket containing `date`.
    pub fn period_start(self, date: NaiveDate) -> NaiveDate {
        match self {
            Granularity::Day => date,
            Granularity::Week => week_start(date),
            Granularity::Month => month_start(date),
            Granularity::Quarter => quarter_start(date),
            Granularity::HalfYear => half_year_start(date),
            Granularity::Year => year_start(date),
        }
    }

    /// Name used in configs, reports and on the command line.
    pub fn as_str(self) -> &'static str {
        match self {
            Granularity::Day => "day",
            Granularity::Week => "week",
            Granularity::Month => "month",
            Granularity::Quarter => "quarter",
            Granularity::HalfYear => "half_year",
            Granularity::Year => "year",
        }
    }
}

impl fmt::Display for Granularity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Granularity {
    type Err = crate::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().replace('-', "_").as_str() {
            "day" | "daily" => Ok(Granularity::Day),
            "week" | "weekly" => Ok(Granularity::Week),
            "month" | "monthly" => Ok(Granularity::Month),
            "quarter" | "quarterly" => Ok(Granularity::Quarter),
            "half_year" | "half_yearly" => Ok(Granularity::HalfYear),
            "year" | "yearly" => Ok(Granularity::Year),
            other => Err(crate::Error::config(format!("unknown granularity: {other}"))),
        }
    }
}

/// Monday of the week containing `date`.
#[inline]
pub fn week_start(date: NaiveDate) -> NaiveDate {
    date - Duration::days(date.weekday().num_days_from_monday() as i64)
}

/// First day of the month containing `date`.
#[inline]
pub fn month_start(date: NaiveDate) -> NaiveDate {
    first_of(date.year(), date.month())
}

/// First day of the calendar quarter containing `date`.
#[inline]
pub fn quarter_start(date: NaiveDate) -> NaiveDate {
    first_of(date.year(), (date.month0() / 3) * 3 + 1)
}

/// Jan 1 for January-June, Jul 1 otherwise.
#[inline]
pub fn half_year_start(date: NaiveDate) -> NaiveDate {
    first_of(date.year(), if date.month() <= 6 { 1 } else { 7 })
}

/// Jan 1 of the year containing `date`.
#[inline]
pub fn year_start(date: NaiveDate) -> NaiveDate {
    first_of(date.year(), 1)
}

fn first_of(year: i32, month: u32) -> NaiveDate {
    // Year comes from a valid NaiveDate and month is always in 1..=12.
    NaiveDate::from_ymd_opt(year, month, 1).unwrap_or(NaiveDate::MIN)
}

/// Aggregated statistics for one symbol over one period bucket.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AggregateRecord {
    /// First day of the bucket.
    pub period_start: NaiveDate,
    /// Instrument identifier.
    pub symbol: String,
    /// Sum of traded quantity.
    pub traded_qty_sum: Quantity,
    /// Sum of deliverable quantity.
    pub deliverable_qty_sum: Quantity,
    /// Sum of net value, materialized only when the source had opening prices.
    pub net_value_sum: Option<f64>,
    /// Delivery percentage of the bucket.
    pub delivery_pct: Option<f64>,
    /// Percent change of traded quantity vs. the previous bucket of the symbol.
    pub traded_qty_pct_change: Option<f64>,
    /// Percent change of deliverable quantity vs. the previous bucket of the symbol.
    pub deliverable_qty_pct_change: Option<f64>,
}

impl AggregateRecord {
    /// Traded quantity in millions, two decimals.
    pub fn traded_qty_millions(&self) -> f64 {
        round2(self.traded_qty_sum as f64 / 1e6)
    }

    /// Deliverable quantity in millions, two decimals.
    pub fn deliverable_qty_millions(&self) -> f64 {
        round2(self.deliverable_qty_sum as f64 / 1e6)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    fn d(y: i32, m: u32, day: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, day).unwrap()
    }

    #[test]
    fn test_week_start_is_monday() {
        // 2024-01-01 is a Monday
        assert_eq!(week_start(d(2024, 1, 1)), d(2024, 1, 1));
        assert_eq!(week_start(d(2024, 1, 7)), d(2024, 1, 1));
        assert_eq!(week_start(d(2024, 1, 8)), d(2024, 1, 8));
        // Crosses a year boundary
        assert_eq!(week_start(d(2023, 1, 1)), d(2022, 12, 26));
    }

    #[test]
    fn test_period_starts() {
        let date = d(2024, 8, 17);
        assert_eq!(Granularity::Day.period_start(date), date);
        assert_eq!(Granularity::Month.period_start(date), d(2024, 8, 1));
        assert_eq!(Granularity::Quarter.period_start(date), d(2024, 7, 1));
        assert_eq!(Granularity::HalfYear.period_start(date), d(2024, 7, 1));
        assert_eq!(Granularity::Year.period_start(date), d(2024, 1, 1));

        assert_eq!(Granularity::Quarter.period_start(d(2024, 3, 31)), d(2024, 1, 1));
        assert_eq!(Granularity::Quarter.period_start(d(2024, 12, 31)), d(2024, 10, 1));
        assert_eq!(Granularity::HalfYear.period_start(d(2024, 6, 30)), d(2024, 1, 1));
    }

    #[test]
    fn test_pct_change() {
        assert_relative_eq!(pct_change(1000, 2000).unwrap(), 100.0);
        assert_relative_eq!(pct_change(2000, 500).unwrap(), -75.0);
        assert!(pct_change(0, 500).is_none());
    }

    #[test]
    fn test_delivery_ratio() {
        assert_relative_eq!(delivery_ratio_pct(500, 1000).unwrap(), 50.0);
        assert!(delivery_ratio_pct(10, 0).is_none());
    }

    #[test]
    fn test_net_value() {
        assert_relative_eq!(net_value(200, Some(12.5)).unwrap(), 2500.0);
        assert!(net_value(200, None).is_none());
    }

    #[test]
    fn test_granularity_from_str() {
        assert_eq!("weekly".parse::<Granularity>().unwrap(), Granularity::Week);
        assert_eq!("half-year".parse::<Granularity>().unwrap(), Granularity::HalfYear);
        assert!("fortnight".parse::<Granularity>().is_err());
    }

    #[test]
    fn test_millions_rounding() {
        let agg = AggregateRecord {
            period_start: d(2024, 1, 1),
            symbol: "AAA".to_string(),
            traded_qty_sum: 1_234_567,
            deliverable_qty_sum: 556_000,
            net_value_sum: None,
            delivery_pct: delivery_ratio_pct(556_000, 1_234_567),
            traded_qty_pct_change: None,
            deliverable_qty_pct_change: None,
        };
        assert_relative_eq!(agg.traded_qty_millions(), 1.23);
        assert_relative_eq!(agg.deliverable_qty_millions(), 0.56);
    }
}
