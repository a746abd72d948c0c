//! Period aggregation.
//!
//! One routine groups canonical records by `(symbol, period_start)` for any
//! bucketing rule; the granularities differ only in the rule they pass in.

use chrono::NaiveDate;
use delivery_core::{
    delivery_ratio_pct, pct_change, AggregateRecord, CanonicalRecord, Granularity, Quantity,
};
use std::collections::BTreeMap;
use tracing::debug;

/// A bucket that's currently being summed.
#[derive(Debug, Clone, Default)]
struct BucketInProgress {
    traded_qty: Quantity,
    deliverable_qty: Quantity,
    net_value: f64,
}

impl BucketInProgress {
    fn add_record(&mut self, record: &CanonicalRecord) {
        self.traded_qty = self.traded_qty.saturating_add(record.traded_qty);
        self.deliverable_qty = self.deliverable_qty.saturating_add(record.deliverable_qty);
        self.net_value += record.net_value.unwrap_or(0.0);
    }

    fn to_aggregate(&self, symbol: &str, period_start: NaiveDate, with_net_value: bool) -> AggregateRecord {
        AggregateRecord {
            period_start,
            symbol: symbol.to_string(),
            traded_qty_sum: self.traded_qty,
            deliverable_qty_sum: self.deliverable_qty,
            net_value_sum: with_net_value.then_some(self.net_value),
            delivery_pct: delivery_ratio_pct(self.deliverable_qty, self.traded_qty),
            traded_qty_pct_change: None,
            deliverable_qty_pct_change: None,
        }
    }
}

/// Whether any record carries a net value, i.e. the net-value column exists.
fn has_net_value(records: &[CanonicalRecord]) -> bool {
    records.iter().any(|r| r.net_value.is_some())
}

/// Aggregate records into buckets chosen by `bucket`.
///
/// Output is sorted by `(symbol, period_start)` with percent changes filled
/// in per symbol. Buckets where nothing traded get no delivery percentage.
pub fn aggregate_with<F>(records: &[CanonicalRecord], bucket: F) -> Vec<AggregateRecord>
where
    F: Fn(NaiveDate) -> NaiveDate,
{
    let with_net_value = has_net_value(records);

    let mut buckets: BTreeMap<(&str, NaiveDate), BucketInProgress> = BTreeMap::new();
    for record in records {
        buckets
            .entry((record.symbol.as_str(), bucket(record.date)))
            .or_default()
            .add_record(record);
    }

    let mut aggregates: Vec<AggregateRecord> = buckets
        .iter()
        .map(|(&(symbol, start), b)| b.to_aggregate(symbol, start, with_net_value))
        .collect();

    apply_pct_changes(&mut aggregates);
    aggregates
}

/// Aggregate records at one granularity.
pub fn aggregate(records: &[CanonicalRecord], granularity: Granularity) -> Vec<AggregateRecord> {
    let aggregates = match granularity {
        Granularity::Day => daily(records),
        g => aggregate_with(records, |date| g.period_start(date)),
    };
    debug!(
        granularity = %granularity,
        rows = records.len(),
        buckets = aggregates.len(),
        "aggregated"
    );
    aggregates
}

/// Daily view: one output row per input row, ordered by `(symbol, date)`,
/// keeping the reported delivery percentage and adding day-over-day changes.
pub fn daily(records: &[CanonicalRecord]) -> Vec<AggregateRecord> {
    let with_net_value = has_net_value(records);

    let mut rows: Vec<AggregateRecord> = records
        .iter()
        .map(|r| AggregateRecord {
            period_start: r.date,
            symbol: r.symbol.clone(),
            traded_qty_sum: r.traded_qty,
            deliverable_qty_sum: r.deliverable_qty,
            net_value_sum: with_net_value.then(|| r.net_value.unwrap_or(0.0)),
            delivery_pct: Some(r.delivery_pct),
            traded_qty_pct_change: None,
            deliverable_qty_pct_change: None,
        })
        .collect();

    rows.sort_by(|a, b| {
        a.symbol
            .cmp(&b.symbol)
            .then_with(|| a.period_start.cmp(&b.period_start))
    });

    apply_pct_changes(&mut rows);
    rows
}

/// Fill period-over-period changes for rows sorted by `(symbol, period_start)`.
///
/// The first row of each symbol, and any row whose predecessor is zero, gets
/// no change.
pub fn apply_pct_changes(rows: &mut [AggregateRecord]) {
    if let Some(first) = rows.first_mut() {
        first.traded_qty_pct_change = None;
        first.deliverable_qty_pct_change = None;
    }

    for i in 1..rows.len() {
        let (done, rest) = rows.split_at_mut(i);
        let prev = &done[i - 1];
        let cur = &mut rest[0];

        if prev.symbol == cur.symbol {
            cur.traded_qty_pct_change = pct_change(prev.traded_qty_sum, cur.traded_qty_sum);
            cur.deliverable_qty_pct_change =
                pct_change(prev.deliverable_qty_sum, cur.deliverable_qty_sum);
        } else {
            cur.traded_qty_pct_change = None;
            cur.deliverable_qty_pct_change = None;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    fn d(y: i32, m: u32, day: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, day).unwrap()
    }

    fn rec(symbol: &str, date: NaiveDate, traded: u64, deliverable: u64) -> CanonicalRecord {
        CanonicalRecord {
            symbol: symbol.to_string(),
            date,
            traded_qty: traded,
            deliverable_qty: deliverable,
            delivery_pct: delivery_ratio_pct(deliverable, traded).unwrap_or(0.0),
            open: None,
            close: None,
            net_value: None,
        }
    }

    #[test]
    fn test_weekly_example() {
        let records = vec![
            rec("AAA", d(2024, 1, 1), 1000, 500),
            rec("AAA", d(2024, 1, 8), 2000, 1000),
        ];

        let weekly = aggregate(&records, Granularity::Week);

        assert_eq!(weekly.len(), 2);
        assert_eq!(weekly[0].period_start, d(2024, 1, 1));
        assert_eq!(weekly[1].period_start, d(2024, 1, 8));
        assert_relative_eq!(weekly[0].delivery_pct.unwrap(), 50.0);
        assert_relative_eq!(weekly[1].delivery_pct.unwrap(), 50.0);
        assert!(weekly[0].traded_qty_pct_change.is_none());
        assert_relative_eq!(weekly[1].traded_qty_pct_change.unwrap(), 100.0);
        assert_relative_eq!(weekly[1].deliverable_qty_pct_change.unwrap(), 100.0);
    }

    #[test]
    fn test_week_groups_monday_to_sunday() {
        let records = vec![
            rec("AAA", d(2024, 1, 1), 100, 10), // Monday
            rec("AAA", d(2024, 1, 5), 100, 30), // Friday
            rec("AAA", d(2024, 1, 7), 200, 60), // Sunday
        ];
        let weekly = aggregate(&records, Granularity::Week);
        assert_eq!(weekly.len(), 1);
        assert_eq!(weekly[0].traded_qty_sum, 400);
        assert_eq!(weekly[0].deliverable_qty_sum, 100);
        assert_relative_eq!(weekly[0].delivery_pct.unwrap(), 25.0);
    }

    #[test]
    fn test_sorted_by_symbol_then_period() {
        let records = vec![
            rec("BBB", d(2024, 2, 1), 10, 5),
            rec("AAA", d(2024, 2, 1), 10, 5),
            rec("AAA", d(2024, 1, 1), 10, 5),
        ];
        let monthly = aggregate(&records, Granularity::Month);
        let keys: Vec<(&str, NaiveDate)> = monthly
            .iter()
            .map(|a| (a.symbol.as_str(), a.period_start))
            .collect();
        assert_eq!(
            keys,
            vec![("AAA", d(2024, 1, 1)), ("AAA", d(2024, 2, 1)), ("BBB", d(2024, 2, 1))]
        );
        // BBB's first bucket has no predecessor even though AAA precedes it.
        assert!(monthly[2].traded_qty_pct_change.is_none());
    }

    #[test]
    fn test_zero_traded_has_no_delivery_pct() {
        let records = vec![rec("AAA", d(2024, 1, 2), 0, 0), rec("AAA", d(2024, 4, 2), 50, 5)];
        let quarterly = aggregate(&records, Granularity::Quarter);
        assert!(quarterly[0].delivery_pct.is_none());
        // Previous bucket traded zero: change is undefined, not infinite.
        assert!(quarterly[1].traded_qty_pct_change.is_none());
        assert_relative_eq!(quarterly[1].delivery_pct.unwrap(), 10.0);
    }

    #[test]
    fn test_half_year_and_year_buckets() {
        let records = vec![
            rec("AAA", d(2024, 6, 30), 100, 50),
            rec("AAA", d(2024, 7, 1), 300, 60),
            rec("AAA", d(2025, 1, 1), 150, 30),
        ];

        let half = aggregate(&records, Granularity::HalfYear);
        assert_eq!(half.len(), 3);
        assert_eq!(half[0].period_start, d(2024, 1, 1));
        assert_eq!(half[1].period_start, d(2024, 7, 1));
        assert_relative_eq!(half[1].traded_qty_pct_change.unwrap(), 200.0);
        assert_relative_eq!(half[2].traded_qty_pct_change.unwrap(), -50.0);

        let yearly = aggregate(&records, Granularity::Year);
        assert_eq!(yearly.len(), 2);
        assert_eq!(yearly[0].traded_qty_sum, 400);
        assert_relative_eq!(yearly[0].delivery_pct.unwrap(), 27.5);
    }

    #[test]
    fn test_net_value_materialized_when_any_open() {
        let mut with_open = rec("AAA", d(2024, 1, 1), 100, 40);
        with_open.open = Some(10.0);
        let with_open = with_open.with_net_value();
        let without_open = rec("AAA", d(2024, 1, 2), 100, 40);
        let other_month = rec("AAA", d(2024, 2, 1), 100, 40);

        let monthly = aggregate(&[with_open, without_open, other_month], Granularity::Month);
        assert_relative_eq!(monthly[0].net_value_sum.unwrap(), 400.0);
        assert_relative_eq!(monthly[1].net_value_sum.unwrap(), 0.0);

        let plain = aggregate(&[rec("AAA", d(2024, 1, 1), 1, 1)], Granularity::Month);
        assert!(plain[0].net_value_sum.is_none());
    }

    #[test]
    fn test_daily_is_identity_plus_changes() {
        let mut dirty = rec("AAA", d(2024, 1, 2), 1000, 1205);
        dirty.delivery_pct = 120.5;
        let records = vec![dirty, rec("AAA", d(2024, 1, 1), 500, 100)];

        let daily_rows = aggregate(&records, Granularity::Day);

        assert_eq!(daily_rows.len(), 2);
        assert_eq!(daily_rows[0].period_start, d(2024, 1, 1));
        assert_eq!(daily_rows[0].traded_qty_sum, 500);
        assert_relative_eq!(daily_rows[0].delivery_pct.unwrap(), 20.0);
        assert_relative_eq!(daily_rows[1].delivery_pct.unwrap(), 120.5);
        assert_relative_eq!(daily_rows[1].traded_qty_pct_change.unwrap(), 100.0);
        assert_relative_eq!(daily_rows[1].deliverable_qty_pct_change.unwrap(), 1105.0);
    }

    #[test]
    fn test_custom_bucket_rule() {
        // Everything in one bucket.
        let records = vec![rec("AAA", d(2024, 1, 1), 10, 1), rec("AAA", d(2024, 9, 9), 30, 3)];
        let all = aggregate_with(&records, |_| d(2000, 1, 1));
        assert_eq!(all.len(), 1);
        assert_eq!(all[0].traded_qty_sum, 40);
    }

    #[test]
    fn test_huge_sums_saturate() {
        let big = 10_000_000_000_000_000_000;
        let records = vec![
            rec("AAA", d(2024, 1, 1), big, big),
            rec("AAA", d(2024, 1, 2), big, big),
        ];

        let weekly = aggregate(&records, Granularity::Week);

        assert_eq!(weekly.len(), 1);
        assert_eq!(weekly[0].traded_qty_sum, u64::MAX);
        assert_eq!(weekly[0].deliverable_qty_sum, u64::MAX);
        assert_relative_eq!(weekly[0].delivery_pct.unwrap(), 100.0);
    }

    #[test]
    fn test_empty_input() {
        for g in Granularity::ALL {
            assert!(aggregate(&[], g).is_empty());
        }
    }
}
