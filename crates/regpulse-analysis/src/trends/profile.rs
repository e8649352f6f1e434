//! Month and weekday profiles of a daily series.

use std::collections::BTreeMap;

use chrono::{Datelike, NaiveDate};
use serde::{Deserialize, Serialize};

use crate::aggregation::TimeSeries;

/// Mean daily value within one period.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PeriodValue {
    /// `YYYY-MM` for months, the weekday name for weekdays.
    pub period: String,
    pub days: usize,
    pub value: f64,
}

const WEEKDAYS: [&str; 7] = ["Mon", "Tue", "Wed", "Thu", "Fri", "Sat", "Sun"];

fn profile<K: Ord>(
    series: &TimeSeries,
    key: impl Fn(NaiveDate) -> K,
    label: impl Fn(&K) -> String,
) -> Vec<PeriodValue> {
    let mut buckets: BTreeMap<K, (f64, usize)> = BTreeMap::new();
    for &(date, value) in &series.points {
        let slot = buckets.entry(key(date)).or_insert((0.0, 0));
        slot.0 += value;
        slot.1 += 1;
    }
    buckets
        .into_iter()
        .map(|(k, (sum, days))| PeriodValue {
            period: label(&k),
            days,
            value: sum / days as f64,
        })
        .collect()
}

/// Calendar months in chronological order.
pub fn monthly_profile(series: &TimeSeries) -> Vec<PeriodValue> {
    profile(
        series,
        |d| (d.year(), d.month()),
        |&(y, m): &(i32, u32)| format!("{y:04}-{m:02}"),
    )
}

/// Weekdays, Monday first.
pub fn weekday_profile(series: &TimeSeries) -> Vec<PeriodValue> {
    profile(
        series,
        |d| d.weekday().num_days_from_monday(),
        |&n: &u32| WEEKDAYS[n as usize].to_string(),
    )
}

/// Highest period; ties go to the earliest.
pub fn peak(periods: &[PeriodValue]) -> Option<&PeriodValue> {
    periods
        .iter()
        .fold(None, |best: Option<&PeriodValue>, p| match best {
            Some(b) if b.value >= p.value => Some(b),
            _ => Some(p),
        })
}

/// Lowest period; ties go to the earliest.
pub fn trough(periods: &[PeriodValue]) -> Option<&PeriodValue> {
    periods
        .iter()
        .fold(None, |best: Option<&PeriodValue>, p| match best {
            Some(b) if b.value <= p.value => Some(b),
            _ => Some(p),
        })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn d(m: u32, day: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(2025, m, day).unwrap()
    }

    #[test]
    fn test_monthly_means_and_extremes() {
        let series = TimeSeries::new(vec![
            (d(3, 1), 10.0),
            (d(3, 2), 30.0),
            (d(4, 1), 20.0),
            (d(5, 1), 20.0),
            (d(6, 1), 5.0),
        ]);
        let months = monthly_profile(&series);
        assert_eq!(months.len(), 4);
        assert_eq!(months[0].period, "2025-03");
        assert_eq!(months[0].days, 2);
        assert_eq!(months[0].value, 20.0);
        // March, April and May tie at 20; the earliest wins.
        assert_eq!(peak(&months).unwrap().period, "2025-03");
        assert_eq!(trough(&months).unwrap().period, "2025-06");
    }

    #[test]
    fn test_weekday_profile() {
        // 2025-03-03 is a Monday.
        let series = TimeSeries::new(vec![(d(3, 3), 4.0), (d(3, 10), 8.0), (d(3, 4), 1.0)]);
        let days = weekday_profile(&series);
        assert_eq!(days[0].period, "Mon");
        assert_eq!(days[0].value, 6.0);
        assert_eq!(days[1].period, "Tue");
        assert_eq!(peak(&days).unwrap().period, "Mon");
    }

    #[test]
    fn test_empty_profile() {
        let empty = TimeSeries::new(Vec::new());
        assert!(monthly_profile(&empty).is_empty());
        assert_eq!(peak(&[]), None);
    }
}
