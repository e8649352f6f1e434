//! Trend estimator over a date-ordered daily series.
//!
//! This is a naive baseline, not a time-series model: step growth rates,
//! their mean, one-step forecast `last * (1 + mean growth)`, and period
//! profiles with their peak and trough. No fitting of any kind.

pub mod growth;
pub mod profile;

pub use growth::{average_growth, growth_rates, naive_forecast};
pub use profile::{monthly_profile, weekday_profile, PeriodValue};

use regpulse_core::errors::{AnalysisError, AnalysisResult};
use regpulse_core::{KeyField, RecordTable};
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::aggregation::{aggregate, TimeSeries};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TrendSummary {
    /// One entry per step; `None` where the base value is 0.
    pub growth_rates: Vec<Option<f64>>,
    /// Mean of the defined growth rates.
    pub average_growth: Option<f64>,
    pub naive_forecast: Option<f64>,
    pub monthly: Vec<PeriodValue>,
    pub peak_month: Option<PeriodValue>,
    pub trough_month: Option<PeriodValue>,
    pub weekday: Vec<PeriodValue>,
    pub peak_weekday: Option<PeriodValue>,
}

/// Summarize a daily series.
pub fn trend(series: &TimeSeries) -> AnalysisResult<TrendSummary> {
    if series.is_empty() {
        return Err(AnalysisError::insufficient("trend", "empty series"));
    }
    let values = series.values();
    let growth_rates = growth_rates(&values);
    let average_growth = average_growth(&growth_rates);
    let naive_forecast = values.last().and_then(|&last| naive_forecast(last, average_growth));

    let monthly = monthly_profile(series);
    let weekday = weekday_profile(series);
    let summary = TrendSummary {
        peak_month: profile::peak(&monthly).cloned(),
        trough_month: profile::trough(&monthly).cloned(),
        peak_weekday: profile::peak(&weekday).cloned(),
        growth_rates,
        average_growth,
        naive_forecast,
        monthly,
        weekday,
    };
    debug!(
        points = series.len(),
        average_growth = ?summary.average_growth,
        "trend summarized"
    );
    Ok(summary)
}

/// Daily sums of `metric` on the days present in `table`.
pub fn daily_series(table: &RecordTable, metric: &str) -> AnalysisResult<TimeSeries> {
    let daily = aggregate(table, &[KeyField::Date], &[metric])?;
    Ok(daily.time_series(metric, false)?)
}
