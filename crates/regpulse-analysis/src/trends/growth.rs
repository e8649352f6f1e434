//! Period-over-period growth.

/// `(v[t] - v[t-1]) / v[t-1]` per step; `None` where `v[t-1]` is 0.
pub fn growth_rates(values: &[f64]) -> Vec<Option<f64>> {
    values
        .windows(2)
        .map(|w| (w[0] != 0.0).then(|| (w[1] - w[0]) / w[0]))
        .collect()
}

/// Arithmetic mean of the defined rates.
pub fn average_growth(rates: &[Option<f64>]) -> Option<f64> {
    let defined: Vec<f64> = rates.iter().flatten().copied().collect();
    crate::stats::mean(&defined)
}

pub fn naive_forecast(last: f64, average_growth: Option<f64>) -> Option<f64> {
    average_growth.map(|g| last * (1.0 + g))
}
