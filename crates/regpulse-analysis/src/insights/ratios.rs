//! Service ratios between families.

use regpulse_core::types::Dataset;
use regpulse_core::RecordTable;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ServiceRatios {
    /// Biometric updates per new enrollment.
    pub biometric_per_enrollment: Option<f64>,
    /// Demographic updates per new enrollment.
    pub demographic_per_enrollment: Option<f64>,
}

fn ratio(numerator: u64, denominator: u64) -> Option<f64> {
    (denominator != 0).then(|| numerator as f64 / denominator as f64)
}

/// Undefined when the enrollment total is 0.
pub fn service_ratios(dataset: &Dataset) -> ServiceRatios {
    let enrolled = dataset.enrollment.grand_total();
    ServiceRatios {
        biometric_per_enrollment: ratio(dataset.biometric.grand_total(), enrolled),
        demographic_per_enrollment: ratio(dataset.demographic.grand_total(), enrolled),
    }
}

/// Adult category total over the family total.
pub fn adult_share(table: &RecordTable) -> Option<f64> {
    let adults = table.category_total(table.family().adult_category()).ok()?;
    ratio(adults, table.grand_total())
}
