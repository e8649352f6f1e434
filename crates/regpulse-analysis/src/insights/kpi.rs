//! Headline figures across the three families.

use std::collections::BTreeSet;

use chrono::NaiveDate;
use regpulse_core::types::Dataset;
use regpulse_core::Family;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FamilyKpi {
    pub family: Family,
    pub rows: usize,
    pub total: u64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct KpiSummary {
    pub families: Vec<FamilyKpi>,
    /// Distinct states seen in any family.
    pub states_covered: usize,
    /// Earliest and latest date across every family.
    pub date_range: Option<(NaiveDate, NaiveDate)>,
}

impl KpiSummary {
    pub fn get(&self, family: Family) -> Option<&FamilyKpi> {
        self.families.iter().find(|k| k.family == family)
    }
}

pub fn kpis(dataset: &Dataset) -> KpiSummary {
    let families = dataset
        .tables()
        .into_iter()
        .map(|t| FamilyKpi {
            family: t.family(),
            rows: t.len(),
            total: t.grand_total(),
        })
        .collect();

    let states: BTreeSet<&str> = dataset.tables().into_iter().flat_map(|t| t.states()).collect();

    let date_range = dataset
        .tables()
        .into_iter()
        .filter_map(|t| t.date_range())
        .reduce(|(lo, hi), (a, b)| (lo.min(a), hi.max(b)));

    KpiSummary {
        families,
        states_covered: states.len(),
        date_range,
    }
}
