//! Descriptive insights built on aggregates: headline KPIs, rankings,
//! cross-family service ratios, and high-variance groups.

pub mod kpi;
pub mod ranking;
pub mod ratios;
pub mod variance;

pub use kpi::{kpis, FamilyKpi, KpiSummary};
pub use ranking::{top_n, RankedGroup};
pub use ratios::{adult_share, service_ratios, ServiceRatios};
pub use variance::{high_variance_groups, HighVarianceGroups};
