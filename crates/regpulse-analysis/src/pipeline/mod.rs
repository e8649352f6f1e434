//! Batch driver: every artifact computed side by side over one read-only
//! dataset.
//!
//! Artifacts share nothing but the input, so each runs as its own rayon
//! task and the run joins once at the end. A wall-clock deadline is
//! checked cooperatively; an artifact that overruns it is dropped whole
//! and recorded as a budget failure, like any other per-artifact error.

pub mod report;

pub use report::{AdultShares, AnalyticsReport, ArtifactFailure};

use std::sync::Mutex;
use std::time::Instant;

use regpulse_core::config::RegpulseConfig;
use regpulse_core::errors::{AnalysisError, AnalysisResult};
use regpulse_core::traits::{Cancellable, Deadline};
use regpulse_core::types::Dataset;
use regpulse_core::{Family, KeyField};
use tracing::{info, warn};

use crate::aggregation::{aggregate, aggregate_with, AggregateOptions, AggregateTable};
use crate::clustering::{self, ClusterParams};
use crate::correlation;
use crate::insights;
use crate::outliers::{iqr, isolation, FeatureMatrix, IsolationParams};
use crate::trends;

/// Runs the full analytic suite with the settings of a [`RegpulseConfig`].
#[derive(Debug, Clone, Default)]
pub struct AnalyticsPipeline {
    config: RegpulseConfig,
}

impl AnalyticsPipeline {
    pub fn new(config: RegpulseConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &RegpulseConfig {
        &self.config
    }

    /// Run every artifact under the configured time budget.
    pub fn run(&self, dataset: &Dataset) -> AnalyticsReport {
        let deadline = Deadline::new(self.config.runtime.effective_time_budget());
        self.run_with_deadline(dataset, &deadline)
    }

    /// Run every artifact under a caller-owned deadline, which the caller
    /// may also cancel.
    pub fn run_with_deadline(&self, dataset: &Dataset, deadline: &Deadline) -> AnalyticsReport {
        let started = Instant::now();
        let report = match self.build_pool() {
            Some(pool) => pool.install(|| self.run_all(dataset, deadline)),
            None => self.run_all(dataset, deadline),
        };
        let report = AnalyticsReport {
            elapsed_ms: started.elapsed().as_millis() as u64,
            ..report
        };
        info!(
            elapsed_ms = report.elapsed_ms,
            failures = report.failures.len(),
            "analytics run complete"
        );
        report
    }

    fn build_pool(&self) -> Option<rayon::ThreadPool> {
        let threads = self.config.runtime.effective_threads();
        if threads == 0 {
            return None;
        }
        match rayon::ThreadPoolBuilder::new()
            .num_threads(threads)
            .thread_name(|i| format!("regpulse-{i}"))
            .build()
        {
            Ok(pool) => Some(pool),
            Err(e) => {
                warn!(error = %e, threads, "falling back to the global rayon pool");
                None
            }
        }
    }

    fn run_all(&self, dataset: &Dataset, deadline: &Deadline) -> AnalyticsReport {
        let runner = ArtifactRunner {
            deadline,
            failures: Mutex::new(Vec::new()),
        };
        let mut report = AnalyticsReport::default();
        let AnalyticsReport {
            kpis,
            service_ratios,
            adult_shares: shares,
            state_aggregates: by_state,
            region_aggregates: by_region,
            top_states,
            high_variance_regions,
            iqr_outliers,
            isolation_outliers,
            clusters,
            correlation,
            enrollment_trend,
            ..
        } = &mut report;
        let runner_ref = &runner;
        rayon::scope(|s| {
            let runner = runner_ref;
            s.spawn(move |_| *kpis = runner.run("kpis", |_| Ok(insights::kpis(dataset))));
            s.spawn(move |_| {
                *service_ratios =
                    runner.run("service_ratios", |_| Ok(insights::service_ratios(dataset)))
            });
            s.spawn(move |_| *shares = runner.run("adult_shares", |_| Ok(adult_shares(dataset))));
            s.spawn(move |_| {
                *by_state = runner.run("state_aggregates", |_| state_aggregates(dataset))
            });
            s.spawn(move |_| {
                *by_region = runner.run("region_aggregates", |_| region_aggregates(dataset))
            });
            s.spawn(move |_| *top_states = runner.run("top_states", |_| self.top_states(dataset)));
            s.spawn(move |_| {
                *high_variance_regions =
                    runner.run("high_variance_regions", |_| self.high_variance(dataset))
            });
            s.spawn(move |_| *iqr_outliers = runner.run("iqr_outliers", |_| self.iqr(dataset)));
            s.spawn(move |_| {
                *isolation_outliers =
                    runner.run("isolation_outliers", |cancel| self.isolation(dataset, cancel))
            });
            s.spawn(move |_| {
                *clusters = runner.run("clusters", |cancel| self.clusters(dataset, cancel))
            });
            s.spawn(move |_| {
                *correlation = runner.run("correlation", |_| self.correlation(dataset))
            });
            s.spawn(move |_| {
                *enrollment_trend = runner.run("enrollment_trend", |_| {
                    let series =
                        trends::daily_series(&dataset.enrollment, Family::Enrollment.total_name())?;
                    trends::trend(&series)
                })
            });
        });

        let mut failures = runner.failures.into_inner().unwrap_or_else(|p| p.into_inner());
        failures.sort_by(|a, b| a.artifact.cmp(&b.artifact));
        report.failures = failures;
        report
    }

    fn top_states(&self, dataset: &Dataset) -> AnalysisResult<Vec<insights::RankedGroup>> {
        let metric = Family::Enrollment.total_name();
        let by_state = aggregate(&dataset.enrollment, &[KeyField::State], &[metric])?;
        Ok(insights::top_n(&by_state, metric, self.config.analysis.effective_top_n())?)
    }

    fn high_variance(&self, dataset: &Dataset) -> AnalysisResult<insights::HighVarianceGroups> {
        let metric = Family::Enrollment.total_name();
        let by_region = aggregate(
            &dataset.enrollment,
            &[KeyField::State, KeyField::District],
            &[metric],
        )?;
        insights::high_variance_groups(
            &by_region,
            metric,
            self.config.analysis.effective_high_variance_quantile(),
        )
    }

    fn iqr(&self, dataset: &Dataset) -> AnalysisResult<iqr::IqrReport> {
        iqr::detect_column(
            &dataset.enrollment,
            Family::Enrollment.total_name(),
            self.config.analysis.effective_iqr_multiplier(),
        )
    }

    fn isolation(
        &self,
        dataset: &Dataset,
        cancel: &dyn Cancellable,
    ) -> AnalysisResult<isolation::IsolationReport> {
        let matrix = FeatureMatrix::for_table(&dataset.enrollment)?;
        isolation::detect(&matrix, &IsolationParams::from_config(&self.config.analysis), cancel)
    }

    fn clusters(
        &self,
        dataset: &Dataset,
        cancel: &dyn Cancellable,
    ) -> AnalysisResult<clustering::ClusterResult> {
        let profile = clustering::region_features(&dataset.enrollment)?;
        clustering::cluster_on(
            &profile,
            &clustering::clustering_columns(dataset.enrollment.family()),
            &ClusterParams::from_config(&self.config.analysis),
            cancel,
        )
    }

    fn correlation(&self, dataset: &Dataset) -> AnalysisResult<correlation::CorrelationReport> {
        let keys = [KeyField::State, KeyField::Date];
        let tables = dataset
            .tables()
            .into_iter()
            .map(|t| {
                let metrics = t.metric_names();
                let metrics: Vec<&str> = metrics.iter().map(String::as_str).collect();
                aggregate(t, &keys, &metrics)
            })
            .collect::<AnalysisResult<Vec<AggregateTable>>>()?;
        let refs: Vec<&AggregateTable> = tables.iter().collect();
        correlation::correlate_with_threshold(
            &refs,
            &keys,
            self.config.analysis.effective_correlation_threshold(),
        )
    }
}

fn adult_shares(dataset: &Dataset) -> AdultShares {
    AdultShares {
        shares: dataset
            .tables()
            .into_iter()
            .map(|t| (t.family(), insights::adult_share(t)))
            .collect(),
    }
}

fn state_aggregates(dataset: &Dataset) -> AnalysisResult<Vec<AggregateTable>> {
    dataset
        .tables()
        .into_iter()
        .map(|t| {
            let metrics = t.metric_names();
            let metrics: Vec<&str> = metrics.iter().map(String::as_str).collect();
            aggregate_with(
                t,
                &[KeyField::State],
                &metrics,
                &AggregateOptions::with_distinct(&[KeyField::District]),
            )
        })
        .collect()
}

fn region_aggregates(dataset: &Dataset) -> AnalysisResult<AggregateTable> {
    let t = &dataset.enrollment;
    let metrics = t.metric_names();
    let metrics: Vec<&str> = metrics.iter().map(String::as_str).collect();
    aggregate_with(
        t,
        &[KeyField::State, KeyField::District],
        &metrics,
        &AggregateOptions::with_distinct(&[KeyField::Pincode, KeyField::Date]),
    )
}

/// Runs one artifact, records its failure, and enforces the deadline.
struct ArtifactRunner<'a> {
    deadline: &'a Deadline,
    failures: Mutex<Vec<ArtifactFailure>>,
}

impl ArtifactRunner<'_> {
    fn run<T>(
        &self,
        artifact: &str,
        compute: impl FnOnce(&dyn Cancellable) -> AnalysisResult<T>,
    ) -> Option<T> {
        let started = Instant::now();
        let result = if self.deadline.is_cancelled() {
            Err(AnalysisError::Cancelled)
        } else {
            compute(self.deadline)
        };
        // Finishing after the budget ran out still discards the artifact.
        let result = match result {
            Ok(_) | Err(AnalysisError::Cancelled) if self.deadline.is_expired() => {
                Err(AnalysisError::BudgetExceeded {
                    budget_ms: self.deadline.budget().as_millis() as u64,
                })
            }
            other => other,
        };

        let elapsed_ms = started.elapsed().as_millis() as u64;
        match result {
            Ok(value) => {
                info!(artifact, elapsed_ms, "artifact computed");
                Some(value)
            }
            Err(error) => {
                if error.is_insufficient() {
                    warn!(artifact, %error, "artifact not computable");
                } else {
                    warn!(artifact, %error, elapsed_ms, "artifact failed");
                }
                let failure = ArtifactFailure::new(artifact, error);
                match self.failures.lock() {
                    Ok(mut failures) => failures.push(failure),
                    Err(poisoned) => poisoned.into_inner().push(failure),
                }
                None
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;
    use regpulse_core::{Record, RecordTable, Region};
    use std::time::Duration;

    fn dataset() -> Dataset {
        let mut bio = Vec::new();
        let mut demo = Vec::new();
        let mut enroll = Vec::new();
        for (s, state) in ["Assam", "Bihar", "Goa"].iter().enumerate() {
            for district in 0..4u64 {
                for day in 1..=6u32 {
                    let date = NaiveDate::from_ymd_opt(2025, 3, day).unwrap();
                    let region = Region::new(*state, format!("D{district}"));
                    let base = (s as u64 + 1) * 10 + district * 3 + day as u64;
                    bio.push(Record::with_counts(region.clone(), date, &[base, base * 2]));
                    demo.push(Record::with_counts(region.clone(), date, &[base / 2, base]));
                    enroll.push(Record::with_counts(region, date, &[base % 7, base, base * 3]));
                }
            }
        }
        Dataset::new(
            RecordTable::new(Family::Biometric, bio).unwrap(),
            RecordTable::new(Family::Demographic, demo).unwrap(),
            RecordTable::new(Family::Enrollment, enroll).unwrap(),
        )
    }

    #[test]
    fn test_full_run_produces_every_artifact() {
        let report = AnalyticsPipeline::default().run(&dataset());
        assert!(report.is_clean(), "failures: {:?}", report.failures);
        assert!(report.kpis.is_some());
        assert_eq!(report.state_aggregates.as_ref().unwrap().len(), 3);
        assert_eq!(report.clusters.as_ref().unwrap().assignments.len(), 12);
        assert_eq!(report.isolation_outliers.as_ref().unwrap().outlier_indices().len(), 7);
        assert!(report.enrollment_trend.is_some());
        assert!(report.to_json().unwrap().contains("\"correlation\""));
    }

    #[test]
    fn test_failed_artifact_does_not_stop_others() {
        let report = AnalyticsPipeline::default().run(&Dataset::new(
            RecordTable::empty(Family::Biometric),
            RecordTable::empty(Family::Demographic),
            RecordTable::empty(Family::Enrollment),
        ));
        assert!(report.failure("iqr_outliers").unwrap().error.is_insufficient());
        assert!(report.failure("clusters").is_some());
        assert!(report.kpis.is_some());
        assert!(report.state_aggregates.is_some());
    }

    #[test]
    fn test_expired_budget_discards_artifacts() {
        let deadline = Deadline::new(Duration::ZERO);
        std::thread::sleep(Duration::from_millis(2));
        let report = AnalyticsPipeline::default().run_with_deadline(&dataset(), &deadline);
        assert!(report.clusters.is_none());
        assert!(matches!(
            report.failure("clusters").unwrap().error,
            AnalysisError::BudgetExceeded { .. }
        ));
    }

    #[test]
    fn test_cancelled_run() {
        let deadline = Deadline::new(Duration::from_secs(3600));
        deadline.cancel();
        let report = AnalyticsPipeline::default().run_with_deadline(&dataset(), &deadline);
        assert_eq!(report.failures.len(), 12);
        assert!(report
            .failures
            .iter()
            .all(|f| f.error == AnalysisError::Cancelled));
    }
}
