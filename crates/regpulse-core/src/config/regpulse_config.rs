//! Top-level regpulse configuration with layered resolution.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use super::{AnalysisConfig, IngestConfig, RuntimeConfig};
use crate::errors::ConfigError;

/// Top-level configuration aggregating all sub-configs.
///
/// Resolution order (highest priority first):
/// 1. CLI flags (applied via `apply_cli_overrides`)
/// 2. Environment variables (`REGPULSE_*`)
/// 3. Project config (`regpulse.toml` in project root)
/// 4. User config (`~/.regpulse/config.toml`)
/// 5. Compiled defaults
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
#[serde(default)]
pub struct RegpulseConfig {
    pub analysis: AnalysisConfig,
    pub ingest: IngestConfig,
    pub runtime: RuntimeConfig,
}

/// Override arguments supplied by a batch driver's command line.
#[derive(Debug, Clone, Default)]
pub struct CliOverrides {
    pub seed: Option<u64>,
    pub cluster_k: Option<usize>,
    pub contamination: Option<f64>,
    pub threads: Option<usize>,
    pub time_budget_ms: Option<u64>,
}

impl RegpulseConfig {
    /// Load configuration with layered resolution rooted at `root`.
    pub fn load(root: &Path, cli_overrides: Option<&CliOverrides>) -> Result<Self, ConfigError> {
        let mut config = Self::default();

        // Layer 4 (lowest priority): user config
        if let Some(user_config_path) = Self::user_config_path() {
            if user_config_path.exists() {
                match Self::merge_toml_file(&mut config, &user_config_path) {
                    Ok(()) => {}
                    Err(e @ ConfigError::ParseError { .. }) => return Err(e),
                    Err(e) => {
                        tracing::warn!(error = %e, "ignoring unreadable user config");
                    }
                }
            }
        }

        // Layer 3: project config
        let project_config_path = root.join("regpulse.toml");
        if project_config_path.exists() {
            Self::merge_toml_file(&mut config, &project_config_path)?;
        }

        // Layer 2: environment variables
        Self::apply_env_overrides(&mut config);

        // Layer 1 (highest priority): CLI flags
        if let Some(cli) = cli_overrides {
            Self::apply_cli_overrides(&mut config, cli);
        }

        Self::validate(&config)?;

        Ok(config)
    }

    /// Load configuration from a TOML string.
    pub fn from_toml(toml_str: &str) -> Result<Self, ConfigError> {
        let config: Self = toml::from_str(toml_str).map_err(|e| ConfigError::ParseError {
            path: "<string>".to_string(),
            message: e.to_string(),
        })?;
        Self::validate(&config)?;
        Ok(config)
    }

    /// Validate the configuration values.
    pub fn validate(config: &RegpulseConfig) -> Result<(), ConfigError> {
        let analysis = &config.analysis;
        if let Some(c) = analysis.contamination {
            if !(c > 0.0 && c <= 0.5) {
                return Err(invalid("analysis.contamination", "must be in (0.0, 0.5]"));
            }
        }
        if let Some(m) = analysis.iqr_multiplier {
            if !(m > 0.0 && m.is_finite()) {
                return Err(invalid("analysis.iqr_multiplier", "must be a positive number"));
            }
        }
        if analysis.cluster_k == Some(0) {
            return Err(invalid("analysis.cluster_k", "must be at least 1"));
        }
        if analysis.n_trees == Some(0) {
            return Err(invalid("analysis.n_trees", "must be at least 1"));
        }
        if analysis.max_samples.is_some_and(|s| s < 2) {
            return Err(invalid("analysis.max_samples", "must be at least 2"));
        }
        if analysis.max_iterations == Some(0) {
            return Err(invalid("analysis.max_iterations", "must be at least 1"));
        }
        if let Some(t) = analysis.correlation_threshold {
            if !(0.0..=1.0).contains(&t) {
                return Err(invalid("analysis.correlation_threshold", "must be between 0.0 and 1.0"));
            }
        }
        if let Some(q) = analysis.high_variance_quantile {
            if !(0.0..=1.0).contains(&q) {
                return Err(invalid("analysis.high_variance_quantile", "must be between 0.0 and 1.0"));
            }
        }
        if config.runtime.time_budget_ms == Some(0) {
            return Err(invalid("runtime.time_budget_ms", "must be greater than 0"));
        }
        Ok(())
    }

    /// Returns the user config path: `~/.regpulse/config.toml`.
    fn user_config_path() -> Option<PathBuf> {
        home_dir().map(|h| h.join(".regpulse").join("config.toml"))
    }

    /// Merge a TOML file into the existing config.
    /// Unknown keys are silently ignored (forward-compatible).
    fn merge_toml_file(config: &mut RegpulseConfig, path: &Path) -> Result<(), ConfigError> {
        let content = std::fs::read_to_string(path).map_err(|_| ConfigError::FileNotFound {
            path: path.display().to_string(),
        })?;

        let file_config: RegpulseConfig =
            toml::from_str(&content).map_err(|e| ConfigError::ParseError {
                path: path.display().to_string(),
                message: e.to_string(),
            })?;

        Self::merge(config, &file_config);
        Ok(())
    }

    /// Merge `other` into `base`; `other` wins wherever it holds a value.
    fn merge(base: &mut RegpulseConfig, other: &RegpulseConfig) {
        let (b, o) = (&mut base.analysis, &other.analysis);
        merge_opt(&mut b.iqr_multiplier, o.iqr_multiplier);
        merge_opt(&mut b.contamination, o.contamination);
        merge_opt(&mut b.n_trees, o.n_trees);
        merge_opt(&mut b.max_samples, o.max_samples);
        merge_opt(&mut b.seed, o.seed);
        merge_opt(&mut b.cluster_k, o.cluster_k);
        merge_opt(&mut b.max_iterations, o.max_iterations);
        merge_opt(&mut b.correlation_threshold, o.correlation_threshold);
        merge_opt(&mut b.high_variance_quantile, o.high_variance_quantile);
        merge_opt(&mut b.top_n, o.top_n);

        let (b, o) = (&mut base.ingest, &other.ingest);
        if o.date_format.is_some() {
            b.date_format = o.date_format.clone();
        }
        for (dst, src) in [
            (&mut b.biometric_files, &o.biometric_files),
            (&mut b.demographic_files, &o.demographic_files),
            (&mut b.enrollment_files, &o.enrollment_files),
        ] {
            if !src.is_empty() {
                *dst = src.clone();
            }
        }

        merge_opt(&mut base.runtime.threads, other.runtime.threads);
        merge_opt(&mut base.runtime.time_budget_ms, other.runtime.time_budget_ms);
    }

    /// Apply environment variable overrides.
    /// Pattern: `REGPULSE_ANALYSIS_SEED`, `REGPULSE_RUNTIME_THREADS`, etc.
    fn apply_env_overrides(config: &mut RegpulseConfig) {
        env_parse("REGPULSE_ANALYSIS_SEED", &mut config.analysis.seed);
        env_parse("REGPULSE_ANALYSIS_CLUSTER_K", &mut config.analysis.cluster_k);
        env_parse("REGPULSE_ANALYSIS_CONTAMINATION", &mut config.analysis.contamination);
        env_parse("REGPULSE_ANALYSIS_IQR_MULTIPLIER", &mut config.analysis.iqr_multiplier);
        env_parse("REGPULSE_ANALYSIS_N_TREES", &mut config.analysis.n_trees);
        env_parse(
            "REGPULSE_ANALYSIS_CORRELATION_THRESHOLD",
            &mut config.analysis.correlation_threshold,
        );
        env_parse("REGPULSE_RUNTIME_THREADS", &mut config.runtime.threads);
        env_parse("REGPULSE_RUNTIME_TIME_BUDGET_MS", &mut config.runtime.time_budget_ms);
        if let Ok(val) = std::env::var("REGPULSE_INGEST_DATE_FORMAT") {
            config.ingest.date_format = Some(val);
        }
    }

    /// Apply CLI overrides (highest priority).
    fn apply_cli_overrides(config: &mut RegpulseConfig, cli: &CliOverrides) {
        merge_opt(&mut config.analysis.seed, cli.seed);
        merge_opt(&mut config.analysis.cluster_k, cli.cluster_k);
        merge_opt(&mut config.analysis.contamination, cli.contamination);
        merge_opt(&mut config.runtime.threads, cli.threads);
        merge_opt(&mut config.runtime.time_budget_ms, cli.time_budget_ms);
    }

    /// Serialize the config back to TOML.
    pub fn to_toml(&self) -> Result<String, ConfigError> {
        toml::to_string_pretty(self).map_err(|e| ConfigError::ParseError {
            path: "<serialization>".to_string(),
            message: e.to_string(),
        })
    }
}

fn invalid(field: &str, message: &str) -> ConfigError {
    ConfigError::ValidationFailed {
        field: field.to_string(),
        message: message.to_string(),
    }
}

fn merge_opt<T: Copy>(base: &mut Option<T>, other: Option<T>) {
    if other.is_some() {
        *base = other;
    }
}

/// Unparseable values are ignored, leaving the lower layer in place.
fn env_parse<T: std::str::FromStr>(key: &str, slot: &mut Option<T>) {
    if let Ok(val) = std::env::var(key) {
        if let Ok(v) = val.parse::<T>() {
            *slot = Some(v);
        }
    }
}

/// Cross-platform home directory resolution.
fn home_dir() -> Option<PathBuf> {
    std::env::var_os("HOME")
        .or_else(|| std::env::var_os("USERPROFILE"))
        .map(PathBuf::from)
}
