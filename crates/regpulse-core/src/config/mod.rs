//! Configuration system for regpulse.
//! TOML-based, layered resolution: CLI > env > project > user > defaults.

pub mod analysis_config;
pub mod ingest_config;
pub mod regpulse_config;
pub mod runtime_config;

pub use analysis_config::AnalysisConfig;
pub use ingest_config::IngestConfig;
pub use regpulse_config::{CliOverrides, RegpulseConfig};
pub use runtime_config::RuntimeConfig;
