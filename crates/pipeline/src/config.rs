//! Pipeline configuration

use accuracy::ThresholdConfig;
use deviation::DetectorConfig;
use notification::RetryPolicy;
use serde::{Deserialize, Serialize};

/// Top-level monitoring configuration.
///
/// Loaded from an optional file layered under `NEUROWATCH_`-prefixed
/// environment overrides; every section falls back to its crate default.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct MonitorConfig {
    /// Deviation detector thresholds
    #[serde(default)]
    pub detector: DetectorConfig,

    /// Dispatch-unit retry policy
    #[serde(default)]
    pub retry: RetryPolicy,

    /// Accuracy policy bounds for meta-alerting
    #[serde(default)]
    pub thresholds: ThresholdConfig,
}

impl MonitorConfig {
    /// Load configuration from `path` (optional) plus environment overrides
    /// such as `NEUROWATCH_DETECTOR__DEVIATION_THRESHOLD=2.5`.
    pub fn load(path: Option<&str>) -> Result<Self, ::config::ConfigError> {
        let mut builder = ::config::Config::builder();
        if let Some(path) = path {
            builder = builder.add_source(::config::File::with_name(path).required(false));
        }
        builder
            .add_source(
                ::config::Environment::with_prefix("NEUROWATCH")
                    .separator("__")
                    .try_parsing(true),
            )
            .build()?
            .try_deserialize()
    }
}
