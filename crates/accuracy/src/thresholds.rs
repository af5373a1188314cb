//! Threshold policy over accuracy metrics

use crate::metrics::AccuracyMetrics;
use crate::AccuracyError;
use serde::{Deserialize, Serialize};

/// Which metric a threshold or breach refers to
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum MetricKind {
    Sensitivity,
    FalsePositiveRate,
    Specificity,
    Ppv,
}

impl MetricKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            MetricKind::Sensitivity => "sensitivity",
            MetricKind::FalsePositiveRate => "false_positive_rate",
            MetricKind::Specificity => "specificity",
            MetricKind::Ppv => "ppv",
        }
    }
}

impl std::fmt::Display for MetricKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Which side of its bound a metric crossed
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum BreachDirection {
    /// A minimum-bound metric fell under its floor
    Below,
    /// The maximum-bound metric rose over its ceiling
    Above,
}

/// One policy breach
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ThresholdBreach {
    pub metric: MetricKind,
    pub direction: BreachDirection,
    pub value: f64,
    pub threshold: f64,
}

/// Quality policy bounds. All thresholds live in [0, 1].
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ThresholdConfig {
    pub min_sensitivity: f64,
    pub max_false_positive_rate: f64,
    pub min_specificity: f64,
    pub min_ppv: f64,
}

impl Default for ThresholdConfig {
    fn default() -> Self {
        Self {
            min_sensitivity: 0.8,
            max_false_positive_rate: 0.2,
            min_specificity: 0.8,
            min_ppv: 0.8,
        }
    }
}

impl ThresholdConfig {
    fn validate(&self) -> Result<(), AccuracyError> {
        let bounds = [
            (MetricKind::Sensitivity, self.min_sensitivity),
            (MetricKind::FalsePositiveRate, self.max_false_positive_rate),
            (MetricKind::Specificity, self.min_specificity),
            (MetricKind::Ppv, self.min_ppv),
        ];
        for (metric, value) in bounds {
            if !(0.0..=1.0).contains(&value) || !value.is_finite() {
                return Err(AccuracyError::InvalidThresholdConfig { metric, value });
            }
        }
        Ok(())
    }
}

/// Compare metrics against policy; an empty result means all within policy.
pub fn check_thresholds(
    metrics: &AccuracyMetrics,
    config: &ThresholdConfig,
) -> Result<Vec<ThresholdBreach>, AccuracyError> {
    config.validate()?;

    let mut breaches = Vec::new();
    if metrics.sensitivity < config.min_sensitivity {
        breaches.push(ThresholdBreach {
            metric: MetricKind::Sensitivity,
            direction: BreachDirection::Below,
            value: metrics.sensitivity,
            threshold: config.min_sensitivity,
        });
    }
    if metrics.false_positive_rate > config.max_false_positive_rate {
        breaches.push(ThresholdBreach {
            metric: MetricKind::FalsePositiveRate,
            direction: BreachDirection::Above,
            value: metrics.false_positive_rate,
            threshold: config.max_false_positive_rate,
        });
    }
    if metrics.specificity < config.min_specificity {
        breaches.push(ThresholdBreach {
            metric: MetricKind::Specificity,
            direction: BreachDirection::Below,
            value: metrics.specificity,
            threshold: config.min_specificity,
        });
    }
    if metrics.ppv < config.min_ppv {
        breaches.push(ThresholdBreach {
            metric: MetricKind::Ppv,
            direction: BreachDirection::Below,
            value: metrics.ppv,
            threshold: config.min_ppv,
        });
    }
    Ok(breaches)
}
