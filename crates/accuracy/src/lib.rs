//! Accuracy Monitoring
//!
//! Records clinician-adjudicated outcomes for issued alerts and missed
//! detections, computes rolling quality metrics over the outcome log, and
//! raises meta-alerts when the detector's own quality drifts out of policy.

mod metrics;
mod monitor;
mod outcome;
mod thresholds;

pub use metrics::AccuracyMetrics;
pub use monitor::{AccuracyMonitor, MetaAlert};
pub use outcome::{AlertOutcome, OutcomeFilter, OutcomeKind, OutcomeLog};
pub use thresholds::{BreachDirection, MetricKind, ThresholdBreach, ThresholdConfig};

use thiserror::Error;

/// Accuracy subsystem errors
#[derive(Debug, Clone, Error)]
pub enum AccuracyError {
    /// Threshold outside the valid [0, 1] range
    #[error("invalid threshold config: {metric} = {value} is outside [0, 1]")]
    InvalidThresholdConfig { metric: MetricKind, value: f64 },
}
