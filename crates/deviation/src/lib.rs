//! Deviation Detection
//!
//! Scores each new measurement against the subject's baseline (in baseline
//! standard deviations) and aggregates per-modality deviation runs over
//! consecutive assessment days into a severity-classified trend.

mod config;
mod detector;
mod types;

pub use config::DetectorConfig;
pub use detector::DeviationDetector;
pub use types::{Deviation, Severity, TrendAnalysis, UNBOUNDED_SIGMA};

use measurement::{MeasurementError, Modality};
use thiserror::Error;

/// Deviation scoring errors
#[derive(Debug, Clone, Error)]
pub enum DeviationError {
    /// Non-finite reading in the incoming measurement
    #[error(transparent)]
    NumericInstability(#[from] MeasurementError),

    /// Measurement belongs to a different subject than the baseline
    #[error("measurement subject {got} does not match baseline subject {expected}")]
    SubjectMismatch { expected: String, got: String },

    /// Baseline carries a non-finite or negative statistic for a modality
    #[error("baseline for {modality} is unusable")]
    UnusableBaseline { modality: Modality },
}
