//! Baseline Estimation
//!
//! Converts a subject's initial window of assessments into a per-modality
//! statistical baseline (mean, population standard deviation, min/max).
//! Baselines are immutable once created; re-estimation produces a new value.

mod estimator;
mod types;

pub use estimator::{validate_baseline_quality, BaselineEstimator, MIN_BASELINE_SAMPLES};
pub use types::{Baseline, MetricBaseline};

use measurement::Modality;
use thiserror::Error;

/// Baseline estimation errors
#[derive(Debug, Clone, Error)]
pub enum BaselineError {
    /// No measurements supplied at all
    #[error("no measurements supplied for baseline estimation")]
    EmptyInput,

    /// Fewer measurements than the qualifying window requires
    #[error("insufficient samples for baseline: got {got}, need {required}")]
    InsufficientSamples { got: usize, required: usize },

    /// Non-finite reading in the input window
    #[error("non-finite {modality} value {value} in baseline window")]
    NumericInstability { modality: Modality, value: f64 },
}
