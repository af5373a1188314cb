//! Monitoring Pipeline
//!
//! Wires the library crates into the full flow: measurements feed a
//! per-subject baseline window, then the deviation detector; sustained trends
//! become alerts, alerts fan out to recipients, and clinician reviews close
//! the loop through the accuracy monitor, whose meta-alerts re-enter the same
//! notification path.

mod config;
mod context;
mod monitor;
mod telemetry;

pub use config::MonitorConfig;
pub use context::{IngestOutcome, SubjectContext};
pub use monitor::SubjectMonitor;
pub use telemetry::init_logging;

use thiserror::Error;

/// Pipeline-level errors surfaced to the ingestion and review surfaces
#[derive(Debug, Error)]
pub enum PipelineError {
    #[error(transparent)]
    Measurement(#[from] measurement::MeasurementError),

    #[error(transparent)]
    Baseline(#[from] baseline::BaselineError),

    #[error(transparent)]
    Deviation(#[from] deviation::DeviationError),

    #[error(transparent)]
    Alert(#[from] alerting::AlertError),

    #[error(transparent)]
    Accuracy(#[from] accuracy::AccuracyError),

    /// Estimated baseline failed the quality guard and was not accepted
    #[error("baseline for subject {0} failed quality validation")]
    BaselineRejected(String),
}
