//! Per-subject processing context

use crate::PipelineError;
use baseline::{validate_baseline_quality, Baseline, BaselineEstimator, MIN_BASELINE_SAMPLES};
use deviation::{DetectorConfig, DeviationDetector, TrendAnalysis};
use measurement::{validate_measurement, Measurement};
use tracing::{debug, info};

/// What one ingested measurement produced
#[derive(Debug)]
pub enum IngestOutcome {
    /// Still inside the baseline window
    Collecting { have: usize, need: usize },
    /// The window just completed and a baseline was accepted
    BaselineEstablished,
    /// Scored against the baseline; no sustained trend
    Normal,
    /// Scored against the baseline; a sustained trend materialized
    Trend(TrendAnalysis),
}

/// Owns one subject's baseline window and detector.
///
/// No cross-subject state: each context is exclusively owned by its subject's
/// processing path.
pub struct SubjectContext {
    subject_id: String,
    detector_config: DetectorConfig,
    window: Vec<Measurement>,
    detector: Option<DeviationDetector>,
}

impl SubjectContext {
    pub fn new(subject_id: impl Into<String>, detector_config: DetectorConfig) -> Self {
        Self {
            subject_id: subject_id.into(),
            detector_config,
            window: Vec::with_capacity(MIN_BASELINE_SAMPLES),
            detector: None,
        }
    }

    pub fn subject_id(&self) -> &str {
        &self.subject_id
    }

    /// Established baseline, if the window has completed
    pub fn baseline(&self) -> Option<&Baseline> {
        self.detector.as_ref().map(|d| d.baseline())
    }

    /// Feed one measurement through the context.
    ///
    /// During the baseline window measurements accumulate; the window's last
    /// measurement triggers estimation and the quality guard. Afterwards
    /// every measurement is scored and observed for trends. A rejected
    /// measurement never enters the window or the trend state.
    pub fn ingest(&mut self, measurement: &Measurement) -> Result<IngestOutcome, PipelineError> {
        validate_measurement(measurement)?;

        if let Some(detector) = self.detector.as_mut() {
            return match detector.observe(measurement)? {
                Some(trend) => Ok(IngestOutcome::Trend(trend)),
                None => Ok(IngestOutcome::Normal),
            };
        }

        self.window.push(measurement.clone());
        debug!(
            subject = %self.subject_id,
            have = self.window.len(),
            need = MIN_BASELINE_SAMPLES,
            "accumulating baseline window"
        );
        if self.window.len() < MIN_BASELINE_SAMPLES {
            return Ok(IngestOutcome::Collecting {
                have: self.window.len(),
                need: MIN_BASELINE_SAMPLES,
            });
        }

        let baseline = BaselineEstimator::estimate(&self.subject_id, &self.window)?;
        if !validate_baseline_quality(&baseline) {
            // Keep the window so a later re-estimation can succeed
            self.window.pop();
            return Err(PipelineError::BaselineRejected(self.subject_id.clone()));
        }
        info!(subject = %self.subject_id, "baseline established");
        self.detector = Some(DeviationDetector::new(baseline, self.detector_config.clone()));
        self.window.clear();
        Ok(IngestOutcome::BaselineEstablished)
    }
}
