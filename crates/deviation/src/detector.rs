//! Per-subject deviation detector and trend aggregation

use crate::config::DetectorConfig;
use crate::types::{Deviation, Severity, TrendAnalysis, UNBOUNDED_SIGMA};
use crate::DeviationError;
use baseline::Baseline;
use measurement::{validate_measurement, Measurement, Modality};
use std::collections::HashMap;
use tracing::{debug, info};

/// Per-modality consecutive-day run state
#[derive(Debug, Default)]
struct ModalityRun {
    /// Consecutive qualifying days in the current run
    consecutive_days: u32,
    /// Assessment day of the most recent deviating measurement
    last_day: Option<u32>,
    /// Deviations belonging to the current run, in day order
    deviations: Vec<Deviation>,
}

impl ModalityRun {
    fn reset(&mut self) {
        self.consecutive_days = 0;
        self.last_day = None;
        self.deviations.clear();
    }
}

/// Scores measurements against one subject's baseline and tracks
/// per-modality deviation runs over the trailing window of assessment days.
///
/// Each modality's counter is independent: a missed or non-deviating day
/// resets that modality only.
pub struct DeviationDetector {
    baseline: Baseline,
    config: DetectorConfig,
    runs: HashMap<Modality, ModalityRun>,
}

impl DeviationDetector {
    /// Create a detector bound to a subject's baseline
    pub fn new(baseline: Baseline, config: DetectorConfig) -> Self {
        let runs = Modality::ALL
            .iter()
            .map(|&m| (m, ModalityRun::default()))
            .collect();
        Self {
            baseline,
            config,
            runs,
        }
    }

    /// Subject this detector is tracking
    pub fn subject_id(&self) -> &str {
        &self.baseline.subject_id
    }

    /// Baseline the detector scores against
    pub fn baseline(&self) -> &Baseline {
        &self.baseline
    }

    /// Score a single measurement against the baseline without touching the
    /// trend window. Rejects non-finite readings before any computation.
    pub fn score(&self, measurement: &Measurement) -> Result<Vec<Deviation>, DeviationError> {
        validate_measurement(measurement)?;
        if measurement.subject_id != self.baseline.subject_id {
            return Err(DeviationError::SubjectMismatch {
                expected: self.baseline.subject_id.clone(),
                got: measurement.subject_id.clone(),
            });
        }

        let mut deviations = Vec::with_capacity(Modality::ALL.len());
        for modality in Modality::ALL {
            let metric = self.baseline.metric(modality);
            if !metric.mean.is_finite() || !metric.std_dev.is_finite() || metric.std_dev < 0.0 {
                return Err(DeviationError::UnusableBaseline { modality });
            }

            let current = measurement.values.get(modality);
            let sigma = if metric.std_dev == 0.0 {
                // Division by zero must never surface as NaN/Infinity: an
                // exact match scores 0, anything else scores the finite
                // maximal-severity sentinel with the sign of the drift.
                if current == metric.mean {
                    0.0
                } else if current > metric.mean {
                    UNBOUNDED_SIGMA
                } else {
                    -UNBOUNDED_SIGMA
                }
            } else {
                (current - metric.mean) / metric.std_dev
            };

            deviations.push(Deviation {
                modality,
                measurement_id: measurement.measurement_id,
                current_value: current,
                baseline_value: metric.mean,
                standard_deviations: sigma,
                timestamp: measurement.timestamp,
            });
        }
        Ok(deviations)
    }

    /// Score a measurement, update every modality's run, and emit a trend
    /// when at least one modality has deviated for the sustain window.
    pub fn observe(
        &mut self,
        measurement: &Measurement,
    ) -> Result<Option<TrendAnalysis>, DeviationError> {
        let deviations = self.score(measurement)?;
        let day = measurement.day_number;

        for deviation in deviations {
            let deviating = deviation.standard_deviations.abs() >= self.config.deviation_threshold;
            let run = self
                .runs
                .get_mut(&deviation.modality)
                .expect("runs initialized for every modality");

            if !deviating {
                if run.consecutive_days > 0 {
                    debug!(
                        subject = %self.baseline.subject_id,
                        modality = %deviation.modality,
                        "run reset by non-deviating day"
                    );
                }
                run.reset();
                continue;
            }

            match run.last_day {
                // Duplicate report for a day already counted
                Some(last) if day == last => continue,
                // Contiguous day extends the run
                Some(last) if day == last + 1 => {
                    run.consecutive_days += 1;
                    run.deviations.push(deviation);
                    run.last_day = Some(day);
                }
                // Day gap (missed assessment) starts a fresh run
                _ => {
                    if run.consecutive_days > 0 {
                        debug!(
                            subject = %self.baseline.subject_id,
                            modality = %deviation.modality,
                            "run reset by missed day"
                        );
                    }
                    run.deviations.clear();
                    run.deviations.push(deviation);
                    run.consecutive_days = 1;
                    run.last_day = Some(day);
                }
            }
        }

        Ok(self.materialize_trend())
    }

    /// Build a trend from the currently sustained modalities, if any
    fn materialize_trend(&self) -> Option<TrendAnalysis> {
        let mut affected = Vec::new();
        let mut sustained_deviations = Vec::new();
        let mut min_run = u32::MAX;

        for modality in Modality::ALL {
            let run = &self.runs[&modality];
            if run.consecutive_days >= self.config.sustain_days {
                affected.push(modality);
                sustained_deviations.extend(run.deviations.iter().cloned());
                min_run = min_run.min(run.consecutive_days);
            }
        }

        if affected.is_empty() {
            return None;
        }

        let severity = self.classify(&affected, &sustained_deviations);
        info!(
            subject = %self.baseline.subject_id,
            modalities = affected.len(),
            consecutive_days = min_run,
            %severity,
            "sustained trend detected"
        );

        Some(TrendAnalysis {
            sustained_deviations,
            consecutive_days: min_run,
            affected_modalities: affected,
            severity,
        })
    }

    /// Severity policy: multi-modality concurrence always outranks a single
    /// modality; a single modality escalates on magnitude.
    fn classify(&self, affected: &[Modality], deviations: &[Deviation]) -> Severity {
        if affected.len() >= 2 {
            return Severity::High;
        }
        let max_magnitude = deviations
            .iter()
            .map(|d| d.standard_deviations.abs())
            .fold(0.0_f64, f64::max);

        if max_magnitude >= self.config.high_magnitude_threshold {
            Severity::High
        } else if max_magnitude >= 2.0 {
            Severity::Medium
        } else {
            Severity::Low
        }
    }
}
