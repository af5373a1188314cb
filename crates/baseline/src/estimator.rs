//! Baseline estimation from the initial assessment window

use crate::types::{Baseline, MetricBaseline};
use crate::BaselineError;
use chrono::Utc;
use measurement::{Measurement, Modality};
use tracing::{debug, info};

/// Minimum qualifying window size
pub const MIN_BASELINE_SAMPLES: usize = 5;

/// Scale factor for the zero-variance tolerance (multiples of machine epsilon)
const ZERO_VARIANCE_EPSILON_SCALE: f64 = 8.0;

/// Estimates per-subject baselines from an ordered measurement window
pub struct BaselineEstimator;

impl BaselineEstimator {
    /// Compute a baseline from at least [`MIN_BASELINE_SAMPLES`] measurements.
    ///
    /// The empty-input check runs before the count check so an empty window
    /// gets the more specific diagnostic.
    pub fn estimate(
        subject_id: &str,
        measurements: &[Measurement],
    ) -> Result<Baseline, BaselineError> {
        if measurements.is_empty() {
            return Err(BaselineError::EmptyInput);
        }
        if measurements.len() < MIN_BASELINE_SAMPLES {
            return Err(BaselineError::InsufficientSamples {
                got: measurements.len(),
                required: MIN_BASELINE_SAMPLES,
            });
        }

        let speech = Self::estimate_metric(measurements, Modality::Speech)?;
        let facial = Self::estimate_metric(measurements, Modality::Facial)?;
        let reaction = Self::estimate_metric(measurements, Modality::Reaction)?;

        info!(
            subject = subject_id,
            samples = measurements.len(),
            "baseline estimated"
        );

        Ok(Baseline {
            subject_id: subject_id.to_string(),
            created_at: Utc::now(),
            sample_count: measurements.len(),
            speech,
            facial,
            reaction,
        })
    }

    /// Mean, population std-dev, and min/max for one modality
    fn estimate_metric(
        measurements: &[Measurement],
        modality: Modality,
    ) -> Result<MetricBaseline, BaselineError> {
        let mut values = Vec::with_capacity(measurements.len());
        for m in measurements {
            let v = m.values.get(modality);
            if !v.is_finite() {
                return Err(BaselineError::NumericInstability { modality, value: v });
            }
            values.push(v);
        }

        let n = values.len() as f64;
        let mean = values.iter().sum::<f64>() / n;
        let min = values.iter().cloned().fold(f64::MAX, f64::min);
        let max = values.iter().cloned().fold(f64::MIN, f64::max);

        let mut m2 = 0.0;
        for &v in &values {
            let d = v - mean;
            m2 += d * d;
        }
        // Population variance: divide by n, not n-1
        let std_dev = (m2 / n).sqrt();

        // Rounding can produce a spuriously non-zero std-dev when every input
        // is logically the same value. Clamp to zero when all values sit
        // within a magnitude-scaled tolerance of the mean.
        let magnitude = values.iter().fold(0.0_f64, |acc, &v| acc.max(v.abs()));
        let tolerance = magnitude * f64::EPSILON * ZERO_VARIANCE_EPSILON_SCALE;
        let std_dev = if values.iter().all(|&v| (v - mean).abs() <= tolerance) {
            debug!(%modality, "all window values logically identical, clamping std_dev to 0");
            0.0
        } else {
            std_dev
        };

        Ok(MetricBaseline {
            mean,
            std_dev,
            min,
            max,
        })
    }
}

/// Guard applied before a baseline is accepted into storage.
///
/// Returns false (never errors) when any statistic is non-finite, any
/// standard deviation is negative, or the min/mean/max ordering is broken.
pub fn validate_baseline_quality(baseline: &Baseline) -> bool {
    for modality in Modality::ALL {
        let metric = baseline.metric(modality);
        let finite = metric.mean.is_finite()
            && metric.std_dev.is_finite()
            && metric.min.is_finite()
            && metric.max.is_finite();
        if !finite || metric.std_dev < 0.0 || metric.min > metric.mean || metric.mean > metric.max
        {
            return false;
        }
    }
    true
}

#[cfg(test)]
mod tests {
    use super::*;
    use measurement::ModalityValues;
    use proptest::prelude::*;

    fn measurement(day: u32, speech: f64, facial: f64, reaction: f64) -> Measurement {
        Measurement::new(
            "subject-1",
            day,
            ModalityValues {
                articulation_rate: speech,
                facial_symmetry: facial,
                mean_reaction_ms: reaction,
            },
        )
    }

    fn window(values: &[(f64, f64, f64)]) -> Vec<Measurement> {
        values
            .iter()
            .enumerate()
            .map(|(i, &(s, f, r))| measurement(i as u32 + 1, s, f, r))
            .collect()
    }

    #[test]
    fn test_empty_input_rejected_before_count_check() {
        let err = BaselineEstimator::estimate("subject-1", &[]).unwrap_err();
        assert!(matches!(err, BaselineError::EmptyInput));
    }

    #[test]
    fn test_insufficient_samples() {
        let w = window(&[(4.0, 0.9, 300.0), (4.1, 0.9, 305.0), (3.9, 0.9, 295.0)]);
        let err = BaselineEstimator::estimate("subject-1", &w).unwrap_err();
        match err {
            BaselineError::InsufficientSamples { got, required } => {
                assert_eq!(got, 3);
                assert_eq!(required, 5);
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[test]
    fn test_basic_statistics() {
        let w = window(&[
            (2.0, 0.8, 200.0),
            (4.0, 0.9, 300.0),
            (4.0, 0.9, 300.0),
            (4.0, 0.9, 300.0),
            (6.0, 1.0, 400.0),
        ]);
        let b = BaselineEstimator::estimate("subject-1", &w).unwrap();
        assert!((b.speech.mean - 4.0).abs() < 1e-9);
        assert_eq!(b.speech.min, 2.0);
        assert_eq!(b.speech.max, 6.0);
        // Population std-dev of [2,4,4,4,6] is sqrt(8/5)
        assert!((b.speech.std_dev - (8.0_f64 / 5.0).sqrt()).abs() < 1e-9);
        assert_eq!(b.sample_count, 5);
    }

    #[test]
    fn test_identical_values_clamp_std_dev_to_zero() {
        let w = window(&[(4.2, 0.95, 310.0); 5]);
        let b = BaselineEstimator::estimate("subject-1", &w).unwrap();
        for modality in Modality::ALL {
            let metric = b.metric(modality);
            assert_eq!(metric.std_dev, 0.0, "{modality} std_dev");
            assert_eq!(metric.min, metric.max, "{modality} min/max");
            assert!((metric.mean - metric.min).abs() <= f64::EPSILON * metric.mean.abs() * 8.0);
        }
    }

    #[test]
    fn test_non_finite_input_rejected() {
        let mut w = window(&[(4.0, 0.9, 300.0); 5]);
        w[2].values.mean_reaction_ms = f64::NAN;
        let err = BaselineEstimator::estimate("subject-1", &w).unwrap_err();
        assert!(matches!(
            err,
            BaselineError::NumericInstability {
                modality: Modality::Reaction,
                ..
            }
        ));
    }

    #[test]
    fn test_quality_guard_rejects_negative_std_dev() {
        let w = window(&[(4.0, 0.9, 300.0); 5]);
        let mut b = BaselineEstimator::estimate("subject-1", &w).unwrap();
        assert!(validate_baseline_quality(&b));
        b.facial.std_dev = -0.1;
        assert!(!validate_baseline_quality(&b));
    }

    #[test]
    fn test_quality_guard_rejects_broken_ordering() {
        let w = window(&[(4.0, 0.9, 300.0); 5]);
        let mut b = BaselineEstimator::estimate("subject-1", &w).unwrap();
        b.speech.min = b.speech.mean + 1.0;
        assert!(!validate_baseline_quality(&b));
    }

    #[test]
    fn test_quality_guard_rejects_non_finite() {
        let w = window(&[(4.0, 0.9, 300.0); 5]);
        let mut b = BaselineEstimator::estimate("subject-1", &w).unwrap();
        b.reaction.mean = f64::INFINITY;
        assert!(!validate_baseline_quality(&b));
    }

    proptest! {
        #[test]
        fn prop_baseline_invariants_hold(
            values in prop::collection::vec((0.1f64..20.0, 0.0f64..1.0, 50.0f64..2000.0), 5..40)
        ) {
            let w = window(&values);
            let b = BaselineEstimator::estimate("subject-1", &w).unwrap();
            for modality in Modality::ALL {
                let metric = b.metric(modality);
                prop_assert!(metric.std_dev >= 0.0);
                prop_assert!(metric.min <= metric.mean + 1e-9);
                prop_assert!(metric.mean <= metric.max + 1e-9);
            }
            prop_assert!(validate_baseline_quality(&b));

            // Deterministic: same input, same statistics
            let b2 = BaselineEstimator::estimate("subject-1", &w).unwrap();
            for modality in Modality::ALL {
                prop_assert_eq!(b.metric(modality).mean, b2.metric(modality).mean);
                prop_assert_eq!(b.metric(modality).std_dev, b2.metric(modality).std_dev);
            }
        }
    }
}
