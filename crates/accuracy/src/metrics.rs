//! Rolling accuracy metrics over the outcome log

use crate::outcome::{AlertOutcome, OutcomeKind};
use serde::{Deserialize, Serialize};

/// Detector quality metrics computed from reviewed outcomes
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct AccuracyMetrics {
    /// TP / (TP + FN); 1.0 when nothing real was there to catch
    pub sensitivity: f64,
    /// FP / (TP + FP) — the complement of PPV, not the textbook FP/(FP+TN).
    /// Kept as the established contract of this system.
    pub false_positive_rate: f64,
    /// TP / (TP + FP); 1.0 when no alert fired at all
    pub ppv: f64,
    /// True negatives over all non-true-positive opportunities, relative to
    /// the supplied opportunity count; 1.0 when no count is available
    pub specificity: f64,
    /// Reviewed entries only; Unreviewed never counts
    pub total_reviewed: usize,
}

impl AccuracyMetrics {
    /// Compute metrics over a snapshot of reviewed outcomes.
    ///
    /// `total_opportunities` is the number of assessment windows in which a
    /// detection decision was possible; when supplied it anchors specificity.
    pub fn compute(outcomes: &[AlertOutcome], total_opportunities: Option<usize>) -> Self {
        let mut tp = 0usize;
        let mut fn_ = 0usize;
        let mut fp = 0usize;

        for entry in outcomes {
            match entry.outcome {
                OutcomeKind::TruePositive if entry.was_missed => fn_ += 1,
                OutcomeKind::TruePositive => tp += 1,
                OutcomeKind::FalsePositive => fp += 1,
                OutcomeKind::Unreviewed => {}
            }
        }
        let total_reviewed = tp + fn_ + fp;

        let sensitivity = ratio_or(tp, tp + fn_, 1.0);
        let ppv = ratio_or(tp, tp + fp, 1.0);
        let false_positive_rate = ratio_or(fp, tp + fp, 0.0);
        let specificity = match total_opportunities {
            Some(n) => {
                let denominator = n.saturating_sub(tp + fn_);
                let numerator = denominator.saturating_sub(fp);
                ratio_or(numerator, denominator, 1.0)
            }
            None => 1.0,
        };

        Self {
            sensitivity,
            false_positive_rate,
            ppv,
            specificity,
            total_reviewed,
        }
    }
}

fn ratio_or(numerator: usize, denominator: usize, when_empty: f64) -> f64 {
    if denominator == 0 {
        when_empty
    } else {
        numerator as f64 / denominator as f64
    }
}
