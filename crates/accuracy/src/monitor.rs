//! Accuracy monitor facade and meta-alert synthesis

use crate::metrics::AccuracyMetrics;
use crate::outcome::{AlertOutcome, OutcomeFilter, OutcomeKind, OutcomeLog};
use crate::thresholds::{check_thresholds, ThresholdBreach, ThresholdConfig};
use crate::AccuracyError;
use chrono::{DateTime, Utc};
use deviation::Severity;
use serde::{Deserialize, Serialize};
use tracing::{info, warn};
use uuid::Uuid;

/// An alert about the detector's own quality, not about a subject's health.
/// Routed through the same notification path as clinical alerts.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MetaAlert {
    pub severity: Severity,
    pub message: String,
    pub breaches: Vec<ThresholdBreach>,
    pub metrics: AccuracyMetrics,
    pub created_at: DateTime<Utc>,
}

/// Records adjudicated outcomes and applies threshold-based alerting to the
/// detector's own sensitivity and precision
pub struct AccuracyMonitor {
    log: OutcomeLog,
}

impl AccuracyMonitor {
    pub fn new() -> Self {
        Self {
            log: OutcomeLog::new(),
        }
    }

    /// Record the clinician's verdict on an issued alert
    pub fn record_outcome(
        &self,
        alert_id: Uuid,
        subject_id: &str,
        severity: Severity,
        outcome: OutcomeKind,
        reviewed_by: Option<&str>,
    ) {
        self.log.append(AlertOutcome {
            alert_id: Some(alert_id),
            subject_id: subject_id.to_string(),
            severity,
            outcome,
            reviewed_by: reviewed_by.map(str::to_string),
            was_missed: false,
            recorded_at: Utc::now(),
        });
    }

    /// Record a detector false negative: the condition was real but no alert
    /// was raised
    pub fn record_missed_detection(&self, subject_id: &str, reviewed_by: &str) {
        warn!(subject = subject_id, "missed detection reported");
        self.log.append(AlertOutcome {
            alert_id: None,
            subject_id: subject_id.to_string(),
            severity: Severity::High,
            outcome: OutcomeKind::TruePositive,
            reviewed_by: Some(reviewed_by.to_string()),
            was_missed: true,
            recorded_at: Utc::now(),
        });
    }

    /// Compute metrics over the log, optionally scoped to one subject and
    /// anchored to a total-opportunity count
    pub fn compute_metrics(
        &self,
        subject_id: Option<&str>,
        total_opportunities: Option<usize>,
    ) -> AccuracyMetrics {
        let filter = OutcomeFilter {
            subject_id: subject_id.map(str::to_string),
            outcome: None,
        };
        let snapshot = self.log.query(&filter);
        AccuracyMetrics::compute(&snapshot, total_opportunities)
    }

    /// Compare metrics against policy bounds
    pub fn check_thresholds(
        &self,
        metrics: &AccuracyMetrics,
        config: &ThresholdConfig,
    ) -> Result<Vec<ThresholdBreach>, AccuracyError> {
        check_thresholds(metrics, config)
    }

    /// Outcomes matching the filter, in insertion order
    pub fn get_outcomes(&self, filter: &OutcomeFilter) -> Vec<AlertOutcome> {
        self.log.query(filter)
    }

    /// Underlying log, for lifecycle control (reset between logical runs)
    pub fn log(&self) -> &OutcomeLog {
        &self.log
    }

    /// Summarize breaches into a High-severity meta-alert; None when the
    /// detector is within policy
    pub fn build_meta_alert(
        &self,
        metrics: &AccuracyMetrics,
        breaches: &[ThresholdBreach],
    ) -> Option<MetaAlert> {
        if breaches.is_empty() {
            return None;
        }
        let summary = breaches
            .iter()
            .map(|b| format!("{} {:.3} vs bound {:.3}", b.metric, b.value, b.threshold))
            .collect::<Vec<_>>()
            .join("; ");
        let message = format!(
            "detector quality degraded over {} reviewed outcomes: {}",
            metrics.total_reviewed, summary
        );
        info!(breaches = breaches.len(), "meta-alert raised");
        Some(MetaAlert {
            severity: Severity::High,
            message,
            breaches: breaches.to_vec(),
            metrics: *metrics,
            created_at: Utc::now(),
        })
    }
}

impl Default for AccuracyMonitor {
    fn default() -> Self {
        Self::new()
    }
}
