//! Alert record and status

use chrono::{DateTime, Utc};
use deviation::{Deviation, Severity, TrendAnalysis};
use measurement::Modality;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Alert lifecycle state
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum AlertStatus {
    /// Newly created, awaiting clinician review
    Active,
    /// Reviewed by a clinician, not yet closed
    Acknowledged,
    /// Closed: the underlying condition was handled
    Resolved,
    /// Closed: the alert did not correspond to a real condition
    FalsePositive,
}

impl AlertStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            AlertStatus::Active => "active",
            AlertStatus::Acknowledged => "acknowledged",
            AlertStatus::Resolved => "resolved",
            AlertStatus::FalsePositive => "false_positive",
        }
    }
}

impl std::fmt::Display for AlertStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A persisted clinical alert.
///
/// Notifications and review outcomes reference this record by `alert_id`
/// through their own stores; the record never owns them.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AlertRecord {
    pub alert_id: Uuid,
    pub subject_id: String,
    pub severity: Severity,
    /// Measurements whose deviations formed the sustained runs
    pub triggering_measurement_ids: Vec<Uuid>,
    pub sustained_deviations: Vec<Deviation>,
    pub affected_modalities: Vec<Modality>,
    pub consecutive_days: u32,
    pub message: String,
    pub recommended_actions: Vec<String>,
    pub status: AlertStatus,
    pub created_at: DateTime<Utc>,
    pub acknowledged_at: Option<DateTime<Utc>>,
    pub acknowledged_by: Option<String>,
    pub notes: Option<String>,
}

impl AlertRecord {
    /// Build a new Active record from a qualifying trend
    pub(crate) fn from_trend(trend: &TrendAnalysis, subject_id: &str) -> Self {
        let mut measurement_ids: Vec<Uuid> = Vec::new();
        for deviation in &trend.sustained_deviations {
            if !measurement_ids.contains(&deviation.measurement_id) {
                measurement_ids.push(deviation.measurement_id);
            }
        }

        Self {
            alert_id: Uuid::new_v4(),
            subject_id: subject_id.to_string(),
            severity: trend.severity,
            triggering_measurement_ids: measurement_ids,
            sustained_deviations: trend.sustained_deviations.clone(),
            affected_modalities: trend.affected_modalities.clone(),
            consecutive_days: trend.consecutive_days,
            message: build_message(trend),
            recommended_actions: recommended_actions(trend.severity),
            status: AlertStatus::Active,
            created_at: Utc::now(),
            acknowledged_at: None,
            acknowledged_by: None,
            notes: None,
        }
    }
}

fn build_message(trend: &TrendAnalysis) -> String {
    let modalities = trend
        .affected_modalities
        .iter()
        .map(|m| m.as_str())
        .collect::<Vec<_>>()
        .join(", ");
    format!(
        "{} severity: sustained deviation in {} for {} consecutive days",
        trend.severity, modalities, trend.consecutive_days
    )
}

fn recommended_actions(severity: Severity) -> Vec<String> {
    match severity {
        Severity::High => vec![
            "Contact the subject for an immediate clinical assessment".to_string(),
            "Review the full measurement history for the affected modalities".to_string(),
            "Consider scheduling an in-person neurological examination".to_string(),
        ],
        Severity::Medium => vec![
            "Review the deviation history at the next scheduled check-in".to_string(),
            "Increase assessment frequency for the affected modality".to_string(),
        ],
        Severity::Low => vec![
            "Monitor for continued drift; no immediate action required".to_string(),
        ],
    }
}
