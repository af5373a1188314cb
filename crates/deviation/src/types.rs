//! Deviation and trend data model

use chrono::{DateTime, Utc};
use measurement::Modality;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Sentinel magnitude used when the baseline standard deviation is zero and
/// the current value differs from the mean. Finite on purpose: downstream
/// severity arithmetic must never see an infinity or NaN.
pub const UNBOUNDED_SIGMA: f64 = 1e9;

/// Signed distance of one reading from the subject's baseline, in baseline
/// standard deviations
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Deviation {
    /// Modality this deviation was computed for
    pub modality: Modality,
    /// Measurement that produced the reading
    pub measurement_id: Uuid,
    /// Reading from the measurement
    pub current_value: f64,
    /// Baseline mean for the modality
    pub baseline_value: f64,
    /// (current - baseline) / std_dev, with the zero-variance sentinel rule
    pub standard_deviations: f64,
    /// Measurement timestamp
    pub timestamp: DateTime<Utc>,
}

impl Deviation {
    /// True when the zero-variance sentinel was applied
    pub fn is_unbounded(&self) -> bool {
        self.standard_deviations.abs() >= UNBOUNDED_SIGMA
    }
}

/// Clinical alert severity
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
pub enum Severity {
    Low,
    Medium,
    High,
}

impl Severity {
    /// Stable name for logging and payloads
    pub fn as_str(&self) -> &'static str {
        match self {
            Severity::Low => "low",
            Severity::Medium => "medium",
            Severity::High => "high",
        }
    }
}

impl std::fmt::Display for Severity {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Aggregated multi-day drift across the currently sustained modalities
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TrendAnalysis {
    /// Every deviation in the sustained runs, grouped by modality
    pub sustained_deviations: Vec<Deviation>,
    /// Minimum sustained run length across the listed modalities
    pub consecutive_days: u32,
    /// Modalities currently sustained, in canonical order
    pub affected_modalities: Vec<Modality>,
    /// Classified severity
    pub severity: Severity,
}
