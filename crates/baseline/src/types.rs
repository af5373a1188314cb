//! Baseline data model

use chrono::{DateTime, Utc};
use measurement::Modality;
use serde::{Deserialize, Serialize};

/// Statistical normal range for one modality
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct MetricBaseline {
    /// Arithmetic mean of the window
    pub mean: f64,
    /// Population standard deviation (zero when all inputs are logically equal)
    pub std_dev: f64,
    /// Minimum observed value
    pub min: f64,
    /// Maximum observed value
    pub max: f64,
}

/// Per-subject baseline across all modalities
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Baseline {
    /// Subject this baseline belongs to
    pub subject_id: String,
    /// Estimation time
    pub created_at: DateTime<Utc>,
    /// Number of measurements in the window
    pub sample_count: usize,
    /// Speech articulation rate baseline
    pub speech: MetricBaseline,
    /// Facial symmetry baseline
    pub facial: MetricBaseline,
    /// Reaction time baseline
    pub reaction: MetricBaseline,
}

impl Baseline {
    /// Baseline statistics for one modality
    pub fn metric(&self, modality: Modality) -> &MetricBaseline {
        match modality {
            Modality::Speech => &self.speech,
            Modality::Facial => &self.facial,
            Modality::Reaction => &self.reaction,
        }
    }
}
