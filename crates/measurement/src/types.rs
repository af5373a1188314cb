//! Assessment measurement records

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Signal modality captured by a daily assessment
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Modality {
    /// Speech articulation rate (syllables/second)
    Speech,
    /// Facial symmetry score (0-1)
    Facial,
    /// Mean reaction time (milliseconds)
    Reaction,
}

impl Modality {
    /// All modalities, in canonical order
    pub const ALL: [Modality; 3] = [Modality::Speech, Modality::Facial, Modality::Reaction];

    /// Stable name for logging and payloads
    pub fn as_str(&self) -> &'static str {
        match self {
            Modality::Speech => "speech",
            Modality::Facial => "facial",
            Modality::Reaction => "reaction",
        }
    }
}

impl std::fmt::Display for Modality {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One scalar reading per modality
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct ModalityValues {
    /// Articulation rate (syllables/second)
    pub articulation_rate: f64,
    /// Facial symmetry score (0-1)
    pub facial_symmetry: f64,
    /// Mean reaction time (milliseconds)
    pub mean_reaction_ms: f64,
}

impl ModalityValues {
    /// Reading for one modality
    pub fn get(&self, modality: Modality) -> f64 {
        match modality {
            Modality::Speech => self.articulation_rate,
            Modality::Facial => self.facial_symmetry,
            Modality::Reaction => self.mean_reaction_ms,
        }
    }
}

/// One completed daily assessment for a subject
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Measurement {
    /// Unique measurement id
    pub measurement_id: Uuid,
    /// Subject this assessment belongs to
    pub subject_id: String,
    /// Completion time
    pub timestamp: DateTime<Utc>,
    /// Monotonic assessment day counter supplied by the scheduling collaborator
    pub day_number: u32,
    /// Per-modality readings
    pub values: ModalityValues,
}

impl Measurement {
    /// Create a measurement with a fresh id, stamped now
    pub fn new(subject_id: impl Into<String>, day_number: u32, values: ModalityValues) -> Self {
        Self {
            measurement_id: Uuid::new_v4(),
            subject_id: subject_id.into(),
            timestamp: Utc::now(),
            day_number,
            values,
        }
    }
}
