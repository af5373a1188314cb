//! Detector configuration

use serde::{Deserialize, Serialize};

/// Deviation detector configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct DetectorConfig {
    /// |sigma| at which a single day counts as deviating (default: 2.0)
    pub deviation_threshold: f64,

    /// |sigma| at which a single sustained modality escalates to High (default: 3.0)
    pub high_magnitude_threshold: f64,

    /// Consecutive deviating days required before a modality is sustained (default: 3)
    pub sustain_days: u32,
}

impl Default for DetectorConfig {
    fn default() -> Self {
        Self {
            deviation_threshold: 2.0,
            high_magnitude_threshold: 3.0,
            sustain_days: 3,
        }
    }
}

impl DetectorConfig {
    /// Stricter policy: flags borderline single-modality signals earlier
    pub fn strict() -> Self {
        Self {
            deviation_threshold: 1.5,
            sustain_days: 2,
            ..Default::default()
        }
    }

    /// Lenient policy: requires larger, longer drifts
    pub fn lenient() -> Self {
        Self {
            deviation_threshold: 2.5,
            sustain_days: 4,
            ..Default::default()
        }
    }
}
