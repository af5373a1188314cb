//! Measurement Error Types

use crate::types::Modality;
use thiserror::Error;

/// Errors raised while validating an incoming measurement
#[derive(Debug, Clone, Error)]
pub enum MeasurementError {
    /// Non-finite value in a modality reading
    #[error("{modality} value {value} is not finite")]
    NumericInstability { modality: Modality, value: f64 },
}
