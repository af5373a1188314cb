//! Numeric validation gate for incoming measurements

use crate::error::MeasurementError;
use crate::types::{Measurement, Modality};
use tracing::warn;

/// Reject any measurement carrying a non-finite reading.
///
/// A single bad reading rejects only that measurement; it must never reach a
/// baseline or trend window, where a NaN would poison every later statistic.
pub fn validate_measurement(measurement: &Measurement) -> Result<(), MeasurementError> {
    for modality in Modality::ALL {
        let value = measurement.values.get(modality);
        if !value.is_finite() {
            warn!(
                subject = %measurement.subject_id,
                %modality,
                value,
                "rejecting measurement with non-finite reading"
            );
            return Err(MeasurementError::NumericInstability { modality, value });
        }
    }
    Ok(())
}
