//! Measurement Types and Validation
//!
//! Defines the daily multimodal assessment record (speech articulation rate,
//! facial symmetry score, mean reaction time) and the numeric validation gate
//! that keeps non-finite values out of every downstream statistic.

mod error;
mod types;
mod validator;

pub use error::MeasurementError;
pub use types::{Measurement, Modality, ModalityValues};
pub use validator::validate_measurement;
