//! Alert Lifecycle
//!
//! Owns the alert record, its state machine (Active -> Acknowledged ->
//! Resolved | FalsePositive), and the in-process alert store. Transitions run
//! under the store lock, so concurrent attempts resolve to exactly one winner.

mod record;
mod store;

pub use record::{AlertRecord, AlertStatus};
pub use store::AlertStore;

use thiserror::Error;
use uuid::Uuid;

/// Alert lifecycle errors
#[derive(Debug, Clone, Error)]
pub enum AlertError {
    /// Attempted transition not permitted from the alert's current state
    #[error("invalid state transition for alert {alert_id}: {from} -> {attempted}")]
    InvalidStateTransition {
        alert_id: Uuid,
        from: AlertStatus,
        attempted: AlertStatus,
    },

    /// Unknown alert id
    #[error("alert {0} not found")]
    NotFound(Uuid),
}
