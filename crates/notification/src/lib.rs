//! Notification Routing
//!
//! Resolves the recipients linked to a subject and fans an alert payload out
//! across eligible channels (push, SMS, email). Every (recipient, channel)
//! pair is an independent dispatch unit: units run concurrently, retry
//! transient failures with exponential backoff, and a failed unit never
//! blocks or cancels the others.

mod directory;
mod router;
mod store;
mod transport;

pub use directory::{CaregiverLink, InMemoryDirectory, Recipient, RecipientDirectory, RecipientType, SubjectContacts};
pub use router::{AlertPayload, NotificationRouter};
pub use store::{NotificationRecord, NotificationStore};
pub use transport::{Channel, MockTransport, RetryPolicy, Transport, TransportError};

use thiserror::Error;

/// Recipient resolution errors
#[derive(Debug, Clone, Error)]
pub enum NotifyError {
    /// Subject is not known to the recipient directory
    #[error("subject {0} not found in recipient directory")]
    SubjectNotFound(String),
}
