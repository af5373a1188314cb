//! Recipient directory: subject -> clinician + caregiver contacts

use crate::NotifyError;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::sync::Mutex;

/// Kind of person receiving a notification
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum RecipientType {
    Caregiver,
    Clinician,
}

/// Resolved recipient with only the contact points that may be used.
///
/// A caregiver's phone/email appear here only when that caregiver opted into
/// SMS/email respectively; the router treats an absent contact as a silent
/// channel skip.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Recipient {
    pub recipient_id: String,
    pub recipient_type: RecipientType,
    pub name: String,
    pub push_token: Option<String>,
    pub phone: Option<String>,
    pub email: Option<String>,
}

/// A caregiver linked to a subject, with channel opt-ins
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CaregiverLink {
    pub recipient: Recipient,
    /// Inactive links are excluded from resolution
    pub active: bool,
    pub sms_opt_in: bool,
    pub email_opt_in: bool,
}

/// Directory entry for one subject
#[derive(Debug, Clone)]
pub struct SubjectContacts {
    pub clinician: Recipient,
    pub caregivers: Vec<CaregiverLink>,
}

/// Resolves a subject to the people who should hear about its alerts
pub trait RecipientDirectory: Send + Sync {
    fn resolve(&self, subject_id: &str) -> Result<Vec<Recipient>, NotifyError>;
}

/// In-memory directory backing the library boundary in tests and small
/// deployments
pub struct InMemoryDirectory {
    subjects: Mutex<HashMap<String, SubjectContacts>>,
}

impl InMemoryDirectory {
    pub fn new() -> Self {
        Self {
            subjects: Mutex::new(HashMap::new()),
        }
    }

    /// Register or replace the contacts for a subject
    pub fn register(&self, subject_id: impl Into<String>, contacts: SubjectContacts) {
        self.subjects
            .lock()
            .expect("directory lock poisoned")
            .insert(subject_id.into(), contacts);
    }
}

impl Default for InMemoryDirectory {
    fn default() -> Self {
        Self::new()
    }
}

impl RecipientDirectory for InMemoryDirectory {
    fn resolve(&self, subject_id: &str) -> Result<Vec<Recipient>, NotifyError> {
        let subjects = self.subjects.lock().expect("directory lock poisoned");
        let contacts = subjects
            .get(subject_id)
            .ok_or_else(|| NotifyError::SubjectNotFound(subject_id.to_string()))?;

        let mut recipients = vec![contacts.clinician.clone()];
        for link in &contacts.caregivers {
            if !link.active {
                continue;
            }
            let mut recipient = link.recipient.clone();
            if !link.sms_opt_in {
                recipient.phone = None;
            }
            if !link.email_opt_in {
                recipient.email = None;
            }
            recipients.push(recipient);
        }
        Ok(recipients)
    }
}
