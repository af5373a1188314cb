//! Append-only outcome log

use chrono::{DateTime, Utc};
use deviation::Severity;
use serde::{Deserialize, Serialize};
use std::sync::Mutex;
use tracing::debug;
use uuid::Uuid;

/// Clinician-adjudicated ground truth about one alert (or one missed
/// condition)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum OutcomeKind {
    /// The underlying clinical condition was real
    TruePositive,
    /// An alert fired for a condition that was not real
    FalsePositive,
    /// Not yet reviewed; excluded from every rate computation
    Unreviewed,
}

/// One entry in the outcome log.
///
/// `was_missed = true` marks a detector false negative: the condition was
/// real but no alert was raised, so `alert_id` is absent and the outcome is
/// always `TruePositive`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AlertOutcome {
    pub alert_id: Option<Uuid>,
    pub subject_id: String,
    pub severity: Severity,
    pub outcome: OutcomeKind,
    pub reviewed_by: Option<String>,
    pub was_missed: bool,
    pub recorded_at: DateTime<Utc>,
}

/// Filter for outcome queries
#[derive(Debug, Clone, Default)]
pub struct OutcomeFilter {
    pub subject_id: Option<String>,
    pub outcome: Option<OutcomeKind>,
}

impl OutcomeFilter {
    fn matches(&self, entry: &AlertOutcome) -> bool {
        self.subject_id
            .as_ref()
            .map_or(true, |s| &entry.subject_id == s)
            && self.outcome.map_or(true, |o| entry.outcome == o)
    }
}

/// Append-only log of adjudicated outcomes.
///
/// Explicit store object with its own lifecycle, never a process-wide
/// singleton: review actions append concurrently under the mutex and metric
/// computation reads a cloned snapshot, never mutating history.
pub struct OutcomeLog {
    entries: Mutex<Vec<AlertOutcome>>,
}

impl OutcomeLog {
    pub fn new() -> Self {
        Self {
            entries: Mutex::new(Vec::new()),
        }
    }

    /// Append one adjudicated entry
    pub fn append(&self, entry: AlertOutcome) {
        debug!(
            subject = %entry.subject_id,
            outcome = ?entry.outcome,
            was_missed = entry.was_missed,
            "outcome recorded"
        );
        self.entries
            .lock()
            .expect("outcome log lock poisoned")
            .push(entry);
    }

    /// Consistent snapshot of the whole log, in insertion order
    pub fn snapshot(&self) -> Vec<AlertOutcome> {
        self.entries
            .lock()
            .expect("outcome log lock poisoned")
            .clone()
    }

    /// Entries matching the filter, in insertion order
    pub fn query(&self, filter: &OutcomeFilter) -> Vec<AlertOutcome> {
        self.entries
            .lock()
            .expect("outcome log lock poisoned")
            .iter()
            .filter(|e| filter.matches(e))
            .cloned()
            .collect()
    }

    pub fn len(&self) -> usize {
        self.entries.lock().expect("outcome log lock poisoned").len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Drop all entries (test isolation / logical redeploy)
    pub fn reset(&self) {
        self.entries.lock().expect("outcome log lock poisoned").clear();
    }
}

impl Default for OutcomeLog {
    fn default() -> Self {
        Self::new()
    }
}
