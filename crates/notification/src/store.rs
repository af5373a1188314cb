//! Notification records and delivery-receipt tracking

use crate::directory::RecipientType;
use crate::transport::Channel;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::sync::Mutex;
use tracing::debug;
use uuid::Uuid;

/// One successful dispatch attempt.
///
/// Append-only: after creation only the delivery/read timestamps change,
/// driven by the external delivery-receipt collaborator.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NotificationRecord {
    pub notification_id: Uuid,
    /// Alert this notification belongs to (id reference, never ownership)
    pub alert_id: Option<Uuid>,
    pub recipient_id: String,
    pub recipient_type: RecipientType,
    pub channel: Channel,
    pub sent_at: DateTime<Utc>,
    pub delivered_at: Option<DateTime<Utc>>,
    pub read_at: Option<DateTime<Utc>>,
}

/// In-process store of notification records, indexed by alert
pub struct NotificationStore {
    records: Mutex<Vec<NotificationRecord>>,
}

impl NotificationStore {
    pub fn new() -> Self {
        Self {
            records: Mutex::new(Vec::new()),
        }
    }

    /// Append records produced by one dispatch
    pub fn append(&self, records: &[NotificationRecord]) {
        let mut all = self.records.lock().expect("notification store lock poisoned");
        all.extend_from_slice(records);
    }

    /// Records for one alert, in send order
    pub fn for_alert(&self, alert_id: Uuid) -> Vec<NotificationRecord> {
        let all = self.records.lock().expect("notification store lock poisoned");
        all.iter()
            .filter(|r| r.alert_id == Some(alert_id))
            .cloned()
            .collect()
    }

    /// Delivery-receipt hook: stamps `delivered_at` once; later receipts for
    /// the same notification are ignored.
    pub fn mark_delivered(&self, notification_id: Uuid) -> bool {
        self.stamp(notification_id, |r| {
            if r.delivered_at.is_none() {
                r.delivered_at = Some(Utc::now());
                true
            } else {
                false
            }
        })
    }

    /// Read-receipt hook: stamps `read_at` once
    pub fn mark_read(&self, notification_id: Uuid) -> bool {
        self.stamp(notification_id, |r| {
            if r.read_at.is_none() {
                r.read_at = Some(Utc::now());
                true
            } else {
                false
            }
        })
    }

    fn stamp(&self, notification_id: Uuid, apply: impl FnOnce(&mut NotificationRecord) -> bool) -> bool {
        let mut all = self.records.lock().expect("notification store lock poisoned");
        match all.iter_mut().find(|r| r.notification_id == notification_id) {
            Some(record) => {
                let stamped = apply(record);
                debug!(notification = %notification_id, stamped, "receipt applied");
                stamped
            }
            None => false,
        }
    }

    /// Total stored records
    pub fn len(&self) -> usize {
        self.records.lock().expect("notification store lock poisoned").len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Drop all records (test isolation)
    pub fn clear(&self) {
        self.records.lock().expect("notification store lock poisoned").clear();
    }
}

impl Default for NotificationStore {
    fn default() -> Self {
        Self::new()
    }
}
