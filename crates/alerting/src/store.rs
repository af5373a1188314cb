//! In-process alert store with lifecycle transitions

use crate::record::{AlertRecord, AlertStatus};
use crate::AlertError;
use chrono::Utc;
use deviation::TrendAnalysis;
use std::collections::HashMap;
use std::sync::Mutex;
use tracing::{info, warn};
use uuid::Uuid;

/// Repository of alert records, keyed by id with insertion order preserved.
///
/// Every state transition runs while holding the store lock: under concurrent
/// attempts the first transition commits and the second observes the changed
/// state and fails with `InvalidStateTransition`.
pub struct AlertStore {
    inner: Mutex<Inner>,
}

#[derive(Default)]
struct Inner {
    alerts: HashMap<Uuid, AlertRecord>,
    order: Vec<Uuid>,
}

impl AlertStore {
    pub fn new() -> Self {
        Self {
            inner: Mutex::new(Inner::default()),
        }
    }

    /// Create a new Active alert from a qualifying trend.
    ///
    /// Always creates a fresh record: deduplication against existing active
    /// alerts for the same subject is an external policy applied upstream.
    pub fn create_alert(&self, trend: &TrendAnalysis, subject_id: &str) -> AlertRecord {
        let record = AlertRecord::from_trend(trend, subject_id);
        info!(
            alert = %record.alert_id,
            subject = subject_id,
            severity = %record.severity,
            "alert created"
        );
        let mut inner = self.inner.lock().expect("alert store lock poisoned");
        inner.order.push(record.alert_id);
        inner.alerts.insert(record.alert_id, record.clone());
        record
    }

    /// Acknowledge an Active alert. Single-assignment: a second attempt fails.
    pub fn acknowledge(
        &self,
        alert_id: Uuid,
        clinician_id: &str,
        notes: Option<String>,
    ) -> Result<AlertRecord, AlertError> {
        self.transition(alert_id, AlertStatus::Acknowledged, |record| {
            record.acknowledged_at = Some(Utc::now());
            record.acknowledged_by = Some(clinician_id.to_string());
            record.notes = notes;
        })
    }

    /// Close an Acknowledged alert as handled
    pub fn resolve(&self, alert_id: Uuid) -> Result<AlertRecord, AlertError> {
        self.transition(alert_id, AlertStatus::Resolved, |_| {})
    }

    /// Close an Acknowledged alert as not corresponding to a real condition
    pub fn mark_false_positive(&self, alert_id: Uuid) -> Result<AlertRecord, AlertError> {
        self.transition(alert_id, AlertStatus::FalsePositive, |_| {})
    }

    fn transition(
        &self,
        alert_id: Uuid,
        target: AlertStatus,
        apply: impl FnOnce(&mut AlertRecord),
    ) -> Result<AlertRecord, AlertError> {
        let mut inner = self.inner.lock().expect("alert store lock poisoned");
        let record = inner
            .alerts
            .get_mut(&alert_id)
            .ok_or(AlertError::NotFound(alert_id))?;

        let allowed = matches!(
            (record.status, target),
            (AlertStatus::Active, AlertStatus::Acknowledged)
                | (AlertStatus::Acknowledged, AlertStatus::Resolved)
                | (AlertStatus::Acknowledged, AlertStatus::FalsePositive)
        );
        if !allowed {
            warn!(
                alert = %alert_id,
                from = %record.status,
                attempted = %target,
                "rejected state transition"
            );
            return Err(AlertError::InvalidStateTransition {
                alert_id,
                from: record.status,
                attempted: target,
            });
        }

        record.status = target;
        apply(record);
        info!(alert = %alert_id, status = %target, "alert transitioned");
        Ok(record.clone())
    }

    /// Fetch one alert by id
    pub fn get(&self, alert_id: Uuid) -> Result<AlertRecord, AlertError> {
        let inner = self.inner.lock().expect("alert store lock poisoned");
        inner
            .alerts
            .get(&alert_id)
            .cloned()
            .ok_or(AlertError::NotFound(alert_id))
    }

    /// All alerts for a subject, in creation order
    pub fn for_subject(&self, subject_id: &str) -> Vec<AlertRecord> {
        let inner = self.inner.lock().expect("alert store lock poisoned");
        inner
            .order
            .iter()
            .filter_map(|id| inner.alerts.get(id))
            .filter(|a| a.subject_id == subject_id)
            .cloned()
            .collect()
    }

    /// All alerts with a given status, in creation order
    pub fn with_status(&self, status: AlertStatus) -> Vec<AlertRecord> {
        let inner = self.inner.lock().expect("alert store lock poisoned");
        inner
            .order
            .iter()
            .filter_map(|id| inner.alerts.get(id))
            .filter(|a| a.status == status)
            .cloned()
            .collect()
    }

    /// Number of Active alerts
    pub fn active_count(&self) -> usize {
        let inner = self.inner.lock().expect("alert store lock poisoned");
        inner
            .alerts
            .values()
            .filter(|a| a.status == AlertStatus::Active)
            .count()
    }

    /// Drop all records (test isolation)
    pub fn clear(&self) {
        let mut inner = self.inner.lock().expect("alert store lock poisoned");
        inner.alerts.clear();
        inner.order.clear();
    }
}

impl Default for AlertStore {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;
    use deviation::{Deviation, Severity};
    use measurement::Modality;

    fn test_trend(severity: Severity) -> TrendAnalysis {
        let deviation = Deviation {
            modality: Modality::Speech,
            measurement_id: Uuid::new_v4(),
            current_value: 6.0,
            baseline_value: 4.0,
            standard_deviations: 2.5,
            timestamp: Utc::now(),
        };
        TrendAnalysis {
            sustained_deviations: vec![deviation.clone(), deviation.clone(), deviation],
            consecutive_days: 3,
            affected_modalities: vec![Modality::Speech],
            severity,
        }
    }

    #[test]
    fn test_new_alert_is_active() {
        let store = AlertStore::new();
        let alert = store.create_alert(&test_trend(Severity::Medium), "subject-1");
        assert_eq!(alert.status, AlertStatus::Active);
        assert_eq!(alert.consecutive_days, 3);
        assert!(!alert.message.is_empty());
        assert!(!alert.recommended_actions.is_empty());
        // All three deviations share one measurement id in this fixture
        assert_eq!(alert.triggering_measurement_ids.len(), 1);
    }

    #[test]
    fn test_acknowledge_once_then_fail() {
        let store = AlertStore::new();
        let alert = store.create_alert(&test_trend(Severity::High), "subject-1");

        let acked = store
            .acknowledge(alert.alert_id, "clinician-9", Some("reviewing".into()))
            .unwrap();
        assert_eq!(acked.status, AlertStatus::Acknowledged);
        assert_eq!(acked.acknowledged_by.as_deref(), Some("clinician-9"));
        assert!(acked.acknowledged_at.is_some());

        let err = store
            .acknowledge(alert.alert_id, "clinician-2", None)
            .unwrap_err();
        assert!(matches!(
            err,
            AlertError::InvalidStateTransition {
                from: AlertStatus::Acknowledged,
                attempted: AlertStatus::Acknowledged,
                ..
            }
        ));
    }

    #[test]
    fn test_resolve_requires_acknowledgment() {
        let store = AlertStore::new();
        let alert = store.create_alert(&test_trend(Severity::Medium), "subject-1");
        assert!(store.resolve(alert.alert_id).is_err());
        assert!(store.mark_false_positive(alert.alert_id).is_err());

        store.acknowledge(alert.alert_id, "clinician-1", None).unwrap();
        let resolved = store.resolve(alert.alert_id).unwrap();
        assert_eq!(resolved.status, AlertStatus::Resolved);

        // Terminal: nothing further is permitted
        assert!(store.resolve(alert.alert_id).is_err());
        assert!(store.mark_false_positive(alert.alert_id).is_err());
    }

    #[test]
    fn test_false_positive_path() {
        let store = AlertStore::new();
        let alert = store.create_alert(&test_trend(Severity::Medium), "subject-1");
        store.acknowledge(alert.alert_id, "clinician-1", None).unwrap();
        let closed = store.mark_false_positive(alert.alert_id).unwrap();
        assert_eq!(closed.status, AlertStatus::FalsePositive);
    }

    #[test]
    fn test_unknown_alert() {
        let store = AlertStore::new();
        assert!(matches!(
            store.get(Uuid::new_v4()),
            Err(AlertError::NotFound(_))
        ));
        assert!(store.acknowledge(Uuid::new_v4(), "c", None).is_err());
    }

    #[test]
    fn test_no_dedup_for_same_subject() {
        let store = AlertStore::new();
        store.create_alert(&test_trend(Severity::Medium), "subject-1");
        store.create_alert(&test_trend(Severity::Medium), "subject-1");
        assert_eq!(store.for_subject("subject-1").len(), 2);
        assert_eq!(store.active_count(), 2);
    }

    #[test]
    fn test_status_query_preserves_order() {
        let store = AlertStore::new();
        let first = store.create_alert(&test_trend(Severity::Medium), "subject-1");
        let second = store.create_alert(&test_trend(Severity::High), "subject-2");
        let active = store.with_status(AlertStatus::Active);
        assert_eq!(active.len(), 2);
        assert_eq!(active[0].alert_id, first.alert_id);
        assert_eq!(active[1].alert_id, second.alert_id);
    }

    #[test]
    fn test_concurrent_acknowledge_single_winner() {
        use std::sync::Arc;
        let store = Arc::new(AlertStore::new());
        let alert = store.create_alert(&test_trend(Severity::High), "subject-1");

        let handles: Vec<_> = (0..4)
            .map(|i| {
                let store = Arc::clone(&store);
                let id = alert.alert_id;
                std::thread::spawn(move || store.acknowledge(id, &format!("clinician-{i}"), None))
            })
            .collect();

        let successes = handles
            .into_iter()
            .map(|h| h.join().unwrap())
            .filter(Result::is_ok)
            .count();
        assert_eq!(successes, 1);
    }
}
