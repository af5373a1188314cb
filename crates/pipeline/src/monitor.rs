//! Top-level subject monitor

use crate::config::MonitorConfig;
use crate::context::{IngestOutcome, SubjectContext};
use crate::PipelineError;
use accuracy::{AccuracyMonitor, MetaAlert, OutcomeFilter, OutcomeKind};
use alerting::{AlertRecord, AlertStore};
use measurement::Measurement;
use notification::{
    AlertPayload, NotificationRouter, NotificationStore, Recipient, RecipientDirectory,
};
use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use tracing::{info, warn};
use uuid::Uuid;

/// Subject id used on meta-alert payloads about the detector itself
const DETECTOR_SUBJECT: &str = "neurowatch-detector";

/// Owns the full monitoring flow for a fleet of subjects.
///
/// Alert creation commits to the store before dispatch begins; dispatch is
/// best-effort and never rolls an alert back.
pub struct SubjectMonitor {
    config: MonitorConfig,
    contexts: Mutex<HashMap<String, SubjectContext>>,
    alerts: AlertStore,
    notifications: NotificationStore,
    router: NotificationRouter,
    directory: Arc<dyn RecipientDirectory>,
    accuracy: AccuracyMonitor,
    ops_recipients: Vec<Recipient>,
}

impl SubjectMonitor {
    pub fn new(
        config: MonitorConfig,
        directory: Arc<dyn RecipientDirectory>,
        router: NotificationRouter,
    ) -> Self {
        Self {
            config,
            contexts: Mutex::new(HashMap::new()),
            alerts: AlertStore::new(),
            notifications: NotificationStore::new(),
            router,
            directory,
            accuracy: AccuracyMonitor::new(),
            ops_recipients: Vec::new(),
        }
    }

    /// Recipients for detector-quality meta-alerts
    pub fn with_ops_recipients(mut self, recipients: Vec<Recipient>) -> Self {
        self.ops_recipients = recipients;
        self
    }

    /// Feed one completed assessment through the pipeline. Returns the alert
    /// created for a sustained trend, if any.
    pub async fn ingest(
        &self,
        measurement: &Measurement,
    ) -> Result<Option<AlertRecord>, PipelineError> {
        let subject_id = measurement.subject_id.clone();
        let trend = {
            let mut contexts = self.contexts.lock().expect("context map lock poisoned");
            let context = contexts
                .entry(subject_id.clone())
                .or_insert_with(|| {
                    SubjectContext::new(subject_id.clone(), self.config.detector.clone())
                });
            match context.ingest(measurement)? {
                IngestOutcome::Trend(trend) => Some(trend),
                _ => None,
            }
        };

        let Some(trend) = trend else {
            return Ok(None);
        };

        // Persist first; dispatch afterwards, best-effort
        let alert = self.alerts.create_alert(&trend, &subject_id);
        self.dispatch_alert(&alert).await;
        Ok(Some(alert))
    }

    /// Resolve recipients and fan the alert out. Failures are logged, never
    /// propagated: the alert record already exists.
    async fn dispatch_alert(&self, alert: &AlertRecord) {
        let recipients = match self.directory.resolve(&alert.subject_id) {
            Ok(recipients) => recipients,
            Err(e) => {
                warn!(
                    alert = %alert.alert_id,
                    subject = %alert.subject_id,
                    error = %e,
                    "recipient resolution failed, alert kept without notifications"
                );
                return;
            }
        };
        let payload = AlertPayload::from(alert);
        let records = self.router.dispatch(&payload, &recipients).await;
        self.notifications.append(&records);
    }

    /// Clinician acknowledges an active alert
    pub fn acknowledge(
        &self,
        alert_id: Uuid,
        clinician_id: &str,
        notes: Option<String>,
    ) -> Result<AlertRecord, PipelineError> {
        Ok(self.alerts.acknowledge(alert_id, clinician_id, notes)?)
    }

    /// Close an acknowledged alert as handled
    pub fn resolve(&self, alert_id: Uuid) -> Result<AlertRecord, PipelineError> {
        Ok(self.alerts.resolve(alert_id)?)
    }

    /// Close an acknowledged alert as a false positive
    pub fn mark_false_positive(&self, alert_id: Uuid) -> Result<AlertRecord, PipelineError> {
        Ok(self.alerts.mark_false_positive(alert_id)?)
    }

    /// Record the clinician's verdict on an issued alert into the outcome log
    pub fn record_review(
        &self,
        alert_id: Uuid,
        outcome: OutcomeKind,
        reviewed_by: &str,
    ) -> Result<(), PipelineError> {
        let alert = self.alerts.get(alert_id)?;
        self.accuracy.record_outcome(
            alert.alert_id,
            &alert.subject_id,
            alert.severity,
            outcome,
            Some(reviewed_by),
        );
        Ok(())
    }

    /// Record a confirmed condition for which no alert was raised
    pub fn record_missed_detection(&self, subject_id: &str, reviewed_by: &str) {
        self.accuracy.record_missed_detection(subject_id, reviewed_by);
    }

    /// Compute rolling quality metrics, compare them against policy, and
    /// route a meta-alert to the operations recipients on any breach.
    pub async fn review_accuracy(
        &self,
        total_opportunities: Option<usize>,
    ) -> Result<Option<MetaAlert>, PipelineError> {
        let metrics = self.accuracy.compute_metrics(None, total_opportunities);
        let breaches = self
            .accuracy
            .check_thresholds(&metrics, &self.config.thresholds)?;
        let Some(meta) = self.accuracy.build_meta_alert(&metrics, &breaches) else {
            info!("detector quality within policy");
            return Ok(None);
        };

        let payload = AlertPayload {
            alert_id: None,
            subject_id: DETECTOR_SUBJECT.to_string(),
            severity: meta.severity,
            message: meta.message.clone(),
        };
        let records = self.router.dispatch(&payload, &self.ops_recipients).await;
        self.notifications.append(&records);
        Ok(Some(meta))
    }

    /// Outcomes matching a filter, for the review surfaces
    pub fn outcomes(&self, filter: &OutcomeFilter) -> Vec<accuracy::AlertOutcome> {
        self.accuracy.get_outcomes(filter)
    }

    pub fn alerts(&self) -> &AlertStore {
        &self.alerts
    }

    pub fn notifications(&self) -> &NotificationStore {
        &self.notifications
    }

    pub fn accuracy(&self) -> &AccuracyMonitor {
        &self.accuracy
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use alerting::AlertStatus;
    use deviation::Severity;
    use measurement::ModalityValues;
    use notification::{
        CaregiverLink, Channel, InMemoryDirectory, MockTransport, RecipientType, RetryPolicy,
        SubjectContacts,
    };

    fn values(speech: f64, facial: f64, reaction: f64) -> ModalityValues {
        ModalityValues {
            articulation_rate: speech,
            facial_symmetry: facial,
            mean_reaction_ms: reaction,
        }
    }

    fn clinician() -> Recipient {
        Recipient {
            recipient_id: "clin-1".to_string(),
            recipient_type: RecipientType::Clinician,
            name: "Dr. Osei".to_string(),
            push_token: Some("clin-token".into()),
            phone: Some("+15550999".into()),
            email: Some("osei@clinic.example".into()),
        }
    }

    fn caregiver() -> Recipient {
        Recipient {
            recipient_id: "cg-1".to_string(),
            recipient_type: RecipientType::Caregiver,
            name: "Sam".to_string(),
            push_token: Some("cg-token".into()),
            phone: Some("+15550100".into()),
            email: Some("sam@example.org".into()),
        }
    }

    struct Fixture {
        monitor: SubjectMonitor,
        push: Arc<MockTransport>,
        sms: Arc<MockTransport>,
        email: Arc<MockTransport>,
    }

    fn fixture() -> Fixture {
        crate::telemetry::init_logging();
        let directory = Arc::new(InMemoryDirectory::new());
        directory.register(
            "subject-1",
            SubjectContacts {
                clinician: clinician(),
                caregivers: vec![CaregiverLink {
                    recipient: caregiver(),
                    active: true,
                    sms_opt_in: true,
                    email_opt_in: true,
                }],
            },
        );

        let push = Arc::new(MockTransport::reliable());
        let sms = Arc::new(MockTransport::reliable());
        let email = Arc::new(MockTransport::reliable());
        let router = NotificationRouter::new(RetryPolicy {
            initial_delay_ms: 1,
            max_delay_ms: 2,
            max_attempts: 3,
        })
        .with_transport(Channel::Push, push.clone())
        .with_transport(Channel::Sms, sms.clone())
        .with_transport(Channel::Email, email.clone());

        let monitor = SubjectMonitor::new(MonitorConfig::default(), directory, router)
            .with_ops_recipients(vec![clinician()]);
        Fixture {
            monitor,
            push,
            sms,
            email,
        }
    }

    /// Five steady days to establish a baseline with known spread
    async fn establish_baseline(monitor: &SubjectMonitor) {
        let window = [
            (3.0, 0.8, 250.0),
            (5.0, 1.0, 350.0),
            (4.0, 0.9, 300.0),
            (3.0, 0.8, 250.0),
            (5.0, 1.0, 350.0),
        ];
        for (i, &(s, f, r)) in window.iter().enumerate() {
            let m = Measurement::new("subject-1", i as u32 + 1, values(s, f, r));
            assert!(monitor.ingest(&m).await.unwrap().is_none());
        }
    }

    #[tokio::test]
    async fn test_end_to_end_alert_and_fanout() {
        let fx = fixture();
        establish_baseline(&fx.monitor).await;

        // Speech mean 4.0, population std-dev sqrt(0.8); drift far beyond 3 sigma
        let drifted = 4.0 + 4.0 * (0.8_f64).sqrt();
        let mut alert = None;
        for day in 6..=8 {
            alert = fx
                .monitor
                .ingest(&Measurement::new("subject-1", day, values(drifted, 0.9, 300.0)))
                .await
                .unwrap();
        }
        let alert = alert.expect("third consecutive deviating day raises an alert");
        assert_eq!(alert.status, AlertStatus::Active);
        assert_eq!(alert.severity, Severity::High);
        assert_eq!(alert.consecutive_days, 3);

        // High severity, clinician + caregiver both fully reachable:
        // 2 push + 2 sms + 2 email
        let records = fx.monitor.notifications().for_alert(alert.alert_id);
        assert_eq!(records.len(), 6);
        assert_eq!(fx.push.sent().len(), 2);
        assert_eq!(fx.sms.sent().len(), 2);
        assert_eq!(fx.email.sent().len(), 2);
    }

    #[tokio::test]
    async fn test_lifecycle_and_review_loop() {
        let fx = fixture();
        establish_baseline(&fx.monitor).await;

        let drifted = 4.0 + 2.5 * (0.8_f64).sqrt();
        let mut alert = None;
        for day in 6..=8 {
            alert = fx
                .monitor
                .ingest(&Measurement::new("subject-1", day, values(drifted, 0.9, 300.0)))
                .await
                .unwrap();
        }
        let alert = alert.unwrap();
        assert_eq!(alert.severity, Severity::Medium);

        fx.monitor
            .acknowledge(alert.alert_id, "clin-1", Some("checking in".into()))
            .unwrap();
        fx.monitor.resolve(alert.alert_id).unwrap();
        fx.monitor
            .record_review(alert.alert_id, OutcomeKind::TruePositive, "clin-1")
            .unwrap();

        let metrics = fx.monitor.accuracy().compute_metrics(None, None);
        assert_eq!(metrics.total_reviewed, 1);
        assert_eq!(metrics.sensitivity, 1.0);
    }

    #[tokio::test]
    async fn test_dispatch_failure_keeps_alert() {
        let directory = Arc::new(InMemoryDirectory::new());
        // Subject deliberately absent from the directory
        let router = NotificationRouter::new(RetryPolicy {
            initial_delay_ms: 1,
            max_delay_ms: 2,
            max_attempts: 1,
        });
        let monitor = SubjectMonitor::new(MonitorConfig::default(), directory, router);

        let window = [
            (3.0, 0.8, 250.0),
            (5.0, 1.0, 350.0),
            (4.0, 0.9, 300.0),
            (3.0, 0.8, 250.0),
            (5.0, 1.0, 350.0),
        ];
        for (i, &(s, f, r)) in window.iter().enumerate() {
            monitor
                .ingest(&Measurement::new("subject-1", i as u32 + 1, values(s, f, r)))
                .await
                .unwrap();
        }
        let drifted = 4.0 + 2.5 * (0.8_f64).sqrt();
        let mut alert = None;
        for day in 6..=8 {
            alert = monitor
                .ingest(&Measurement::new("subject-1", day, values(drifted, 0.9, 300.0)))
                .await
                .unwrap();
        }
        let alert = alert.expect("alert created even though nobody could be notified");
        assert_eq!(monitor.alerts().get(alert.alert_id).unwrap().status, AlertStatus::Active);
        assert!(monitor.notifications().is_empty());
    }

    #[tokio::test]
    async fn test_meta_alert_on_quality_breach() {
        let fx = fixture();
        // 1 caught condition, 4 missed: sensitivity 0.2, far under the floor
        fx.monitor.record_missed_detection("subject-2", "clin-1");
        fx.monitor.record_missed_detection("subject-3", "clin-1");
        fx.monitor.record_missed_detection("subject-4", "clin-1");
        fx.monitor.record_missed_detection("subject-5", "clin-1");
        fx.monitor.accuracy().record_outcome(
            Uuid::new_v4(),
            "subject-1",
            Severity::Medium,
            OutcomeKind::TruePositive,
            Some("clin-1"),
        );

        let meta = fx
            .monitor
            .review_accuracy(None)
            .await
            .unwrap()
            .expect("sensitivity breach raises a meta-alert");
        assert_eq!(meta.severity, Severity::High);
        assert!(!meta.breaches.is_empty());

        // Meta-alert went to the ops clinician over push + sms + email
        assert_eq!(fx.push.sent().len(), 1);
        assert_eq!(fx.sms.sent().len(), 1);
        assert_eq!(fx.email.sent().len(), 1);
        assert_eq!(fx.push.sent()[0].1.subject_id, DETECTOR_SUBJECT);
    }

    #[tokio::test]
    async fn test_no_meta_alert_within_policy() {
        let fx = fixture();
        fx.monitor.accuracy().record_outcome(
            Uuid::new_v4(),
            "subject-1",
            Severity::Medium,
            OutcomeKind::TruePositive,
            Some("clin-1"),
        );
        assert!(fx.monitor.review_accuracy(None).await.unwrap().is_none());
        assert!(fx.push.sent().is_empty());
    }

    #[tokio::test]
    async fn test_non_finite_measurement_rejected_at_ingest() {
        let fx = fixture();
        let bad = Measurement::new("subject-1", 1, values(f64::NAN, 0.9, 300.0));
        assert!(fx.monitor.ingest(&bad).await.is_err());
        // The rejected measurement did not enter the baseline window
        establish_baseline(&fx.monitor).await;
    }
}
