//! Multi-channel dispatch with bulkhead isolation

use crate::directory::Recipient;
use crate::store::NotificationRecord;
use crate::transport::{Channel, RetryPolicy, Transport, TransportError};
use alerting::AlertRecord;
use chrono::Utc;
use deviation::Severity;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::sync::Arc;
use tokio::task::JoinSet;
use tracing::{debug, info, warn};
use uuid::Uuid;

/// What the transports deliver. Built from a clinical alert or a detector
/// quality meta-alert; meta-alerts carry no subject-facing alert id.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AlertPayload {
    pub alert_id: Option<Uuid>,
    pub subject_id: String,
    pub severity: Severity,
    pub message: String,
}

impl AlertPayload {
    /// Wire form handed to transports
    pub fn to_json(&self) -> String {
        serde_json::to_string(self).unwrap_or_else(|_| self.message.clone())
    }
}

impl From<&AlertRecord> for AlertPayload {
    fn from(alert: &AlertRecord) -> Self {
        Self {
            alert_id: Some(alert.alert_id),
            subject_id: alert.subject_id.clone(),
            severity: alert.severity,
            message: alert.message.clone(),
        }
    }
}

/// One schedulable (recipient, channel) delivery unit
struct DispatchUnit {
    recipient: Recipient,
    channel: Channel,
}

/// Fans an alert payload out across every eligible (recipient, channel) pair.
pub struct NotificationRouter {
    transports: HashMap<Channel, Arc<dyn Transport>>,
    policy: RetryPolicy,
}

impl NotificationRouter {
    pub fn new(policy: RetryPolicy) -> Self {
        Self {
            transports: HashMap::new(),
            policy,
        }
    }

    /// Register the transport for a channel
    pub fn with_transport(mut self, channel: Channel, transport: Arc<dyn Transport>) -> Self {
        self.transports.insert(channel, transport);
        self
    }

    /// Dispatch `payload` to every eligible channel of every recipient.
    ///
    /// Channel eligibility per recipient: push whenever a token is present;
    /// SMS only for High severity and a present phone; email whenever an
    /// address is present. A missing contact silently skips that channel.
    /// Units run as independent tasks; exhausted or permanent failures are
    /// logged and omitted from the result, never raised.
    pub async fn dispatch(
        &self,
        payload: &AlertPayload,
        recipients: &[Recipient],
    ) -> Vec<NotificationRecord> {
        let units = self.plan_units(payload, recipients);
        debug!(
            subject = %payload.subject_id,
            units = units.len(),
            payload = %payload.to_json(),
            "dispatch planned"
        );

        let mut tasks: JoinSet<Option<NotificationRecord>> = JoinSet::new();
        for unit in units {
            let transport = match self.transports.get(&unit.channel) {
                Some(t) => Arc::clone(t),
                None => {
                    warn!(channel = %unit.channel, "no transport registered, skipping unit");
                    continue;
                }
            };
            let policy = self.policy.clone();
            let payload = payload.clone();
            tasks.spawn(async move { deliver_unit(transport, unit, payload, policy).await });
        }

        let mut records = Vec::new();
        while let Some(joined) = tasks.join_next().await {
            match joined {
                Ok(Some(record)) => records.push(record),
                Ok(None) => {}
                Err(e) => warn!("dispatch unit panicked: {e}"),
            }
        }
        info!(
            subject = %payload.subject_id,
            delivered = records.len(),
            "dispatch complete"
        );
        records
    }

    fn plan_units(&self, payload: &AlertPayload, recipients: &[Recipient]) -> Vec<DispatchUnit> {
        let mut units = Vec::new();
        for recipient in recipients {
            if recipient.push_token.is_some() {
                units.push(DispatchUnit {
                    recipient: recipient.clone(),
                    channel: Channel::Push,
                });
            }
            if payload.severity == Severity::High && recipient.phone.is_some() {
                units.push(DispatchUnit {
                    recipient: recipient.clone(),
                    channel: Channel::Sms,
                });
            }
            if recipient.email.is_some() {
                units.push(DispatchUnit {
                    recipient: recipient.clone(),
                    channel: Channel::Email,
                });
            }
        }
        units
    }
}

/// Run one delivery unit to completion: send, retry transient failures with
/// exponential backoff, give up after the attempt budget.
async fn deliver_unit(
    transport: Arc<dyn Transport>,
    unit: DispatchUnit,
    payload: AlertPayload,
    policy: RetryPolicy,
) -> Option<NotificationRecord> {
    for attempt in 0..policy.max_attempts {
        match transport.send(&unit.recipient, &payload).await {
            Ok(delivery_id) => {
                debug!(
                    recipient = %unit.recipient.recipient_id,
                    channel = %unit.channel,
                    delivery_id,
                    "unit delivered"
                );
                return Some(NotificationRecord {
                    notification_id: Uuid::new_v4(),
                    alert_id: payload.alert_id,
                    recipient_id: unit.recipient.recipient_id.clone(),
                    recipient_type: unit.recipient.recipient_type,
                    channel: unit.channel,
                    sent_at: Utc::now(),
                    delivered_at: None,
                    read_at: None,
                });
            }
            Err(TransportError::Permanent(reason)) => {
                warn!(
                    recipient = %unit.recipient.recipient_id,
                    channel = %unit.channel,
                    reason,
                    "permanent failure, not retrying"
                );
                return None;
            }
            Err(TransportError::Transient(reason)) => {
                let last = attempt + 1 == policy.max_attempts;
                warn!(
                    recipient = %unit.recipient.recipient_id,
                    channel = %unit.channel,
                    attempt = attempt + 1,
                    reason,
                    "transient failure"
                );
                if !last {
                    tokio::time::sleep(policy.delay(attempt)).await;
                }
            }
        }
    }
    warn!(
        recipient = %unit.recipient.recipient_id,
        channel = %unit.channel,
        "retries exhausted, unit dropped"
    );
    None
}
