//! Channel transports and retry policy

use crate::directory::Recipient;
use crate::router::AlertPayload;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Mutex;
use std::time::Duration;
use thiserror::Error;

/// Delivery channel
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Channel {
    Push,
    Sms,
    Email,
}

impl Channel {
    pub fn as_str(&self) -> &'static str {
        match self {
            Channel::Push => "push",
            Channel::Sms => "sms",
            Channel::Email => "email",
        }
    }
}

impl std::fmt::Display for Channel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Transport-level send failures
#[derive(Debug, Clone, Error)]
pub enum TransportError {
    /// Worth retrying (timeouts, throttling, flaky gateways)
    #[error("transient transport failure: {0}")]
    Transient(String),

    /// Retrying cannot help (bad address, revoked token)
    #[error("permanent transport failure: {0}")]
    Permanent(String),
}

/// One external sender (push gateway, SMS provider, SMTP relay).
///
/// Timeouts belong to the transport implementation; this core only retries
/// around the call.
#[async_trait]
pub trait Transport: Send + Sync {
    /// Attempt a single delivery, returning the provider's delivery id
    async fn send(&self, recipient: &Recipient, payload: &AlertPayload)
        -> Result<String, TransportError>;
}

/// Exponential backoff policy for one dispatch unit
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct RetryPolicy {
    /// Delay before the first retry
    pub initial_delay_ms: u64,
    /// Backoff cap
    pub max_delay_ms: u64,
    /// Total attempts, including the first
    pub max_attempts: u32,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            initial_delay_ms: 1_000,
            max_delay_ms: 30_000,
            max_attempts: 3,
        }
    }
}

impl RetryPolicy {
    /// Delay before retry number `retry` (0-based), doubling up to the cap
    pub fn delay(&self, retry: u32) -> Duration {
        let ms = self
            .initial_delay_ms
            .saturating_mul(1u64 << retry.min(16))
            .min(self.max_delay_ms);
        Duration::from_millis(ms)
    }
}

/// Scripted transport for tests: fails the first `failures` sends, records
/// every accepted payload.
pub struct MockTransport {
    failures: AtomicUsize,
    permanent: bool,
    sent: Mutex<Vec<(String, AlertPayload)>>,
}

impl MockTransport {
    /// Transport that always succeeds
    pub fn reliable() -> Self {
        Self::failing(0)
    }

    /// Transport that fails transiently the first `failures` times
    pub fn failing(failures: usize) -> Self {
        Self {
            failures: AtomicUsize::new(failures),
            permanent: false,
            sent: Mutex::new(Vec::new()),
        }
    }

    /// Transport that always fails permanently
    pub fn broken() -> Self {
        Self {
            failures: AtomicUsize::new(usize::MAX),
            permanent: true,
            sent: Mutex::new(Vec::new()),
        }
    }

    /// (recipient id, payload) pairs accepted so far
    pub fn sent(&self) -> Vec<(String, AlertPayload)> {
        self.sent.lock().expect("mock transport lock poisoned").clone()
    }
}

#[async_trait]
impl Transport for MockTransport {
    async fn send(
        &self,
        recipient: &Recipient,
        payload: &AlertPayload,
    ) -> Result<String, TransportError> {
        let remaining = self.failures.load(Ordering::SeqCst);
        if remaining > 0 {
            if !self.permanent {
                self.failures.fetch_sub(1, Ordering::SeqCst);
                return Err(TransportError::Transient("scripted failure".into()));
            }
            return Err(TransportError::Permanent("scripted failure".into()));
        }
        self.sent
            .lock()
            .expect("mock transport lock poisoned")
            .push((recipient.recipient_id.clone(), payload.clone()));
        Ok(uuid::Uuid::new_v4().to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_backoff_doubles_to_cap() {
        let policy = RetryPolicy::default();
        assert_eq!(policy.delay(0), Duration::from_millis(1_000));
        assert_eq!(policy.delay(1), Duration::from_millis(2_000));
        assert_eq!(policy.delay(2), Duration::from_millis(4_000));
        assert_eq!(policy.delay(10), Duration::from_millis(30_000));
    }

    #[test]
    fn test_backoff_shift_does_not_overflow() {
        let policy = RetryPolicy {
            initial_delay_ms: u64::MAX / 2,
            max_delay_ms: 30_000,
            max_attempts: 3,
        };
        assert_eq!(policy.delay(60), Duration::from_millis(30_000));
    }
}
