//! Notification dispatcher: bus consumer with per-recipient retry.
//!
//! [`NotificationDispatcher`] renders each request once and sends it to every
//! recipient through a [`DeliveryChannel`]. Failed sends are retried with
//! exponential backoff; a recipient that still fails is logged and skipped.
//! Nothing here reports back to the engine.

use std::sync::Arc;
use std::time::Duration;

use hostwatch_core::notification::NotificationRequest;
use tokio::sync::broadcast::{self, error::RecvError};
use tokio_util::sync::CancellationToken;

use crate::delivery::message::render;
use crate::delivery::{DeliveryChannel, RenderedMessage};

/// Default number of attempts per recipient.
pub const DEFAULT_MAX_ATTEMPTS: u32 = 3;

/// Delay before the first retry; doubled for each further retry.
const DEFAULT_BASE_DELAY: Duration = Duration::from_secs(1);

/// Retry policy applied to each recipient independently.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    pub max_attempts: u32,
    pub base_delay: Duration,
}

impl RetryPolicy {
    pub fn new(max_attempts: u32) -> Self {
        Self {
            max_attempts: max_attempts.max(1),
            base_delay: DEFAULT_BASE_DELAY,
        }
    }

    /// Delay after failed attempt number `attempt` (1-based).
    pub fn delay_after(&self, attempt: u32) -> Duration {
        self.base_delay
            .saturating_mul(2u32.saturating_pow(attempt.saturating_sub(1)))
    }
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self::new(DEFAULT_MAX_ATTEMPTS)
    }
}

/// Outcome of dispatching one request.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DispatchSummary {
    pub delivered: usize,
    /// Recipients that exhausted every attempt.
    pub failed: Vec<String>,
}

pub struct NotificationDispatcher {
    channel: Arc<dyn DeliveryChannel>,
    policy: RetryPolicy,
}

impl NotificationDispatcher {
    pub fn new(channel: Arc<dyn DeliveryChannel>, policy: RetryPolicy) -> Self {
        Self { channel, policy }
    }

    /// Consume requests until the bus closes or `cancel` fires.
    pub async fn run(
        self,
        mut rx: broadcast::Receiver<NotificationRequest>,
        cancel: CancellationToken,
    ) {
        tracing::info!(channel = self.channel.name(), "Notification dispatcher started");
        loop {
            tokio::select! {
                _ = cancel.cancelled() => {
                    tracing::info!("Notification dispatcher cancelled");
                    break;
                }
                received = rx.recv() => match received {
                    Ok(request) => {
                        self.dispatch(&request).await;
                    }
                    Err(RecvError::Lagged(skipped)) => {
                        tracing::warn!(skipped, "Notification dispatcher lagged, requests dropped");
                    }
                    Err(RecvError::Closed) => {
                        tracing::info!("Notification bus closed, dispatcher stopping");
                        break;
                    }
                }
            }
        }
    }

    /// Deliver one request to all of its recipients.
    pub async fn dispatch(&self, request: &NotificationRequest) -> DispatchSummary {
        let message = render(request);
        let mut summary = DispatchSummary::default();

        for recipient in &request.recipients {
            if self.send_with_retry(recipient, &message).await {
                summary.delivered += 1;
            } else {
                summary.failed.push(recipient.clone());
            }
        }

        if summary.failed.is_empty() {
            tracing::debug!(
                request_id = %request.id,
                delivered = summary.delivered,
                "Notification dispatched"
            );
        } else {
            tracing::error!(
                request_id = %request.id,
                host_id = %request.host_id,
                delivered = summary.delivered,
                failed = summary.failed.len(),
                "Notification delivery incomplete"
            );
        }
        summary
    }

    async fn send_with_retry(&self, to: &str, message: &RenderedMessage) -> bool {
        for attempt in 1..=self.policy.max_attempts {
            match self.channel.send(to, message).await {
                Ok(()) => return true,
                Err(e) => {
                    tracing::warn!(
                        attempt,
                        max_attempts = self.policy.max_attempts,
                        to,
                        error = %e,
                        "Delivery attempt failed"
                    );
                    if attempt < self.policy.max_attempts {
                        tokio::time::sleep(self.policy.delay_after(attempt)).await;
                    }
                }
            }
        }
        false
    }
}
