//! Log-only channel, used when no mail transport is configured.

use async_trait::async_trait;

use super::{DeliveryChannel, DeliveryError, RenderedMessage};

/// Writes each message to the log instead of sending it.
#[derive(Debug, Default)]
pub struct LogDelivery;

#[async_trait]
impl DeliveryChannel for LogDelivery {
    fn name(&self) -> &'static str {
        "log"
    }

    async fn send(&self, to: &str, message: &RenderedMessage) -> Result<(), DeliveryError> {
        tracing::info!(
            to,
            subject = %message.subject,
            body = %message.body,
            "SMTP not configured, notification logged only"
        );
        Ok(())
    }
}
