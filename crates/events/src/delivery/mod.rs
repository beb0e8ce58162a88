//! Delivery channels for notification messages.
//!
//! A [`DeliveryChannel`] sends one rendered message to one address. The
//! dispatcher owns retry; channels make a single attempt.

use async_trait::async_trait;

pub mod email;
pub mod log;
pub mod message;

pub use message::RenderedMessage;

/// Error type for delivery failures.
#[derive(Debug, thiserror::Error)]
pub enum DeliveryError {
    /// SMTP transport-level failure (authentication, connection, etc.).
    #[error("SMTP transport error: {0}")]
    Transport(#[from] lettre::transport::smtp::Error),

    /// The recipient or sender address could not be parsed.
    #[error("Email address parse error: {0}")]
    Address(#[from] lettre::address::AddressError),

    /// The MIME message could not be assembled.
    #[error("Email build error: {0}")]
    Build(String),
}

/// One-shot delivery of a rendered message.
#[async_trait]
pub trait DeliveryChannel: Send + Sync {
    /// Short name used in logs.
    fn name(&self) -> &'static str;

    async fn send(&self, to: &str, message: &RenderedMessage) -> Result<(), DeliveryError>;
}
