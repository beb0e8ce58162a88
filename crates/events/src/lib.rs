//! Hostwatch notification infrastructure.
//!
//! - [`NotificationBus`]: in-process fan-out of notification requests backed
//!   by `tokio::sync::broadcast`; it is the monitor's notification sink.
//! - [`NotificationDispatcher`]: consumes the bus and delivers with retry.
//! - [`delivery`]: delivery channels (SMTP email, log-only).

pub mod bus;
pub mod delivery;
pub mod dispatcher;

pub use bus::NotificationBus;
pub use delivery::email::{EmailConfig, EmailDelivery};
pub use delivery::log::LogDelivery;
pub use delivery::{DeliveryChannel, DeliveryError};
pub use dispatcher::{NotificationDispatcher, RetryPolicy};
