//! Hostwatch domain logic.
//!
//! Pure, database-free building blocks for host monitoring:
//!
//! - [`metrics_store::MetricsStore`]: bounded per-host sample history.
//! - [`thresholds::ThresholdResolver`]: per-host override over global defaults.
//! - [`scope`]: rule scope expansion to concrete hosts.
//! - [`engine::AlertRuleEngine`]: breach state machines and recipient matching.
//! - [`monitor::Monitor`]: the aggregate the API serves from.

pub mod alert;
pub mod engine;
pub mod error;
pub mod groups;
pub mod hosts;
pub mod metrics;
pub mod metrics_store;
pub mod monitor;
pub mod notification;
pub mod scope;
pub mod threshold_transfer;
pub mod thresholds;
pub mod types;
pub mod validation;
