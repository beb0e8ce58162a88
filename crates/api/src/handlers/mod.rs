pub mod alerts;
pub mod metrics;
pub mod notifications;
pub mod recipients;
pub mod servers;
pub mod thresholds;
