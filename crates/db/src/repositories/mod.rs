//! Repository layer.
//!
//! Each repository is a zero-sized struct providing async methods that
//! accept `&PgPool` as the first argument.

pub mod alert_config_repo;
pub mod alert_rule_repo;
pub mod host_repo;
pub mod recipient_repo;
pub mod sample_repo;
pub mod threshold_repo;

pub use alert_config_repo::AlertConfigRepo;
pub use alert_rule_repo::AlertRuleRepo;
pub use host_repo::HostRepo;
pub use recipient_repo::RecipientRepo;
pub use sample_repo::SampleRepo;
pub use threshold_repo::ThresholdRepo;
