//! Alert rules and always-notify recipients.

use std::collections::BTreeSet;

use serde::{Deserialize, Serialize};

use crate::error::CoreError;
use crate::hosts::HostRegistry;
use crate::metrics::Metric;
use crate::types::DbId;
use crate::validation::{normalize_email, require_non_blank};

// ---------------------------------------------------------------------------
// Alert type / scope
// ---------------------------------------------------------------------------

/// What an alert rule watches.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AlertType {
    Cpu,
    Memory,
    Disk,
    Offline,
}

impl AlertType {
    pub const ALL: [AlertType; 4] = [
        AlertType::Cpu,
        AlertType::Memory,
        AlertType::Disk,
        AlertType::Offline,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            AlertType::Cpu => "cpu",
            AlertType::Memory => "memory",
            AlertType::Disk => "disk",
            AlertType::Offline => "offline",
        }
    }

    /// Parse a stored value.
    pub fn from_str_value(s: &str) -> Result<Self, CoreError> {
        Self::ALL
            .into_iter()
            .find(|t| t.as_str() == s)
            .ok_or_else(|| CoreError::Validation(format!("invalid alert_type '{s}'")))
    }

    /// The threshold metric behind this alert type; `None` for `offline`.
    pub fn metric(self) -> Option<Metric> {
        match self {
            AlertType::Cpu => Some(Metric::Cpu),
            AlertType::Memory => Some(Metric::Memory),
            AlertType::Disk => Some(Metric::Disk),
            AlertType::Offline => None,
        }
    }
}

impl From<Metric> for AlertType {
    fn from(metric: Metric) -> Self {
        match metric {
            Metric::Cpu => AlertType::Cpu,
            Metric::Memory => AlertType::Memory,
            Metric::Disk => AlertType::Disk,
        }
    }
}

impl std::fmt::Display for AlertType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Which hosts a rule applies to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Scope {
    Global,
    Server,
    Group,
}

impl Scope {
    pub fn as_str(self) -> &'static str {
        match self {
            Scope::Global => "global",
            Scope::Server => "server",
            Scope::Group => "group",
        }
    }

    pub fn from_str_value(s: &str) -> Result<Self, CoreError> {
        match s {
            "global" => Ok(Scope::Global),
            "server" => Ok(Scope::Server),
            "group" => Ok(Scope::Group),
            other => Err(CoreError::Validation(format!("invalid scope '{other}'"))),
        }
    }
}

// ---------------------------------------------------------------------------
// Rules
// ---------------------------------------------------------------------------

/// A stored alert rule.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AlertRule {
    pub id: DbId,
    pub alert_type: AlertType,
    pub scope: Scope,
    pub target_id: Option<String>,
    /// Sorted, deduplicated, lower-cased.
    pub emails: Vec<String>,
}

/// A rule submitted for creation.
#[derive(Debug, Clone, Deserialize)]
pub struct NewAlertRule {
    pub alert_type: AlertType,
    pub scope: Scope,
    pub target_id: Option<String>,
    pub emails: Vec<String>,
}

impl NewAlertRule {
    /// Validate against the current registry and normalise the email set.
    ///
    /// - `target_id` is required for `server`/`group` scope and must name an
    ///   existing host/group; it must be absent for `global` scope.
    /// - the email set must be non-empty after deduplication.
    pub fn validate(self, registry: &HostRegistry) -> Result<Self, CoreError> {
        let target_id = self
            .target_id
            .map(|t| t.trim().to_string())
            .filter(|t| !t.is_empty());

        match (self.scope, target_id.as_deref()) {
            (Scope::Global, Some(_)) => {
                return Err(CoreError::Validation(
                    "target_id must be empty for global scope".to_string(),
                ));
            }
            (Scope::Global, None) => {}
            (scope, None) => {
                return Err(CoreError::Validation(format!(
                    "target_id is required for {} scope",
                    scope.as_str()
                )));
            }
            (Scope::Server, Some(host)) if !registry.contains(host) => {
                return Err(CoreError::Validation(format!("unknown host: {host}")));
            }
            (Scope::Group, Some(group)) if !registry.group_exists(group) => {
                return Err(CoreError::Validation(format!("unknown group: {group}")));
            }
            _ => {}
        }

        let emails = normalize_email_set(&self.emails)?;
        if emails.is_empty() {
            return Err(CoreError::Validation(
                "at least one recipient email is required".to_string(),
            ));
        }

        Ok(Self {
            alert_type: self.alert_type,
            scope: self.scope,
            target_id,
            emails,
        })
    }

    pub fn into_rule(self, id: DbId) -> AlertRule {
        AlertRule {
            id,
            alert_type: self.alert_type,
            scope: self.scope,
            target_id: self.target_id,
            emails: self.emails,
        }
    }
}

/// Validate, lower-case, sort and deduplicate a list of addresses.
pub fn normalize_email_set(raw: &[String]) -> Result<Vec<String>, CoreError> {
    let mut set = BTreeSet::new();
    for email in raw {
        set.insert(normalize_email(email)?);
    }
    Ok(set.into_iter().collect())
}

// ---------------------------------------------------------------------------
// Recipients
// ---------------------------------------------------------------------------

/// Which alerts an always-notify recipient receives.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RecipientCategory {
    /// Every alert type.
    All,
    Cpu,
    Memory,
    Disk,
    Offline,
}

impl RecipientCategory {
    pub fn as_str(self) -> &'static str {
        match self {
            RecipientCategory::All => "all",
            RecipientCategory::Cpu => "cpu",
            RecipientCategory::Memory => "memory",
            RecipientCategory::Disk => "disk",
            RecipientCategory::Offline => "offline",
        }
    }

    pub fn from_str_value(s: &str) -> Result<Self, CoreError> {
        match s {
            "all" => Ok(RecipientCategory::All),
            other => AlertType::from_str_value(other)
                .map(Self::from)
                .map_err(|_| CoreError::Validation(format!("invalid category '{other}'"))),
        }
    }

    pub fn covers(self, alert_type: AlertType) -> bool {
        match self {
            RecipientCategory::All => true,
            other => Self::from(alert_type) == other,
        }
    }
}

impl From<AlertType> for RecipientCategory {
    fn from(alert_type: AlertType) -> Self {
        match alert_type {
            AlertType::Cpu => RecipientCategory::Cpu,
            AlertType::Memory => RecipientCategory::Memory,
            AlertType::Disk => RecipientCategory::Disk,
            AlertType::Offline => RecipientCategory::Offline,
        }
    }
}

/// A standalone extra address notified independently of rules.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Recipient {
    pub id: DbId,
    pub email: String,
    pub name: Option<String>,
    pub category: RecipientCategory,
}

/// A recipient submitted for creation.
#[derive(Debug, Clone, Deserialize)]
pub struct NewRecipient {
    pub email: String,
    pub name: Option<String>,
    #[serde(default = "default_category")]
    pub category: RecipientCategory,
}

fn default_category() -> RecipientCategory {
    RecipientCategory::All
}

impl NewRecipient {
    pub fn validate(self) -> Result<Self, CoreError> {
        let email = normalize_email(&self.email)?;
        let name = self.name.map(|n| n.trim().to_string());
        if let Some(name) = &name {
            require_non_blank(name, "name")?;
        }
        Ok(Self {
            email,
            name,
            category: self.category,
        })
    }

    pub fn into_recipient(self, id: DbId) -> Recipient {
        Recipient {
            id,
            email: self.email,
            name: self.name,
            category: self.category,
        }
    }
}

#[cfg(test)]
mod tests {
    use assert_matches::assert_matches;

    use super::*;
    use crate::hosts::Host;

    fn registry() -> HostRegistry {
        HostRegistry::from_hosts([Host::new("srv1").with_group("web"), Host::new("srv2")])
    }

    fn rule(scope: Scope, target: Option<&str>, emails: &[&str]) -> NewAlertRule {
        NewAlertRule {
            alert_type: AlertType::Cpu,
            scope,
            target_id: target.map(str::to_string),
            emails: emails.iter().map(|e| e.to_string()).collect(),
        }
    }

    #[test]
    fn global_rule_needs_no_target() {
        let r = rule(Scope::Global, None, &["a@x.io"]).validate(&registry());
        assert!(r.is_ok());
    }

    #[test]
    fn non_global_rule_requires_target() {
        for scope in [Scope::Server, Scope::Group] {
            let err = rule(scope, None, &["a@x.io"])
                .validate(&registry())
                .unwrap_err();
            assert_matches!(err, CoreError::Validation(msg) if msg.contains("target_id"));
        }
        let err = rule(Scope::Server, Some("  "), &["a@x.io"])
            .validate(&registry())
            .unwrap_err();
        assert_matches!(err, CoreError::Validation(_));
    }

    #[test]
    fn target_must_exist_at_creation() {
        assert!(rule(Scope::Server, Some("ghost"), &["a@x.io"])
            .validate(&registry())
            .is_err());
        assert!(rule(Scope::Group, Some("db"), &["a@x.io"])
            .validate(&registry())
            .is_err());
        assert!(rule(Scope::Group, Some("web"), &["a@x.io"])
            .validate(&registry())
            .is_ok());
    }

    #[test]
    fn empty_email_set_is_rejected() {
        let err = rule(Scope::Global, None, &[]).validate(&registry()).unwrap_err();
        assert_matches!(err, CoreError::Validation(msg) if msg.contains("recipient"));
    }

    #[test]
    fn emails_are_normalized_and_deduplicated() {
        let r = rule(Scope::Global, None, &["B@x.io", "a@x.io", " b@x.io "])
            .validate(&registry())
            .unwrap();
        assert_eq!(r.emails, vec!["a@x.io", "b@x.io"]);
    }

    #[test]
    fn recipient_category_coverage() {
        assert!(RecipientCategory::All.covers(AlertType::Offline));
        assert!(RecipientCategory::Disk.covers(AlertType::Disk));
        assert!(!RecipientCategory::Disk.covers(AlertType::Cpu));
    }

    #[test]
    fn stored_values_round_trip_through_parsers() {
        for t in AlertType::ALL {
            assert_eq!(AlertType::from_str_value(t.as_str()).unwrap(), t);
        }
        assert_eq!(
            RecipientCategory::from_str_value("all").unwrap(),
            RecipientCategory::All
        );
        assert!(RecipientCategory::from_str_value("gpu").is_err());
        assert!(Scope::from_str_value("cluster").is_err());
    }
}
