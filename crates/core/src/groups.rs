//! Bulk group reassignment.
//!
//! Hosts are selected either explicitly or through a scope expansion, then
//! updated one at a time. Every host gets its own outcome in the
//! [`BulkReport`]; one failure never stops the others.

use std::collections::BTreeSet;
use std::fmt::Display;

use serde::{Deserialize, Serialize};

use crate::alert::Scope;
use crate::error::CoreError;
use crate::hosts::{normalize_group, HostRegistry};
use crate::scope::expand;

/// Request body for a bulk reassignment.
///
/// `server_ids` and `scope`/`target_id` may be combined; the target set is
/// their union. `group_name` of `null` or blank removes hosts from their group.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct BulkGroupRequest {
    #[serde(default)]
    pub server_ids: Vec<String>,
    pub scope: Option<Scope>,
    pub target_id: Option<String>,
    pub group_name: Option<String>,
}

impl BulkGroupRequest {
    /// The group every selected host moves to.
    pub fn group(&self) -> Option<String> {
        normalize_group(self.group_name.clone())
    }

    /// Hosts to update, sorted and deduplicated.
    ///
    /// Explicit ids are kept even when unknown so they show up as failures
    /// in the report.
    pub fn targets(&self, registry: &HostRegistry) -> Result<Vec<String>, CoreError> {
        if self.server_ids.is_empty() && self.scope.is_none() {
            return Err(CoreError::Validation(
                "either server_ids or scope is required".to_string(),
            ));
        }

        let mut targets: BTreeSet<String> = self
            .server_ids
            .iter()
            .map(|id| id.trim().to_string())
            .filter(|id| !id.is_empty())
            .collect();
        if let Some(scope) = self.scope {
            targets.extend(expand(scope, self.target_id.as_deref(), registry));
        }
        Ok(targets.into_iter().collect())
    }
}

/// Outcome for one host.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HostOutcome {
    pub server_id: String,
    pub success: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

/// Per-host report for a bulk reassignment.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BulkReport {
    pub group_name: Option<String>,
    pub succeeded: usize,
    pub failed: usize,
    pub results: Vec<HostOutcome>,
}

impl BulkReport {
    pub fn new(group_name: Option<String>) -> Self {
        Self {
            group_name,
            succeeded: 0,
            failed: 0,
            results: Vec::new(),
        }
    }

    /// Record the outcome of updating one host.
    pub fn record<E: Display>(&mut self, server_id: impl Into<String>, result: Result<(), E>) {
        let server_id = server_id.into();
        match result {
            Ok(()) => {
                self.succeeded += 1;
                self.results.push(HostOutcome {
                    server_id,
                    success: true,
                    error: None,
                });
            }
            Err(e) => {
                tracing::warn!(server_id = %server_id, error = %e, "Group reassignment failed");
                self.failed += 1;
                self.results.push(HostOutcome {
                    server_id,
                    success: false,
                    error: Some(e.to_string()),
                });
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use assert_matches::assert_matches;

    use super::*;
    use crate::hosts::Host;

    fn registry() -> HostRegistry {
        HostRegistry::from_hosts([
            Host::new("a").with_group("old"),
            Host::new("b").with_group("old"),
            Host::new("c"),
        ])
    }

    #[test]
    fn report_keeps_going_past_a_failure() {
        let mut reg = registry();
        let request = BulkGroupRequest {
            server_ids: vec!["a".into(), "ghost".into(), "c".into()],
            group_name: Some("new".into()),
            ..Default::default()
        };
        let mut report = BulkReport::new(request.group());
        for server_id in request.targets(&reg).unwrap() {
            let result = reg.set_group(&server_id, request.group()).map(|_| ());
            report.record(server_id, result);
        }

        assert_eq!(report.group_name.as_deref(), Some("new"));
        assert_eq!(report.succeeded, 2);
        assert_eq!(report.failed, 1);
        let ghost = report.results.iter().find(|r| r.server_id == "ghost").unwrap();
        assert!(!ghost.success);
        assert!(ghost.error.as_deref().unwrap().contains("ghost"));
        assert_eq!(reg.get("c").unwrap().group_name.as_deref(), Some("new"));
    }

    #[test]
    fn scope_selects_a_whole_group() {
        let targets = BulkGroupRequest {
            scope: Some(Scope::Group),
            target_id: Some("old".into()),
            group_name: Some("renamed".into()),
            ..Default::default()
        }
        .targets(&registry())
        .unwrap();
        assert_eq!(targets, vec!["a", "b"]);
    }

    #[test]
    fn blank_group_means_ungroup() {
        let request = BulkGroupRequest {
            server_ids: vec!["a".into()],
            group_name: Some("   ".into()),
            ..Default::default()
        };
        assert_eq!(request.group(), None);
    }

    #[test]
    fn request_without_selector_is_rejected() {
        let err = BulkGroupRequest {
            group_name: Some("x".into()),
            ..Default::default()
        }
        .targets(&registry())
        .unwrap_err();
        assert_matches!(err, CoreError::Validation(_));
    }

    #[test]
    fn targets_are_deduplicated_across_selectors() {
        let targets = BulkGroupRequest {
            server_ids: vec!["a".into(), "a".into()],
            scope: Some(Scope::Group),
            target_id: Some("old".into()),
            ..Default::default()
        }
        .targets(&registry())
        .unwrap();
        assert_eq!(targets, vec!["a", "b"]);
    }
}
