//! Threshold bulk transfer (export / import).
//!
//! The transfer document is a JSON object keyed by host id whose values
//! mirror [`ThresholdOverride`]. Export and import use the same shape.
//!
//! Import is validated row by row before anything is applied. Whether a
//! document with rejected rows is applied at all depends on [`ImportMode`].
//! A row with no fields set clears that host's override, both when stored and
//! when mirrored in memory.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::hosts::HostRegistry;
use crate::thresholds::ThresholdOverride;

/// The export document: every host override keyed by host id.
pub type ThresholdDocument = BTreeMap<String, ThresholdOverride>;

/// The import document before per-row parsing, so a malformed row can be
/// reported without failing the whole request.
pub type RawThresholdDocument = BTreeMap<String, serde_json::Value>;

/// How an import containing rejected rows is applied.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ImportMode {
    /// All-or-nothing: a single rejected row means nothing is applied.
    #[default]
    Atomic,
    /// Best effort: valid rows are applied, rejected rows are reported.
    Partial,
}

/// A row that failed validation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RejectedRow {
    pub server_id: String,
    pub reason: String,
}

/// Outcome of an import, identical in shape for both modes.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ImportReport {
    pub mode: ImportMode,
    pub total: usize,
    pub valid: usize,
    pub invalid: usize,
    /// Number of rows actually written.
    pub applied: usize,
    pub rejected: Vec<RejectedRow>,
}

/// Validated import rows, split into accepted and rejected.
#[derive(Debug, Clone, Default)]
pub struct ImportPlan {
    pub accepted: Vec<(String, ThresholdOverride)>,
    pub rejected: Vec<RejectedRow>,
}

impl ImportPlan {
    /// Validate every row of `doc` against value ranges and the host
    /// registry.
    pub fn validate(doc: RawThresholdDocument, registry: &HostRegistry) -> Self {
        let mut plan = Self::default();
        for (server_id, raw) in doc {
            match validate_row(&server_id, raw, registry) {
                Ok(row) => plan.accepted.push((server_id, row)),
                Err(reason) => plan.rejected.push(RejectedRow { server_id, reason }),
            }
        }
        plan
    }

    /// Rows that should be written under `mode`.
    pub fn rows_to_apply(&self, mode: ImportMode) -> &[(String, ThresholdOverride)] {
        match mode {
            ImportMode::Atomic if !self.rejected.is_empty() => &[],
            _ => &self.accepted,
        }
    }

    /// Build the report for this plan once `applied` rows were written.
    pub fn report(&self, mode: ImportMode, applied: usize) -> ImportReport {
        ImportReport {
            mode,
            total: self.accepted.len() + self.rejected.len(),
            valid: self.accepted.len(),
            invalid: self.rejected.len(),
            applied,
            rejected: self.rejected.clone(),
        }
    }
}

fn validate_row(
    server_id: &str,
    raw: serde_json::Value,
    registry: &HostRegistry,
) -> Result<ThresholdOverride, String> {
    if server_id.trim().is_empty() {
        return Err("server_id is required".to_string());
    }
    if !registry.contains(server_id) {
        return Err(format!("unknown host: {server_id}"));
    }
    let row: ThresholdOverride =
        serde_json::from_value(raw).map_err(|e| format!("malformed row: {e}"))?;
    row.validate().map_err(|e| e.to_string())?;
    Ok(row)
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;
    use crate::hosts::Host;
    use crate::thresholds::{GlobalAlertConfig, ThresholdResolver};

    fn registry() -> HostRegistry {
        HostRegistry::from_hosts([Host::new("srv1"), Host::new("srv2")])
    }

    fn doc(value: serde_json::Value) -> RawThresholdDocument {
        serde_json::from_value(value).unwrap()
    }

    #[test]
    fn invalid_row_is_reported_with_reason() {
        let plan = ImportPlan::validate(
            doc(json!({
                "srv1": {"cpu_threshold": 150.0},
                "srv2": {"cpu_threshold": 30.0}
            })),
            &registry(),
        );
        assert_eq!(plan.accepted.len(), 1);
        assert_eq!(plan.rejected.len(), 1);
        assert_eq!(plan.rejected[0].server_id, "srv1");
        assert!(plan.rejected[0].reason.contains("cpu_threshold"));
    }

    #[test]
    fn atomic_mode_applies_nothing_when_any_row_is_rejected() {
        let plan = ImportPlan::validate(
            doc(json!({
                "srv1": {"cpu_threshold": 150.0},
                "srv2": {"cpu_threshold": 30.0}
            })),
            &registry(),
        );
        assert!(plan.rows_to_apply(ImportMode::Atomic).is_empty());

        let report = plan.report(ImportMode::Atomic, 0);
        assert_eq!(report.total, 2);
        assert_eq!(report.valid, 1);
        assert_eq!(report.invalid, 1);
        assert_eq!(report.applied, 0);
    }

    #[test]
    fn partial_mode_applies_valid_rows() {
        let plan = ImportPlan::validate(
            doc(json!({
                "srv1": {"cpu_threshold": 150.0},
                "srv2": {"cpu_threshold": 30.0}
            })),
            &registry(),
        );
        let rows = plan.rows_to_apply(ImportMode::Partial);
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].0, "srv2");
        assert_eq!(rows[0].1.cpu_threshold, Some(30.0));
    }

    #[test]
    fn clean_document_applies_fully_in_atomic_mode() {
        let plan = ImportPlan::validate(
            doc(json!({
                "srv1": {"cpu_threshold": 45.0, "memory_threshold": 50.0},
                "srv2": {"disk_threshold": 30.0}
            })),
            &registry(),
        );
        assert_eq!(plan.rows_to_apply(ImportMode::Atomic).len(), 2);
    }

    #[test]
    fn unknown_host_and_malformed_rows_are_rejected() {
        let plan = ImportPlan::validate(
            doc(json!({
                "ghost": {"cpu_threshold": 45.0},
                "srv1": {"cpu_threshold": "high"},
                "srv2": {"cpu_treshold": 40.0}
            })),
            &registry(),
        );
        assert!(plan.accepted.is_empty());
        let reasons: Vec<&str> = plan.rejected.iter().map(|r| r.reason.as_str()).collect();
        assert!(reasons[0].starts_with("unknown host"));
        assert!(reasons[1].starts_with("malformed row"));
        assert!(reasons[2].starts_with("malformed row"));
    }

    #[test]
    fn empty_row_clears_an_existing_override() {
        let mut resolver = ThresholdResolver::from_parts(
            GlobalAlertConfig::default(),
            [(
                "srv1".to_string(),
                ThresholdOverride {
                    cpu_threshold: Some(50.0),
                    ..Default::default()
                },
            )],
        );
        let plan = ImportPlan::validate(doc(json!({ "srv1": {} })), &registry());
        let rows = plan.rows_to_apply(ImportMode::Atomic);
        assert_eq!(rows.len(), 1);
        assert!(rows[0].1.is_empty());

        for (server_id, value) in rows {
            resolver.set_override(server_id, *value).unwrap();
        }
        assert!(resolver.override_for("srv1").is_none());
        assert!(resolver.export().is_empty());
    }

    #[test]
    fn import_mode_defaults_to_atomic() {
        assert_eq!(ImportMode::default(), ImportMode::Atomic);
        let mode: ImportMode = serde_json::from_value(json!("partial")).unwrap();
        assert_eq!(mode, ImportMode::Partial);
    }
}
