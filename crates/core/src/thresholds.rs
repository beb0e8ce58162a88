//! Alert threshold resolution.
//!
//! A host may override any of the three percentage thresholds; every metric
//! it leaves unset falls back to the global default. Lookups go through
//! [`Metric`] rather than field names.

use std::collections::{BTreeMap, HashMap};

use serde::{Deserialize, Serialize};

use crate::error::CoreError;
use crate::metrics::Metric;
use crate::validation::validate_threshold_percent;

/// Default for every global threshold when nothing has been configured.
pub const DEFAULT_GLOBAL_PERCENT: f64 = 90.0;

// ---------------------------------------------------------------------------
// Per-host override
// ---------------------------------------------------------------------------

/// Per-host threshold override. `None` means "use the global default".
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ThresholdOverride {
    #[serde(default)]
    pub cpu_threshold: Option<f64>,
    #[serde(default)]
    pub memory_threshold: Option<f64>,
    #[serde(default)]
    pub disk_threshold: Option<f64>,
}

impl ThresholdOverride {
    pub fn get(&self, metric: Metric) -> Option<f64> {
        match metric {
            Metric::Cpu => self.cpu_threshold,
            Metric::Memory => self.memory_threshold,
            Metric::Disk => self.disk_threshold,
        }
    }

    /// `true` when no metric is overridden.
    pub fn is_empty(&self) -> bool {
        Metric::ALL.iter().all(|m| self.get(*m).is_none())
    }

    /// Check every present value lies in `[0.1, 100]`.
    pub fn validate(&self) -> Result<(), CoreError> {
        for metric in Metric::ALL {
            if let Some(value) = self.get(metric) {
                validate_threshold_percent(value, override_field(metric))?;
            }
        }
        Ok(())
    }
}

/// Wire name of the override field for `metric`.
pub fn override_field(metric: Metric) -> &'static str {
    match metric {
        Metric::Cpu => "cpu_threshold",
        Metric::Memory => "memory_threshold",
        Metric::Disk => "disk_threshold",
    }
}

// ---------------------------------------------------------------------------
// Global defaults
// ---------------------------------------------------------------------------

/// Global default thresholds.
///
/// Fields are optional because they mirror nullable storage columns; a
/// missing field is a configuration error at resolution time.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct GlobalAlertConfig {
    pub cpu_total_percent: Option<f64>,
    pub memory_used_percent: Option<f64>,
    pub disk_used_percent: Option<f64>,
}

impl GlobalAlertConfig {
    /// A fully populated config.
    pub fn new(cpu: f64, memory: f64, disk: f64) -> Self {
        Self {
            cpu_total_percent: Some(cpu),
            memory_used_percent: Some(memory),
            disk_used_percent: Some(disk),
        }
    }

    pub fn get(&self, metric: Metric) -> Option<f64> {
        match metric {
            Metric::Cpu => self.cpu_total_percent,
            Metric::Memory => self.memory_used_percent,
            Metric::Disk => self.disk_used_percent,
        }
    }

    /// Validate a config submitted for storage: every field is required.
    pub fn validate(&self) -> Result<(), CoreError> {
        for metric in Metric::ALL {
            let name = global_field(metric);
            match self.get(metric) {
                Some(value) => validate_threshold_percent(value, name)?,
                None => return Err(CoreError::Validation(format!("{name} is required"))),
            }
        }
        Ok(())
    }
}

impl Default for GlobalAlertConfig {
    fn default() -> Self {
        Self::new(
            DEFAULT_GLOBAL_PERCENT,
            DEFAULT_GLOBAL_PERCENT,
            DEFAULT_GLOBAL_PERCENT,
        )
    }
}

/// Wire name of the global config field for `metric`.
pub fn global_field(metric: Metric) -> &'static str {
    match metric {
        Metric::Cpu => "cpu_total_percent",
        Metric::Memory => "memory_used_percent",
        Metric::Disk => "disk_used_percent",
    }
}

// ---------------------------------------------------------------------------
// Resolver
// ---------------------------------------------------------------------------

/// Per-metric override-over-default lookup.
#[derive(Debug, Clone, Default)]
pub struct ThresholdResolver {
    global: GlobalAlertConfig,
    overrides: HashMap<String, ThresholdOverride>,
}

impl ThresholdResolver {
    pub fn new(global: GlobalAlertConfig) -> Self {
        Self {
            global,
            overrides: HashMap::new(),
        }
    }

    /// Build a resolver from already-persisted rows.
    ///
    /// Rows are loaded as stored; out-of-range values surface later as
    /// validation errors from [`resolve`](Self::resolve).
    pub fn from_parts(
        global: GlobalAlertConfig,
        overrides: impl IntoIterator<Item = (String, ThresholdOverride)>,
    ) -> Self {
        Self {
            global,
            overrides: overrides
                .into_iter()
                .filter(|(_, value)| !value.is_empty())
                .collect(),
        }
    }

    /// Effective threshold percentage for `host_id` and `metric`.
    ///
    /// Returns the host override when present, the global default otherwise.
    /// An out-of-range stored override is a validation error (it is never
    /// clamped); a missing global default is a configuration error.
    pub fn resolve(&self, host_id: &str, metric: Metric) -> Result<f64, CoreError> {
        if let Some(value) = self.overrides.get(host_id).and_then(|o| o.get(metric)) {
            validate_threshold_percent(value, override_field(metric)).map_err(|e| {
                CoreError::Validation(format!("stored override for host {host_id}: {e}"))
            })?;
            return Ok(value);
        }
        self.global.get(metric).ok_or_else(|| {
            CoreError::Configuration(format!(
                "global alert config is missing {}",
                global_field(metric)
            ))
        })
    }

    pub fn global(&self) -> &GlobalAlertConfig {
        &self.global
    }

    /// Replace the global defaults after validating them.
    pub fn set_global(&mut self, global: GlobalAlertConfig) -> Result<(), CoreError> {
        global.validate()?;
        self.global = global;
        Ok(())
    }

    pub fn override_for(&self, host_id: &str) -> Option<&ThresholdOverride> {
        self.overrides.get(host_id)
    }

    /// Store (or clear, when empty) a host's override after validating it.
    ///
    /// Returns the previous override.
    pub fn set_override(
        &mut self,
        host_id: &str,
        value: ThresholdOverride,
    ) -> Result<Option<ThresholdOverride>, CoreError> {
        value.validate()?;
        if value.is_empty() {
            return Ok(self.overrides.remove(host_id));
        }
        Ok(self.overrides.insert(host_id.to_string(), value))
    }

    pub fn remove_override(&mut self, host_id: &str) -> Option<ThresholdOverride> {
        self.overrides.remove(host_id)
    }

    /// Complete snapshot of all host overrides, keyed by host id.
    pub fn export(&self) -> BTreeMap<String, ThresholdOverride> {
        self.overrides
            .iter()
            .map(|(host, o)| (host.clone(), *o))
            .collect()
    }
}
