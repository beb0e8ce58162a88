//! Metric sample types reported by monitored hosts.
//!
//! A [`MetricReport`] is what a host sends; once accepted it becomes a
//! [`MetricSample`] stamped with a definite timestamp. The three
//! threshold-bearing metrics are enumerated by [`Metric`].

use serde::{Deserialize, Serialize};

use crate::error::CoreError;
use crate::types::{HostId, Timestamp};
use crate::validation::validate_measured_percent;

// ---------------------------------------------------------------------------
// Metric
// ---------------------------------------------------------------------------

/// A metric that can be compared against a percentage threshold.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Metric {
    Cpu,
    Memory,
    Disk,
}

impl Metric {
    /// Every threshold-bearing metric, in a fixed order.
    pub const ALL: [Metric; 3] = [Metric::Cpu, Metric::Memory, Metric::Disk];

    pub fn as_str(self) -> &'static str {
        match self {
            Metric::Cpu => "cpu",
            Metric::Memory => "memory",
            Metric::Disk => "disk",
        }
    }

    /// The percentage this metric reports for a set of readings.
    ///
    /// Memory is derived from `used / total`; a non-positive total yields
    /// `0.0` (such samples are rejected at ingest anyway).
    pub fn percent_of(self, usage: &ResourceUsage) -> f64 {
        match self {
            Metric::Cpu => usage.cpu.total,
            Metric::Memory => {
                if usage.memory.total > 0.0 {
                    usage.memory.used / usage.memory.total * 100.0
                } else {
                    0.0
                }
            }
            Metric::Disk => usage.disk.percent,
        }
    }
}

impl std::fmt::Display for Metric {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

// ---------------------------------------------------------------------------
// Readings
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CpuStats {
    pub total: f64,
    #[serde(default)]
    pub per_core: Vec<f64>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MemoryStats {
    pub total: f64,
    pub used: f64,
    pub free: f64,
    pub cache: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DiskStats {
    pub total: f64,
    pub used: f64,
    pub free: f64,
    pub percent: f64,
}

/// Per-container usage, when the host reports it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ContainerStats {
    pub name: String,
    pub cpu: Option<f64>,
    pub mem: Option<f64>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DockerStats {
    pub running_containers: u32,
    #[serde(default)]
    pub containers: Vec<ContainerStats>,
}

/// The resource readings carried by one report.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ResourceUsage {
    pub cpu: CpuStats,
    pub memory: MemoryStats,
    pub disk: DiskStats,
    pub docker: DockerStats,
}

impl ResourceUsage {
    /// Reject physically impossible readings.
    pub fn validate(&self) -> Result<(), CoreError> {
        validate_measured_percent(self.cpu.total, "cpu.total")?;
        for core in &self.cpu.per_core {
            validate_measured_percent(*core, "cpu.per_core")?;
        }
        let mem = &self.memory;
        if !(mem.total.is_finite() && mem.used.is_finite()) || mem.total <= 0.0 {
            return Err(CoreError::Validation(
                "memory.total must be a positive number".to_string(),
            ));
        }
        if mem.used > mem.total {
            return Err(CoreError::Validation(
                "memory.used cannot exceed memory.total".to_string(),
            ));
        }
        validate_measured_percent(self.disk.percent, "disk.percent")?;
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// Report / sample
// ---------------------------------------------------------------------------

/// A usage report as sent by a host.
#[derive(Debug, Clone, Deserialize)]
pub struct MetricReport {
    #[serde(alias = "host_id")]
    pub server_id: HostId,
    /// Host-side timestamp; the receive time is used when absent.
    pub timestamp: Option<Timestamp>,
    #[serde(flatten)]
    pub usage: ResourceUsage,
}

impl MetricReport {
    /// Validate the report and turn it into a stored sample.
    pub fn into_sample(self, received_at: Timestamp) -> Result<MetricSample, CoreError> {
        if self.server_id.trim().is_empty() {
            return Err(CoreError::Validation("server_id is required".to_string()));
        }
        self.usage.validate()?;
        Ok(MetricSample {
            host_id: self.server_id,
            timestamp: self.timestamp.unwrap_or(received_at),
            usage: self.usage,
        })
    }
}

/// An accepted sample, as held by the metrics store.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MetricSample {
    #[serde(rename = "server_id")]
    pub host_id: HostId,
    pub timestamp: Timestamp,
    #[serde(flatten)]
    pub usage: ResourceUsage,
}

impl MetricSample {
    /// The percentage value of `metric` in this sample.
    pub fn percent(&self, metric: Metric) -> f64 {
        metric.percent_of(&self.usage)
    }
}

// ---------------------------------------------------------------------------
// Test fixtures
// ---------------------------------------------------------------------------

/// Build a sample with the given CPU / memory-used / disk percentages.
///
/// Memory is modelled with a total of 1000 so `mem_percent` maps directly to
/// `used = mem_percent * 10`.
#[cfg(test)]
pub(crate) fn sample_fixture(
    host_id: &str,
    cpu: f64,
    mem_percent: f64,
    disk: f64,
) -> MetricSample {
    MetricSample {
        host_id: host_id.to_string(),
        timestamp: chrono::Utc::now(),
        usage: ResourceUsage {
            cpu: CpuStats {
                total: cpu,
                per_core: vec![cpu],
            },
            memory: MemoryStats {
                total: 1000.0,
                used: mem_percent * 10.0,
                free: 1000.0 - mem_percent * 10.0,
                cache: 0.0,
            },
            disk: DiskStats {
                total: 1000.0,
                used: disk * 10.0,
                free: 1000.0 - disk * 10.0,
                percent: disk,
            },
            docker: DockerStats {
                running_containers: 0,
                containers: Vec::new(),
            },
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;

    fn report_json(cpu: f64) -> serde_json::Value {
        serde_json::json!({
            "server_id": "srv1",
            "memory": {"total": 1000.0, "used": 200.0, "free": 800.0, "cache": 0.0},
            "cpu": {"total": cpu, "per_core": [cpu]},
            "disk": {"total": 1000.0, "used": 100.0, "free": 900.0, "percent": 10.0},
            "docker": {"running_containers": 2}
        })
    }

    #[test]
    fn report_without_timestamp_uses_receive_time() {
        let report: MetricReport = serde_json::from_value(report_json(60.0)).unwrap();
        let now = Utc::now();
        let sample = report.into_sample(now).unwrap();
        assert_eq!(sample.timestamp, now);
        assert_eq!(sample.host_id, "srv1");
        assert!(sample.usage.docker.containers.is_empty());
    }

    #[test]
    fn memory_percent_is_derived_from_used_over_total() {
        let sample = sample_fixture("h1", 10.0, 42.0, 5.0);
        assert!((sample.percent(Metric::Memory) - 42.0).abs() < 1e-9);
        assert_eq!(sample.percent(Metric::Cpu), 10.0);
        assert_eq!(sample.percent(Metric::Disk), 5.0);
    }

    #[test]
    fn cpu_out_of_range_is_rejected() {
        let report: MetricReport = serde_json::from_value(report_json(101.0)).unwrap();
        let err = report.into_sample(Utc::now()).unwrap_err();
        assert!(err.to_string().contains("cpu.total"));
    }

    #[test]
    fn memory_used_above_total_is_rejected() {
        let mut sample = sample_fixture("h1", 10.0, 10.0, 10.0);
        sample.usage.memory.used = 2000.0;
        assert!(sample.usage.validate().is_err());
    }

    #[test]
    fn per_core_out_of_range_is_rejected() {
        let mut sample = sample_fixture("h1", 10.0, 10.0, 10.0);
        sample.usage.cpu.per_core = vec![10.0, 120.0];
        assert!(sample.usage.validate().is_err());
    }

    #[test]
    fn sample_serializes_with_server_id_key() {
        let sample = sample_fixture("h1", 10.0, 10.0, 10.0);
        let json = serde_json::to_value(&sample).unwrap();
        assert_eq!(json["server_id"], "h1");
        assert_eq!(json["cpu"]["total"], 10.0);
    }
}
