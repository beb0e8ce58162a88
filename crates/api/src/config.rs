use std::num::NonZeroUsize;
use std::str::FromStr;
use std::time::Duration;

use hostwatch_core::engine::{EngineConfig, DEFAULT_MISSED_CYCLES_THRESHOLD, MAX_MISSED_CYCLES_THRESHOLD};
use hostwatch_core::hosts::DEFAULT_REPORT_INTERVAL_SECS;
use hostwatch_core::metrics_store::DEFAULT_HISTORY_CAPACITY;
use hostwatch_core::monitor::MonitorConfig;
use hostwatch_events::dispatcher::DEFAULT_MAX_ATTEMPTS;

/// Server configuration loaded from environment variables.
///
/// All fields have defaults suitable for local development.
#[derive(Debug, Clone)]
pub struct ServerConfig {
    /// Bind address (default: `0.0.0.0`).
    pub host: String,
    /// Bind port (default: `3000`).
    pub port: u16,
    /// Allowed CORS origins, parsed from comma-separated `CORS_ORIGINS`.
    pub cors_origins: Vec<String>,
    /// HTTP request timeout in seconds (default: `30`).
    pub request_timeout_secs: u64,
    /// Monitoring and alerting settings.
    pub monitor: MonitorSettings,
}

impl ServerConfig {
    /// Load configuration from environment variables with defaults.
    ///
    /// | Env Var                | Default                 |
    /// |------------------------|-------------------------|
    /// | `HOST`                 | `0.0.0.0`               |
    /// | `PORT`                 | `3000`                  |
    /// | `CORS_ORIGINS`         | `http://localhost:5173` |
    /// | `REQUEST_TIMEOUT_SECS` | `30`                    |
    ///
    /// Panics on unparseable values so misconfiguration fails at startup.
    pub fn from_env() -> Self {
        let host = std::env::var("HOST").unwrap_or_else(|_| "0.0.0.0".into());

        let cors_origins: Vec<String> = std::env::var("CORS_ORIGINS")
            .unwrap_or_else(|_| "http://localhost:5173".into())
            .split(',')
            .map(|s| s.trim().to_string())
            .filter(|s| !s.is_empty())
            .collect();

        Self {
            host,
            port: env_or("PORT", 3000),
            cors_origins,
            request_timeout_secs: env_or("REQUEST_TIMEOUT_SECS", 30),
            monitor: MonitorSettings::from_env(),
        }
    }
}

/// Monitoring, alerting and delivery settings.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MonitorSettings {
    /// Samples kept per host (default: `500`, at least 1).
    pub history_capacity: usize,
    /// Missed report intervals before a host is offline (default: `3`,
    /// between 1 and 1000).
    pub missed_cycles_threshold: u32,
    /// Seconds between offline sweeps (default: `60`).
    pub offline_sweep_interval_secs: u64,
    /// Notify on `BREACHED -> NORMAL` (default: `false`).
    pub notify_on_recovery: bool,
    /// Interval given to hosts registered without one (default: `2400`).
    pub default_report_interval: u32,
    /// Delivery attempts per recipient (default: `3`).
    pub delivery_max_attempts: u32,
}

impl MonitorSettings {
    /// | Env Var                        | Default |
    /// |--------------------------------|---------|
    /// | `HISTORY_CAPACITY`             | `500`   |
    /// | `MISSED_CYCLES_THRESHOLD`      | `3`     |
    /// | `OFFLINE_SWEEP_INTERVAL_SECS`  | `60`    |
    /// | `NOTIFY_ON_RECOVERY`           | `false` |
    /// | `DEFAULT_REPORT_INTERVAL_SECS` | `2400`  |
    /// | `DELIVERY_MAX_ATTEMPTS`        | `3`     |
    pub fn from_env() -> Self {
        let settings = Self {
            history_capacity: env_or("HISTORY_CAPACITY", DEFAULT_HISTORY_CAPACITY),
            missed_cycles_threshold: env_or("MISSED_CYCLES_THRESHOLD", DEFAULT_MISSED_CYCLES_THRESHOLD),
            offline_sweep_interval_secs: env_or("OFFLINE_SWEEP_INTERVAL_SECS", 60),
            notify_on_recovery: env_or("NOTIFY_ON_RECOVERY", false),
            default_report_interval: env_or("DEFAULT_REPORT_INTERVAL_SECS", DEFAULT_REPORT_INTERVAL_SECS),
            delivery_max_attempts: env_or("DELIVERY_MAX_ATTEMPTS", DEFAULT_MAX_ATTEMPTS),
        };
        settings.assert_valid();
        settings
    }

    /// Panics on out-of-range values so misconfiguration fails at startup.
    fn assert_valid(&self) {
        assert!(self.history_capacity >= 1, "HISTORY_CAPACITY must be at least 1");
        assert!(
            (1..=MAX_MISSED_CYCLES_THRESHOLD).contains(&self.missed_cycles_threshold),
            "MISSED_CYCLES_THRESHOLD must be between 1 and {MAX_MISSED_CYCLES_THRESHOLD}"
        );
        assert!(
            self.offline_sweep_interval_secs >= 1,
            "OFFLINE_SWEEP_INTERVAL_SECS must be at least 1"
        );
        assert!(
            self.default_report_interval >= 1,
            "DEFAULT_REPORT_INTERVAL_SECS must be at least 1"
        );
    }

    pub fn offline_sweep_interval(&self) -> Duration {
        Duration::from_secs(self.offline_sweep_interval_secs)
    }

    pub fn monitor_config(&self) -> MonitorConfig {
        MonitorConfig {
            history_capacity: NonZeroUsize::new(self.history_capacity).unwrap_or(NonZeroUsize::MIN),
            engine: EngineConfig {
                missed_cycles_threshold: self
                    .missed_cycles_threshold
                    .clamp(1, MAX_MISSED_CYCLES_THRESHOLD),
                notify_on_recovery: self.notify_on_recovery,
            },
            default_report_interval: self.default_report_interval.max(1),
        }
    }
}

impl Default for MonitorSettings {
    fn default() -> Self {
        Self {
            history_capacity: DEFAULT_HISTORY_CAPACITY,
            missed_cycles_threshold: DEFAULT_MISSED_CYCLES_THRESHOLD,
            offline_sweep_interval_secs: 60,
            notify_on_recovery: false,
            default_report_interval: DEFAULT_REPORT_INTERVAL_SECS,
            delivery_max_attempts: DEFAULT_MAX_ATTEMPTS,
        }
    }
}

/// Read `name` from the environment, falling back to `default` when unset.
///
/// Panics if the variable is set but does not parse.
fn env_or<T>(name: &str, default: T) -> T
where
    T: FromStr,
    T::Err: std::fmt::Display,
{
    match std::env::var(name) {
        Ok(raw) => raw
            .trim()
            .parse()
            .unwrap_or_else(|e| panic!("{name} has an invalid value '{raw}': {e}")),
        Err(_) => default,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_map_onto_monitor_config() {
        let config = MonitorSettings::default().monitor_config();
        assert_eq!(config.history_capacity.get(), 500);
        assert_eq!(config.engine.missed_cycles_threshold, 3);
        assert!(!config.engine.notify_on_recovery);
        assert_eq!(config.default_report_interval, 2400);
    }

    #[test]
    fn defaults_pass_validation() {
        MonitorSettings::default().assert_valid();
    }

    #[test]
    #[should_panic(expected = "MISSED_CYCLES_THRESHOLD must be between 1 and 1000")]
    fn oversized_missed_cycles_threshold_is_rejected() {
        MonitorSettings {
            missed_cycles_threshold: u32::MAX,
            ..MonitorSettings::default()
        }
        .assert_valid();
    }

    #[test]
    fn monitor_config_clamps_missed_cycles_threshold() {
        let settings = MonitorSettings {
            missed_cycles_threshold: 5000,
            ..MonitorSettings::default()
        };
        assert_eq!(settings.monitor_config().engine.missed_cycles_threshold, 1000);
    }

    #[test]
    fn env_or_falls_back_when_unset() {
        std::env::remove_var("HOSTWATCH_TEST_UNSET_VAR");
        assert_eq!(env_or("HOSTWATCH_TEST_UNSET_VAR", 42u32), 42);
    }

    #[test]
    fn env_or_parses_set_values() {
        std::env::set_var("HOSTWATCH_TEST_BOOL_VAR", "true");
        assert!(env_or("HOSTWATCH_TEST_BOOL_VAR", false));
    }
}
