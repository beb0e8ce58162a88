//! Alert rule engine: breach state machines and recipient matching.
//!
//! Each `(host, alert type)` pair is a two-state machine, `NORMAL` or
//! `BREACHED`. Rules carry no threshold of their own, so every rule of one
//! alert type covering one host moves in lockstep; the engine keeps a single
//! machine per pair and fans each transition out to the union of all matching
//! rules' recipients. One transition therefore yields at most one
//! [`NotificationRequest`].
//!
//! - `cpu`/`memory`/`disk` are driven by samples ([`AlertRuleEngine::evaluate_sample`]).
//! - `offline` is driven by time ([`AlertRuleEngine::sweep_offline`]).
//!
//! A transition is committed before its notification is built and is never
//! undone because of anything on the delivery side.

use std::collections::BTreeSet;

use chrono::Duration;
use dashmap::mapref::entry::Entry;
use dashmap::DashMap;
use serde::Serialize;
use uuid::Uuid;

use crate::alert::{AlertRule, AlertType, Recipient};
use crate::hosts::{Host, HostRegistry};
use crate::metrics::{Metric, MetricSample};
use crate::notification::{NotificationKind, NotificationRequest};
use crate::scope::rule_hosts;
use crate::thresholds::ThresholdResolver;
use crate::types::{DbId, Timestamp};

/// Reports a host may miss before it is considered offline.
pub const DEFAULT_MISSED_CYCLES_THRESHOLD: u32 = 3;

/// Upper bound accepted for the missed-cycles setting.
pub const MAX_MISSED_CYCLES_THRESHOLD: u32 = 1000;

/// Engine tunables.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EngineConfig {
    /// Offline once `now - last_seen > report_interval * missed_cycles_threshold`.
    pub missed_cycles_threshold: u32,
    /// Emit a notification on `BREACHED -> NORMAL` as well.
    pub notify_on_recovery: bool,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            missed_cycles_threshold: DEFAULT_MISSED_CYCLES_THRESHOLD,
            notify_on_recovery: false,
        }
    }
}

/// State of one `(host, alert type)` machine.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum BreachState {
    Normal,
    Breached,
}

/// Everything the engine reads besides its own state, passed per call.
#[derive(Debug, Clone, Copy)]
pub struct AlertContext<'a> {
    pub registry: &'a HostRegistry,
    pub resolver: &'a ThresholdResolver,
    pub rules: &'a [AlertRule],
    pub recipients: &'a [Recipient],
}

/// A pair currently in `BREACHED`.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ActiveBreach {
    pub host_id: String,
    pub alert_type: AlertType,
    pub since: Timestamp,
    pub value: Option<f64>,
    pub threshold: Option<f64>,
}

#[derive(Debug, Clone, Copy)]
struct BreachEntry {
    since: Timestamp,
    value: Option<f64>,
    threshold: Option<f64>,
}

/// Observation fed into a state machine.
#[derive(Debug, Clone, Copy)]
struct Observation {
    breached: bool,
    value: Option<f64>,
    threshold: Option<f64>,
    at: Timestamp,
}

/// Per-`(host, alert type)` breach tracking. Absent entries are `NORMAL`.
#[derive(Debug, Default)]
pub struct AlertRuleEngine {
    config: EngineConfig,
    breaches: DashMap<(String, AlertType), BreachEntry>,
    last_seen: DashMap<String, Timestamp>,
}

impl AlertRuleEngine {
    pub fn new(config: EngineConfig) -> Self {
        Self {
            config,
            breaches: DashMap::new(),
            last_seen: DashMap::new(),
        }
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    /// Evaluate the threshold metrics of a freshly ingested sample.
    ///
    /// Metrics whose threshold cannot be resolved are logged and skipped;
    /// the other metrics are still evaluated.
    pub fn evaluate_sample(
        &self,
        ctx: &AlertContext<'_>,
        host: &Host,
        sample: &MetricSample,
    ) -> Vec<NotificationRequest> {
        if !host.data_monitoring_enabled {
            self.clear_host(&host.server_id);
            return Vec::new();
        }

        let mut requests = Vec::new();
        for metric in Metric::ALL {
            let threshold = match ctx.resolver.resolve(&host.server_id, metric) {
                Ok(t) => t,
                Err(e) => {
                    tracing::error!(
                        host_id = %host.server_id,
                        metric = %metric,
                        error = %e,
                        "Threshold resolution failed, skipping metric"
                    );
                    continue;
                }
            };
            let value = sample.percent(metric);
            let observation = Observation {
                breached: value > threshold,
                value: Some(value),
                threshold: Some(threshold),
                at: sample.timestamp,
            };
            if let Some(request) = self.observe(ctx, host, AlertType::from(metric), observation) {
                requests.push(request);
            }
        }
        requests
    }

    /// Record that `host_id` reported at `at` (server receive time).
    pub fn record_seen(&self, host_id: &str, at: Timestamp) {
        self.last_seen
            .entry(host_id.to_string())
            .and_modify(|seen| {
                if at > *seen {
                    *seen = at;
                }
            })
            .or_insert(at);
    }

    pub fn last_seen(&self, host_id: &str) -> Option<Timestamp> {
        self.last_seen.get(host_id).map(|t| *t)
    }

    /// Periodic offline evaluation over every registered host.
    ///
    /// Hosts that never reported are skipped.
    pub fn sweep_offline(&self, ctx: &AlertContext<'_>, now: Timestamp) -> Vec<NotificationRequest> {
        let mut requests = Vec::new();
        for host in ctx.registry.iter() {
            if !host.data_monitoring_enabled {
                self.clear_host(&host.server_id);
                continue;
            }
            let Some(last_seen) = self.last_seen(&host.server_id) else {
                continue;
            };
            let Some(window) = self.offline_window(host.report_interval) else {
                tracing::debug!(
                    host_id = %host.server_id,
                    report_interval = host.report_interval,
                    "Offline window out of range, host never goes offline"
                );
                continue;
            };
            let observation = Observation {
                breached: now - last_seen > window,
                value: None,
                threshold: None,
                at: now,
            };
            if let Some(request) = self.observe(ctx, host, AlertType::Offline, observation) {
                requests.push(request);
            }
        }
        requests
    }

    /// How long a host with `report_interval` may stay silent.
    ///
    /// `None` when the window does not fit a [`Duration`].
    pub fn offline_window(&self, report_interval: u32) -> Option<Duration> {
        i64::from(report_interval)
            .checked_mul(i64::from(self.config.missed_cycles_threshold))
            .and_then(Duration::try_seconds)
    }

    /// Current state of one machine.
    pub fn state(&self, host_id: &str, alert_type: AlertType) -> BreachState {
        if self.breaches.contains_key(&(host_id.to_string(), alert_type)) {
            BreachState::Breached
        } else {
            BreachState::Normal
        }
    }

    /// All pairs currently breached, ordered by host then alert type.
    pub fn active_breaches(&self) -> Vec<ActiveBreach> {
        let mut active: Vec<ActiveBreach> = self
            .breaches
            .iter()
            .map(|e| {
                let (host_id, alert_type) = e.key();
                ActiveBreach {
                    host_id: host_id.clone(),
                    alert_type: *alert_type,
                    since: e.since,
                    value: e.value,
                    threshold: e.threshold,
                }
            })
            .collect();
        active.sort_by(|a, b| (&a.host_id, a.alert_type).cmp(&(&b.host_id, b.alert_type)));
        active
    }

    /// Reset every machine of a host to `NORMAL` without notifying.
    pub fn clear_host(&self, host_id: &str) {
        self.breaches.retain(|(host, _), _| host != host_id);
    }

    /// Drop all state for a deleted host.
    pub fn forget_host(&self, host_id: &str) {
        self.clear_host(host_id);
        self.last_seen.remove(host_id);
    }

    /// Union of matching rule emails and always-notify recipients.
    ///
    /// Returns the sorted addresses and the ids of the rules that matched.
    pub fn recipients_for(
        ctx: &AlertContext<'_>,
        host_id: &str,
        alert_type: AlertType,
    ) -> (Vec<String>, Vec<DbId>) {
        let mut emails = BTreeSet::new();
        let mut matched = Vec::new();

        for rule in ctx.rules.iter().filter(|r| r.alert_type == alert_type) {
            if rule_hosts(rule, ctx.registry).contains(host_id) {
                emails.extend(rule.emails.iter().cloned());
                matched.push(rule.id);
            }
        }
        emails.extend(
            ctx.recipients
                .iter()
                .filter(|r| r.category.covers(alert_type))
                .map(|r| r.email.clone()),
        );

        (emails.into_iter().collect(), matched)
    }

    /// Feed one observation into a machine and build the notification for
    /// the resulting transition, if any.
    fn observe(
        &self,
        ctx: &AlertContext<'_>,
        host: &Host,
        alert_type: AlertType,
        obs: Observation,
    ) -> Option<NotificationRequest> {
        let kind = self.transition(&host.server_id, alert_type, obs)?;

        match kind {
            NotificationKind::Breach => tracing::info!(
                host_id = %host.server_id,
                alert_type = %alert_type,
                value = ?obs.value,
                threshold = ?obs.threshold,
                "Breach detected"
            ),
            _ => tracing::info!(
                host_id = %host.server_id,
                alert_type = %alert_type,
                value = ?obs.value,
                "Breach recovered"
            ),
        }

        if kind == NotificationKind::Recovery && !self.config.notify_on_recovery {
            return None;
        }

        let (recipients, matched_rules) = Self::recipients_for(ctx, &host.server_id, alert_type);
        if recipients.is_empty() {
            tracing::debug!(
                host_id = %host.server_id,
                alert_type = %alert_type,
                "No recipients for transition, nothing to notify"
            );
            return None;
        }

        Some(NotificationRequest {
            id: Uuid::new_v4(),
            kind,
            host_id: host.server_id.clone(),
            group_name: host.group_name.clone(),
            alert_type: Some(alert_type),
            value: obs.value,
            threshold: obs.threshold,
            recipients,
            matched_rules,
            occurred_at: obs.at,
        })
    }

    /// Apply an observation atomically. Returns the transition taken.
    fn transition(
        &self,
        host_id: &str,
        alert_type: AlertType,
        obs: Observation,
    ) -> Option<NotificationKind> {
        match self.breaches.entry((host_id.to_string(), alert_type)) {
            Entry::Occupied(mut entry) => {
                if obs.breached {
                    let current = entry.get_mut();
                    current.value = obs.value;
                    current.threshold = obs.threshold;
                    None
                } else {
                    entry.remove();
                    Some(NotificationKind::Recovery)
                }
            }
            Entry::Vacant(entry) => {
                if obs.breached {
                    entry.insert(BreachEntry {
                        since: obs.at,
                        value: obs.value,
                        threshold: obs.threshold,
                    });
                    Some(NotificationKind::Breach)
                } else {
                    None
                }
            }
        }
    }
}
