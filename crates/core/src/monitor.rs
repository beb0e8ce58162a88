//! The in-memory monitoring aggregate.
//!
//! [`Monitor`] owns the sample history, the rule engine and a snapshot of the
//! persisted configuration (hosts, thresholds, rules, recipients). Callers
//! persist configuration changes first and then mirror them here. Every
//! operation takes the host id explicitly.

use std::collections::BTreeMap;
use std::num::NonZeroUsize;
use std::sync::Arc;

use serde::Serialize;
use tokio::sync::RwLock;

use crate::alert::{AlertRule, NewAlertRule, Recipient};
use crate::engine::{ActiveBreach, AlertContext, AlertRuleEngine, EngineConfig};
use crate::error::CoreError;
use crate::groups::BulkGroupRequest;
use crate::hosts::{Host, HostRegistry, DEFAULT_REPORT_INTERVAL_SECS};
use crate::metrics::{MetricReport, MetricSample};
use crate::metrics_store::{MetricsStore, DEFAULT_HISTORY_CAPACITY};
use crate::notification::{NotificationRequest, NotificationSink};
use crate::threshold_transfer::{ImportPlan, RawThresholdDocument, ThresholdDocument};
use crate::thresholds::{GlobalAlertConfig, ThresholdOverride, ThresholdResolver};
use crate::types::{DbId, Timestamp};
use crate::validation::normalize_email;

/// Tunables for the aggregate.
#[derive(Debug, Clone, Copy)]
pub struct MonitorConfig {
    pub history_capacity: NonZeroUsize,
    pub engine: EngineConfig,
    /// Interval given to hosts registered without one.
    pub default_report_interval: u32,
}

impl Default for MonitorConfig {
    fn default() -> Self {
        Self {
            history_capacity: NonZeroUsize::new(DEFAULT_HISTORY_CAPACITY)
                .unwrap_or(NonZeroUsize::MIN),
            engine: EngineConfig::default(),
            default_report_interval: DEFAULT_REPORT_INTERVAL_SECS,
        }
    }
}

/// Persisted configuration mirrored in memory.
#[derive(Debug, Clone, Default)]
pub struct MonitorState {
    pub registry: HostRegistry,
    pub resolver: ThresholdResolver,
    pub rules: Vec<AlertRule>,
    pub recipients: Vec<Recipient>,
}

impl MonitorState {
    fn context(&self) -> AlertContext<'_> {
        AlertContext {
            registry: &self.registry,
            resolver: &self.resolver,
            rules: &self.rules,
            recipients: &self.recipients,
        }
    }

    fn require_host(&self, server_id: &str) -> Result<&Host, CoreError> {
        self.registry
            .get(server_id)
            .ok_or_else(|| CoreError::not_found("host", server_id))
    }
}

/// Successful ingest response.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct IngestAck {
    pub status: &'static str,
    pub server_id: String,
    /// The host's configured interval, for the reporter to adopt.
    pub report_interval: u32,
}

/// What one accepted report produced.
#[derive(Debug, Clone, PartialEq)]
pub struct Ingested {
    pub ack: IngestAck,
    /// The sample as stored, for callers that persist it.
    pub sample: MetricSample,
}

/// Runtime state persisted outside the configuration tables, replayed into a
/// fresh [`Monitor`] at startup.
#[derive(Debug, Clone, Default)]
pub struct RuntimeSnapshot {
    /// Last receive time per host.
    pub last_seen: Vec<(String, Timestamp)>,
    /// Recent samples, oldest first within each host.
    pub history: Vec<MetricSample>,
}

/// A host together with its liveness.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct HostStatus {
    #[serde(flatten)]
    pub host: Host,
    pub last_seen: Option<Timestamp>,
}

pub struct Monitor {
    config: MonitorConfig,
    store: MetricsStore,
    engine: AlertRuleEngine,
    state: RwLock<MonitorState>,
    sink: Arc<dyn NotificationSink>,
}

impl Monitor {
    pub fn new(config: MonitorConfig, state: MonitorState, sink: Arc<dyn NotificationSink>) -> Self {
        Self {
            config,
            store: MetricsStore::new(config.history_capacity),
            engine: AlertRuleEngine::new(config.engine),
            state: RwLock::new(state),
            sink,
        }
    }

    pub fn config(&self) -> &MonitorConfig {
        &self.config
    }

    pub fn history_capacity(&self) -> usize {
        self.store.capacity()
    }

    // -- ingest / query ---------------------------------------------------

    /// Validate, store and evaluate one report.
    ///
    /// Storing and evaluating a sample happen while the host's history entry
    /// is held, so concurrent reports for one host are evaluated in the order
    /// they were stored. Notifications are submitted after every lock is
    /// released.
    pub async fn ingest(&self, report: MetricReport, received_at: Timestamp) -> Result<Ingested, CoreError> {
        let sample = report.into_sample(received_at)?;

        let (ack, requests) = {
            let state = self.state.read().await;
            let host = state.require_host(&sample.host_id)?;
            let ctx = state.context();

            let requests = self.store.append_then(sample.clone(), |stored, evicted| {
                self.engine.record_seen(&host.server_id, received_at);
                tracing::debug!(host_id = %host.server_id, evicted, "Sample stored");
                self.engine.evaluate_sample(&ctx, host, stored)
            });
            let ack = IngestAck {
                status: "ok",
                server_id: host.server_id.clone(),
                report_interval: host.report_interval,
            };
            (ack, requests)
        };

        self.submit_all(requests);
        Ok(Ingested { ack, sample })
    }

    /// Replay persisted liveness and history.
    ///
    /// Entries for hosts that are no longer registered are ignored. Breach
    /// state is not replayed; it is rebuilt by the next samples and sweeps.
    pub async fn restore(&self, snapshot: RuntimeSnapshot) {
        let state = self.state.read().await;

        let mut seen = 0;
        for (server_id, at) in snapshot.last_seen {
            if state.registry.contains(&server_id) {
                self.engine.record_seen(&server_id, at);
                seen += 1;
            }
        }

        let mut by_host: BTreeMap<String, Vec<MetricSample>> = BTreeMap::new();
        for sample in snapshot.history {
            if state.registry.contains(&sample.host_id) {
                by_host.entry(sample.host_id.clone()).or_default().push(sample);
            }
        }
        let samples: usize = by_host.values().map(Vec::len).sum();
        for (server_id, series) in by_host {
            self.store.restore(&server_id, series);
        }

        tracing::info!(hosts_seen = seen, samples, "Runtime state restored");
    }

    /// The most recent `limit` samples of a known host, oldest first.
    pub async fn history(&self, server_id: &str, limit: usize) -> Result<Vec<MetricSample>, CoreError> {
        self.state.read().await.require_host(server_id)?;
        Ok(self.store.query(server_id, limit.min(self.store.capacity())))
    }

    /// Run one offline sweep. Returns how many requests were submitted.
    pub async fn sweep_offline(&self, now: Timestamp) -> usize {
        let requests = {
            let state = self.state.read().await;
            self.engine.sweep_offline(&state.context(), now)
        };
        let count = requests.len();
        self.submit_all(requests);
        count
    }

    pub fn active_breaches(&self) -> Vec<ActiveBreach> {
        self.engine.active_breaches()
    }

    /// Diagnostics: hand a test request straight to the sink.
    ///
    /// Touches neither rules nor breach state.
    pub fn send_test(&self, email: &str, now: Timestamp) -> Result<NotificationRequest, CoreError> {
        let request = NotificationRequest::test(normalize_email(email)?, now);
        self.sink.submit(request.clone());
        Ok(request)
    }

    fn submit_all(&self, requests: Vec<NotificationRequest>) {
        for request in requests {
            self.sink.submit(request);
        }
    }

    // -- hosts ------------------------------------------------------------

    pub async fn hosts(&self) -> Vec<HostStatus> {
        let state = self.state.read().await;
        state
            .registry
            .iter()
            .map(|h| HostStatus {
                host: h.clone(),
                last_seen: self.engine.last_seen(&h.server_id),
            })
            .collect()
    }

    pub async fn host(&self, server_id: &str) -> Result<Host, CoreError> {
        self.state.read().await.require_host(server_id).cloned()
    }

    pub async fn upsert_host(&self, host: Host) {
        let clear = !host.data_monitoring_enabled;
        let server_id = host.server_id.clone();
        self.state.write().await.registry.upsert(host);
        if clear {
            self.engine.clear_host(&server_id);
        }
    }

    /// Forget a host entirely. Rules targeting it become inert.
    pub async fn remove_host(&self, server_id: &str) -> Option<Host> {
        let removed = {
            let mut state = self.state.write().await;
            state.resolver.remove_override(server_id);
            state.registry.remove(server_id)
        };
        self.store.remove_host(server_id);
        self.engine.forget_host(server_id);
        removed
    }

    pub async fn set_group(&self, server_id: &str, group: Option<String>) -> Result<Host, CoreError> {
        let mut state = self.state.write().await;
        state.registry.set_group(server_id, group).cloned()
    }

    pub async fn bulk_targets(&self, request: &BulkGroupRequest) -> Result<Vec<String>, CoreError> {
        request.targets(&self.state.read().await.registry)
    }

    // -- thresholds -------------------------------------------------------

    pub async fn threshold(&self, server_id: &str) -> Result<Option<ThresholdOverride>, CoreError> {
        let state = self.state.read().await;
        state.require_host(server_id)?;
        Ok(state.resolver.override_for(server_id).copied())
    }

    pub async fn set_threshold(&self, server_id: &str, value: ThresholdOverride) -> Result<(), CoreError> {
        let mut state = self.state.write().await;
        state.require_host(server_id)?;
        state.resolver.set_override(server_id, value)?;
        Ok(())
    }

    pub async fn clear_threshold(&self, server_id: &str) -> Option<ThresholdOverride> {
        self.state.write().await.resolver.remove_override(server_id)
    }

    pub async fn export_thresholds(&self) -> ThresholdDocument {
        self.state.read().await.resolver.export()
    }

    pub async fn plan_import(&self, doc: RawThresholdDocument) -> ImportPlan {
        ImportPlan::validate(doc, &self.state.read().await.registry)
    }

    /// Mirror rows that were already persisted.
    pub async fn apply_thresholds(&self, rows: &[(String, ThresholdOverride)]) -> Result<(), CoreError> {
        let mut state = self.state.write().await;
        for (server_id, value) in rows {
            state.resolver.set_override(server_id, *value)?;
        }
        Ok(())
    }

    pub async fn global_config(&self) -> GlobalAlertConfig {
        *self.state.read().await.resolver.global()
    }

    pub async fn set_global_config(&self, config: GlobalAlertConfig) -> Result<(), CoreError> {
        self.state.write().await.resolver.set_global(config)
    }

    // -- rules / recipients ------------------------------------------------

    /// Validate a rule against the current host registry.
    pub async fn validate_rule(&self, rule: NewAlertRule) -> Result<NewAlertRule, CoreError> {
        rule.validate(&self.state.read().await.registry)
    }

    pub async fn rules(&self) -> Vec<AlertRule> {
        self.state.read().await.rules.clone()
    }

    pub async fn add_rule(&self, rule: AlertRule) {
        self.state.write().await.rules.push(rule);
    }

    pub async fn remove_rule(&self, id: DbId) -> bool {
        let mut state = self.state.write().await;
        let before = state.rules.len();
        state.rules.retain(|r| r.id != id);
        state.rules.len() != before
    }

    pub async fn recipients(&self) -> Vec<Recipient> {
        self.state.read().await.recipients.clone()
    }

    pub async fn add_recipient(&self, recipient: Recipient) {
        self.state.write().await.recipients.push(recipient);
    }

    pub async fn remove_recipient(&self, id: DbId) -> bool {
        let mut state = self.state.write().await;
        let before = state.recipients.len();
        state.recipients.retain(|r| r.id != id);
        state.recipients.len() != before
    }
}
