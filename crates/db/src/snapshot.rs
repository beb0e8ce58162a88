//! Load persisted state as in-memory snapshots: the configuration mirrored by
//! the monitor, and the liveness and history replayed into it at startup.

use hostwatch_core::alert::{AlertRule, Recipient};
use hostwatch_core::hosts::HostRegistry;
use hostwatch_core::monitor::{MonitorState, RuntimeSnapshot};
use hostwatch_core::thresholds::{GlobalAlertConfig, ThresholdResolver};
use sqlx::PgPool;

use crate::repositories::{
    AlertConfigRepo, AlertRuleRepo, HostRepo, RecipientRepo, SampleRepo, ThresholdRepo,
};

/// Read hosts, thresholds, the global config, rules and recipients.
///
/// A missing config row falls back to the 90% defaults. Rows whose enum
/// columns fail to parse are logged and skipped.
pub async fn load_monitor_state(pool: &PgPool) -> Result<MonitorState, sqlx::Error> {
    let registry = HostRegistry::from_hosts(
        HostRepo::list(pool)
            .await?
            .into_iter()
            .map(|row| row.into_host()),
    );

    let global = match AlertConfigRepo::get(pool).await? {
        Some(row) => row.to_config(),
        None => {
            tracing::warn!("No alert_config row found, using default thresholds");
            GlobalAlertConfig::default()
        }
    };
    let overrides = ThresholdRepo::list(pool)
        .await?
        .into_iter()
        .map(|row| (row.server_id.clone(), row.to_override()));
    let resolver = ThresholdResolver::from_parts(global, overrides);

    let rules = AlertRuleRepo::list(pool)
        .await?
        .into_iter()
        .filter_map(|row| {
            let id = row.id;
            AlertRule::try_from(row)
                .map_err(|e| tracing::error!(rule_id = id, error = %e, "Skipping unreadable alert rule"))
                .ok()
        })
        .collect();

    let recipients = RecipientRepo::list(pool)
        .await?
        .into_iter()
        .filter_map(|row| {
            let id = row.id;
            Recipient::try_from(row)
                .map_err(|e| tracing::error!(recipient_id = id, error = %e, "Skipping unreadable recipient"))
                .ok()
        })
        .collect();

    Ok(MonitorState {
        registry,
        resolver,
        rules,
        recipients,
    })
}

/// Read each host's last receive time and its newest `per_host` samples.
pub async fn load_runtime_snapshot(pool: &PgPool, per_host: usize) -> Result<RuntimeSnapshot, sqlx::Error> {
    let last_seen = HostRepo::list_last_seen(pool).await?;
    let history = SampleRepo::recent_per_host(pool, i64::try_from(per_host).unwrap_or(i64::MAX))
        .await?
        .into_iter()
        .map(|row| row.into_sample())
        .collect();
    Ok(RuntimeSnapshot { last_seen, history })
}
