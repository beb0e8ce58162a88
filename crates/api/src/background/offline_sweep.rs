//! Periodic offline detection.
//!
//! A host is offline once nothing has been received from it for
//! `report_interval * missed_cycles_threshold` seconds. Offline and
//! back-online transitions are only ever raised by this sweep.

use std::sync::Arc;
use std::time::Duration;

use chrono::Utc;
use hostwatch_core::monitor::Monitor;
use tokio_util::sync::CancellationToken;

/// Run the offline sweep loop until `cancel` is triggered.
pub async fn run(monitor: Arc<Monitor>, every: Duration, cancel: CancellationToken) {
    tracing::info!(
        interval_secs = every.as_secs(),
        missed_cycles = monitor.config().engine.missed_cycles_threshold,
        "Offline sweep started"
    );

    let mut interval = tokio::time::interval(every);

    loop {
        tokio::select! {
            _ = cancel.cancelled() => {
                tracing::info!("Offline sweep stopping");
                break;
            }
            _ = interval.tick() => {
                let submitted = monitor.sweep_offline(Utc::now()).await;
                if submitted > 0 {
                    tracing::info!(submitted, "Offline sweep: notifications submitted");
                } else {
                    tracing::debug!("Offline sweep: no transitions");
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use hostwatch_core::hosts::{Host, HostRegistry};
    use hostwatch_core::monitor::{MonitorConfig, MonitorState};
    use hostwatch_events::NotificationBus;

    #[tokio::test]
    async fn stops_when_cancelled() {
        let sink = Arc::new(NotificationBus::default());
        let state = MonitorState {
            registry: HostRegistry::from_hosts([Host::new("web-1")]),
            ..MonitorState::default()
        };
        let monitor = Arc::new(Monitor::new(MonitorConfig::default(), state, sink));
        let cancel = CancellationToken::new();

        let handle = tokio::spawn(run(monitor, Duration::from_millis(10), cancel.clone()));
        cancel.cancel();

        tokio::time::timeout(Duration::from_secs(1), handle)
            .await
            .expect("sweep should stop after cancel")
            .expect("sweep task panicked");
    }
}
