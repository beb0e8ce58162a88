use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use tokio_util::sync::CancellationToken;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use hostwatch_api::background;
use hostwatch_api::config::ServerConfig;
use hostwatch_api::router::build_app_router;
use hostwatch_api::state::AppState;
use hostwatch_core::monitor::Monitor;
use hostwatch_core::notification::NotificationSink;
use hostwatch_events::{
    DeliveryChannel, EmailConfig, EmailDelivery, LogDelivery, NotificationBus,
    NotificationDispatcher, RetryPolicy,
};

#[tokio::main]
async fn main() {
    dotenvy::dotenv().ok();

    // --- Tracing ---
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| {
                    "hostwatch_api=debug,hostwatch_core=info,hostwatch_events=info,tower_http=debug"
                        .into()
                }),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    // --- Configuration ---
    let config = ServerConfig::from_env();
    tracing::info!(host = %config.host, port = %config.port, "Loaded server configuration");

    // --- Database ---
    let database_url = std::env::var("DATABASE_URL").expect("DATABASE_URL must be set");

    let pool = hostwatch_db::create_pool(&database_url)
        .await
        .expect("Failed to connect to database");
    tracing::info!("Database connection pool created");

    hostwatch_db::health_check(&pool)
        .await
        .expect("Database health check failed");
    tracing::info!("Database health check passed");

    hostwatch_db::run_migrations(&pool)
        .await
        .expect("Failed to run database migrations");
    tracing::info!("Database migrations applied");

    let snapshot = hostwatch_db::snapshot::load_monitor_state(&pool)
        .await
        .expect("Failed to load monitoring state");
    tracing::info!(
        hosts = snapshot.registry.len(),
        rules = snapshot.rules.len(),
        recipients = snapshot.recipients.len(),
        "Monitoring state loaded"
    );

    // --- Notification bus and dispatcher ---
    let bus = Arc::new(NotificationBus::default());

    let channel: Arc<dyn DeliveryChannel> = match EmailConfig::from_env() {
        Some(email) => Arc::new(
            EmailDelivery::new(email).expect("Failed to configure SMTP transport"),
        ),
        None => {
            tracing::warn!("SMTP_HOST not set, notifications will only be logged");
            Arc::new(LogDelivery::default())
        }
    };
    let dispatcher = NotificationDispatcher::new(
        channel,
        RetryPolicy::new(config.monitor.delivery_max_attempts),
    );
    let dispatcher_cancel = CancellationToken::new();
    let dispatcher_handle = tokio::spawn(dispatcher.run(bus.subscribe(), dispatcher_cancel.clone()));

    // --- Monitor ---
    let monitor_config = config.monitor.monitor_config();
    let runtime = hostwatch_db::snapshot::load_runtime_snapshot(
        &pool,
        monitor_config.history_capacity.get(),
    )
    .await
    .expect("Failed to load persisted samples");

    let monitor = Arc::new(Monitor::new(
        monitor_config,
        snapshot,
        Arc::clone(&bus) as Arc<dyn NotificationSink>,
    ));
    monitor.restore(runtime).await;

    // Spawn the offline sweep.
    let sweep_cancel = CancellationToken::new();
    let sweep_handle = tokio::spawn(background::offline_sweep::run(
        Arc::clone(&monitor),
        config.monitor.offline_sweep_interval(),
        sweep_cancel.clone(),
    ));

    // Spawn sample pruning.
    let retention_cancel = CancellationToken::new();
    let retention_handle = tokio::spawn(background::sample_retention::run(
        pool.clone(),
        config.monitor.history_capacity,
        background::sample_retention::PRUNE_INTERVAL,
        retention_cancel.clone(),
    ));

    tracing::info!("Background services started (dispatcher, offline sweep, sample retention)");

    // --- App state ---
    let state = AppState {
        pool,
        config: Arc::new(config.clone()),
        monitor,
    };

    let app = build_app_router(state, &config);

    // --- Start server ---
    let addr = SocketAddr::new(
        config.host.parse().expect("Invalid HOST address"),
        config.port,
    );
    tracing::info!(%addr, "Starting server");

    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .expect("Failed to bind to address");

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .expect("Server error");

    // --- Post-shutdown cleanup ---
    tracing::info!("Server stopped accepting connections, cleaning up");

    sweep_cancel.cancel();
    let _ = tokio::time::timeout(Duration::from_secs(5), sweep_handle).await;
    tracing::info!("Offline sweep stopped");

    retention_cancel.cancel();
    let _ = tokio::time::timeout(Duration::from_secs(5), retention_handle).await;
    tracing::info!("Sample retention stopped");

    // In-flight deliveries get the same grace period.
    dispatcher_cancel.cancel();
    let _ = tokio::time::timeout(Duration::from_secs(5), dispatcher_handle).await;
    tracing::info!("Notification dispatcher stopped");

    tracing::info!("Graceful shutdown complete");
}

/// Wait for a termination signal to initiate graceful shutdown.
///
/// Handles both SIGINT (Ctrl-C) and SIGTERM (on Unix).
async fn shutdown_signal() {
    let ctrl_c = async {
        tokio::signal::ctrl_c()
            .await
            .expect("Failed to install Ctrl-C handler");
    };

    #[cfg(unix)]
    let terminate = async {
        tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate())
            .expect("Failed to install SIGTERM handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        () = ctrl_c => {
            tracing::info!("Received SIGINT (Ctrl-C), starting graceful shutdown");
        }
        () = terminate => {
            tracing::info!("Received SIGTERM, starting graceful shutdown");
        }
    }
}
