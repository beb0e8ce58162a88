//! Repository tests against a real database.
//!
//! Ignored by default; run with `DATABASE_URL` set and `cargo test -- --ignored`.

use hostwatch_core::alert::{AlertType, NewAlertRule, NewRecipient, RecipientCategory, Scope};
use chrono::{Duration, Utc};
use hostwatch_core::hosts::Host;
use hostwatch_core::metrics::{CpuStats, DiskStats, DockerStats, MemoryStats, MetricSample, ResourceUsage};
use hostwatch_core::thresholds::{GlobalAlertConfig, ThresholdOverride};
use hostwatch_db::models::host::UpdateHost;
use hostwatch_db::repositories::{
    AlertConfigRepo, AlertRuleRepo, HostRepo, RecipientRepo, SampleRepo, ThresholdRepo,
};
use hostwatch_db::snapshot::{load_monitor_state, load_runtime_snapshot};
use sqlx::PgPool;

fn sample(server_id: &str, cpu: f64) -> MetricSample {
    MetricSample {
        host_id: server_id.to_string(),
        timestamp: Utc::now(),
        usage: ResourceUsage {
            cpu: CpuStats {
                total: cpu,
                per_core: vec![cpu],
            },
            memory: MemoryStats {
                total: 1000.0,
                used: 100.0,
                free: 900.0,
                cache: 0.0,
            },
            disk: DiskStats {
                total: 100.0,
                used: 10.0,
                free: 90.0,
                percent: 10.0,
            },
            docker: DockerStats {
                running_containers: 1,
                containers: Vec::new(),
            },
        },
    }
}

fn cpu_override(value: f64) -> ThresholdOverride {
    ThresholdOverride {
        cpu_threshold: Some(value),
        ..Default::default()
    }
}

#[sqlx::test]
#[ignore = "requires DATABASE_URL"]
async fn migrations_seed_default_alert_config(pool: PgPool) {
    hostwatch_db::health_check(&pool).await.unwrap();
    let row = AlertConfigRepo::get(&pool).await.unwrap().unwrap();
    assert_eq!(row.to_config(), GlobalAlertConfig::default());
}

#[sqlx::test]
#[ignore = "requires DATABASE_URL"]
async fn host_upsert_update_and_delete(pool: PgPool) {
    let row = HostRepo::upsert(&pool, &Host::new("srv1").with_group("web"))
        .await
        .unwrap();
    assert_eq!(row.report_interval, 2400);

    let updated = HostRepo::update(
        &pool,
        "srv1",
        &UpdateHost {
            group_name: Some(None),
            report_interval: Some(60),
            ..Default::default()
        },
    )
    .await
    .unwrap()
    .unwrap();
    assert_eq!(updated.group_name, None);
    assert_eq!(updated.report_interval, 60);
    assert!(updated.data_monitoring_enabled);

    assert!(HostRepo::update(&pool, "ghost", &UpdateHost::default())
        .await
        .unwrap()
        .is_none());

    ThresholdRepo::upsert(&pool, "srv1", &cpu_override(50.0))
        .await
        .unwrap();
    assert!(HostRepo::delete(&pool, "srv1").await.unwrap());
    // The override row cascades with its host.
    assert!(ThresholdRepo::find(&pool, "srv1").await.unwrap().is_none());
}

#[sqlx::test]
#[ignore = "requires DATABASE_URL"]
async fn threshold_upsert_keeps_one_row_per_host(pool: PgPool) {
    HostRepo::upsert(&pool, &Host::new("srv1")).await.unwrap();
    ThresholdRepo::upsert(&pool, "srv1", &cpu_override(50.0))
        .await
        .unwrap();
    let row = ThresholdRepo::upsert(&pool, "srv1", &cpu_override(70.0))
        .await
        .unwrap();

    assert_eq!(row.cpu_threshold, Some(70.0));
    assert_eq!(ThresholdRepo::list(&pool).await.unwrap().len(), 1);
}

#[sqlx::test]
#[ignore = "requires DATABASE_URL"]
async fn upsert_many_is_all_or_nothing(pool: PgPool) {
    HostRepo::upsert(&pool, &Host::new("srv1")).await.unwrap();

    // The second row violates the foreign key, so the first is rolled back.
    let rows = vec![
        ("srv1".to_string(), cpu_override(40.0)),
        ("ghost".to_string(), cpu_override(40.0)),
    ];
    assert!(ThresholdRepo::upsert_many(&pool, &rows).await.is_err());
    assert!(ThresholdRepo::list(&pool).await.unwrap().is_empty());

    let written = ThresholdRepo::upsert_many(&pool, &rows[..1]).await.unwrap();
    assert_eq!(written, 1);
}

#[sqlx::test]
#[ignore = "requires DATABASE_URL"]
async fn upsert_many_removes_rows_for_empty_overrides(pool: PgPool) {
    HostRepo::upsert(&pool, &Host::new("srv1")).await.unwrap();
    HostRepo::upsert(&pool, &Host::new("srv2")).await.unwrap();
    ThresholdRepo::upsert(&pool, "srv1", &cpu_override(50.0))
        .await
        .unwrap();

    let rows = vec![
        ("srv1".to_string(), ThresholdOverride::default()),
        ("srv2".to_string(), cpu_override(60.0)),
    ];
    assert_eq!(ThresholdRepo::upsert_many(&pool, &rows).await.unwrap(), 2);

    assert!(ThresholdRepo::find(&pool, "srv1").await.unwrap().is_none());
    let stored = ThresholdRepo::list(&pool).await.unwrap();
    assert_eq!(stored.len(), 1);
    assert_eq!(stored[0].server_id, "srv2");

    let state = load_monitor_state(&pool).await.unwrap();
    assert!(state.resolver.override_for("srv1").is_none());
}

#[sqlx::test]
#[ignore = "requires DATABASE_URL"]
async fn duplicate_recipient_email_violates_unique_constraint(pool: PgPool) {
    let input = NewRecipient {
        email: "ops@x.io".into(),
        name: None,
        category: RecipientCategory::All,
    };
    RecipientRepo::create(&pool, &input).await.unwrap();
    let err = RecipientRepo::create(&pool, &input).await.unwrap_err();
    let db_err = err.as_database_error().unwrap();
    assert_eq!(db_err.code().as_deref(), Some("23505"));
    assert_eq!(db_err.constraint(), Some("uq_recipients_email"));
}

#[sqlx::test]
#[ignore = "requires DATABASE_URL"]
async fn snapshot_loads_every_entity(pool: PgPool) {
    HostRepo::upsert(&pool, &Host::new("srv1").with_group("web"))
        .await
        .unwrap();
    ThresholdRepo::upsert(&pool, "srv1", &cpu_override(80.0))
        .await
        .unwrap();
    AlertRuleRepo::create(
        &pool,
        &NewAlertRule {
            alert_type: AlertType::Disk,
            scope: Scope::Group,
            target_id: Some("web".into()),
            emails: vec!["a@x.io".into(), "b@x.io".into()],
        },
    )
    .await
    .unwrap();

    let state = load_monitor_state(&pool).await.unwrap();
    assert_eq!(state.registry.len(), 1);
    assert_eq!(
        state.resolver.override_for("srv1").unwrap().cpu_threshold,
        Some(80.0)
    );
    assert_eq!(state.rules.len(), 1);
    assert_eq!(state.rules[0].emails, vec!["a@x.io", "b@x.io"]);
    assert!(state.recipients.is_empty());
}

#[sqlx::test]
#[ignore = "requires DATABASE_URL"]
async fn recorded_samples_survive_as_runtime_snapshot(pool: PgPool) {
    HostRepo::upsert(&pool, &Host::new("srv1")).await.unwrap();
    HostRepo::upsert(&pool, &Host::new("srv2")).await.unwrap();

    let t0 = Utc::now();
    for (i, cpu) in [10.0, 20.0, 30.0].into_iter().enumerate() {
        let at = t0 + Duration::seconds(i as i64);
        SampleRepo::record(&pool, &sample("srv1", cpu), at)
            .await
            .unwrap();
    }
    // A late write does not move last_seen_at backwards.
    SampleRepo::record(&pool, &sample("srv1", 5.0), t0 - Duration::seconds(60))
        .await
        .unwrap();

    let row = HostRepo::find_by_id(&pool, "srv1").await.unwrap().unwrap();
    let last_seen = row.last_seen_at.unwrap();
    assert!((last_seen - (t0 + Duration::seconds(2))).num_milliseconds().abs() < 1);

    let snapshot = load_runtime_snapshot(&pool, 2).await.unwrap();
    assert_eq!(snapshot.last_seen.len(), 1);
    assert_eq!(snapshot.last_seen[0].0, "srv1");
    let cpus: Vec<f64> = snapshot.history.iter().map(|s| s.usage.cpu.total).collect();
    assert_eq!(cpus, vec![20.0, 30.0]);
}

#[sqlx::test]
#[ignore = "requires DATABASE_URL"]
async fn prune_keeps_newest_samples_per_host(pool: PgPool) {
    HostRepo::upsert(&pool, &Host::new("srv1")).await.unwrap();
    HostRepo::upsert(&pool, &Host::new("srv2")).await.unwrap();
    let t0 = Utc::now();
    for i in 0..4 {
        let at = t0 + Duration::seconds(i);
        SampleRepo::record(&pool, &sample("srv1", i as f64), at)
            .await
            .unwrap();
    }
    SampleRepo::record(&pool, &sample("srv2", 1.0), t0)
        .await
        .unwrap();

    assert_eq!(SampleRepo::prune_per_host(&pool, 2).await.unwrap(), 2);
    let rows = SampleRepo::recent_per_host(&pool, 10).await.unwrap();
    let srv1: Vec<f64> = rows
        .iter()
        .filter(|r| r.server_id == "srv1")
        .map(|r| r.usage.cpu.total)
        .collect();
    assert_eq!(srv1, vec![2.0, 3.0]);
    assert_eq!(rows.iter().filter(|r| r.server_id == "srv2").count(), 1);

    // Samples go with their host.
    assert!(HostRepo::delete(&pool, "srv1").await.unwrap());
    assert_eq!(SampleRepo::recent_per_host(&pool, 10).await.unwrap().len(), 1);
}
