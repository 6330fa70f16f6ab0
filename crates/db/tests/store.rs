//! Integration tests for the PostgreSQL metric store.
//!
//! Exercises the repositories and `PgMetricStore` against a real database:
//! - Batch append and ordered range queries
//! - Closed-range boundaries
//! - Rejection of malformed stored payloads
//! - Retention purge with separate cutoffs

use chrono::{DateTime, Duration, TimeZone, Utc};
use sentinel_core::alert::{AlertEvent, SeverityLevel};
use sentinel_core::metrics::{EntityReading, TimeRange};
use sentinel_core::store::{MetricStore, PurgeCounts, RetentionCutoffs};
use sentinel_db::repositories::{AlertRepo, GpuReadingRepo};
use sentinel_db::PgMetricStore;
use sqlx::PgPool;

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

/// Whole seconds, so values survive the microsecond precision of TIMESTAMPTZ.
fn t0() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2024, 6, 1, 12, 0, 0).unwrap()
}

fn alert(entity_id: i64, ts: DateTime<Utc>) -> AlertEvent {
    AlertEvent {
        entity_id,
        metric_name: "temperature".to_string(),
        value: 92.0,
        threshold_crossed: 90.0,
        severity: SeverityLevel::new(2, "critical"),
        timestamp: ts,
    }
}

fn range(start: DateTime<Utc>, end: DateTime<Utc>) -> TimeRange {
    TimeRange::new(start, end).unwrap()
}

// ---------------------------------------------------------------------------
// Migrations
// ---------------------------------------------------------------------------

#[sqlx::test(migrations = "./migrations")]
async fn test_migrations_and_health(pool: PgPool) {
    sentinel_db::health_check(&pool).await.unwrap();

    for table in ["gpu_readings", "alert_history"] {
        let count: (i64,) = sqlx::query_as(&format!("SELECT COUNT(*) FROM {table}"))
            .fetch_one(&pool)
            .await
            .unwrap_or_else(|e| panic!("{table} query failed: {e}"));
        assert_eq!(count.0, 0, "{table} should start empty");
    }
}

// ---------------------------------------------------------------------------
// Readings
// ---------------------------------------------------------------------------

#[sqlx::test(migrations = "./migrations")]
async fn test_samples_come_back_oldest_first(pool: PgPool) {
    let store = PgMetricStore::new(pool);
    let t0 = t0();

    store
        .append_readings(&[
            EntityReading::new(1, t0).with("temperature", 70.0),
            EntityReading::new(0, t0)
                .with("utilization", 50.0)
                .with("temperature", 65.0),
            EntityReading::new(0, t0 - Duration::seconds(5)).with("temperature", 60.0),
        ])
        .await
        .unwrap();

    let samples = store
        .query_samples(range(t0 - Duration::hours(1), t0))
        .await
        .unwrap();
    let order: Vec<(i64, &str, f64)> = samples
        .iter()
        .map(|s| (s.entity_id, s.metric_name.as_str(), s.value))
        .collect();
    assert_eq!(
        order,
        [
            (0, "temperature", 60.0),
            (0, "temperature", 65.0),
            (0, "utilization", 50.0),
            (1, "temperature", 70.0),
        ]
    );
    assert_eq!(samples[0].timestamp, t0 - Duration::seconds(5));
}

#[sqlx::test(migrations = "./migrations")]
async fn test_reading_range_is_closed(pool: PgPool) {
    let store = PgMetricStore::new(pool);
    let t0 = t0();
    let readings: Vec<EntityReading> = (-1..=2)
        .map(|h| EntityReading::new(0, t0 + Duration::hours(h)).with("temperature", h as f64))
        .collect();
    store.append_readings(&readings).await.unwrap();

    let samples = store
        .query_samples(range(t0, t0 + Duration::hours(1)))
        .await
        .unwrap();
    let values: Vec<f64> = samples.iter().map(|s| s.value).collect();
    assert_eq!(values, [0.0, 1.0]);
}

#[sqlx::test(migrations = "./migrations")]
async fn test_malformed_payload_is_skipped(pool: PgPool) {
    let t0 = t0();
    sqlx::query(
        "INSERT INTO gpu_readings (entity_id, readings, recorded_at) \
         VALUES ($1, '{\"temperature\": \"hot\"}'::jsonb, $2)",
    )
    .bind(0i64)
    .bind(t0)
    .execute(&pool)
    .await
    .unwrap();

    let store = PgMetricStore::new(pool);
    store
        .append_readings(&[EntityReading::new(1, t0).with("temperature", 71.0)])
        .await
        .unwrap();

    let samples = store
        .query_samples(range(t0 - Duration::minutes(1), t0))
        .await
        .unwrap();
    assert_eq!(samples.len(), 1);
    assert_eq!(samples[0].entity_id, 1);
}

#[sqlx::test(migrations = "./migrations")]
async fn test_empty_batches_are_noops(pool: PgPool) {
    GpuReadingRepo::insert_batch(&pool, &[]).await.unwrap();
    AlertRepo::insert_batch(&pool, &[]).await.unwrap();

    let rows = GpuReadingRepo::list_between(&pool, t0() - Duration::days(1), t0())
        .await
        .unwrap();
    assert!(rows.is_empty());
}

// ---------------------------------------------------------------------------
// Alerts
// ---------------------------------------------------------------------------

#[sqlx::test(migrations = "./migrations")]
async fn test_alerts_come_back_newest_first(pool: PgPool) {
    let store = PgMetricStore::new(pool);
    let t0 = t0();

    store
        .append_alerts(&[
            alert(0, t0 - Duration::minutes(10)),
            alert(1, t0),
            alert(2, t0 - Duration::minutes(5)),
        ])
        .await
        .unwrap();

    let alerts = store
        .query_alerts(range(t0 - Duration::minutes(10), t0))
        .await
        .unwrap();
    let entities: Vec<i64> = alerts.iter().map(|a| a.entity_id).collect();
    assert_eq!(entities, [1, 2, 0]);
    assert_eq!(alerts[0], alert(1, t0));
}

#[sqlx::test(migrations = "./migrations")]
async fn test_alert_range_excludes_outside_rows(pool: PgPool) {
    let store = PgMetricStore::new(pool);
    let t0 = t0();
    store
        .append_alerts(&[
            alert(0, t0 - Duration::seconds(1)),
            alert(1, t0),
            alert(2, t0 + Duration::seconds(1)),
        ])
        .await
        .unwrap();

    let alerts = store.query_alerts(range(t0, t0)).await.unwrap();
    assert_eq!(alerts.len(), 1);
    assert_eq!(alerts[0].entity_id, 1);
}

// ---------------------------------------------------------------------------
// Retention
// ---------------------------------------------------------------------------

#[sqlx::test(migrations = "./migrations")]
async fn test_purge_uses_separate_cutoffs(pool: PgPool) {
    let store = PgMetricStore::new(pool.clone());
    let now = t0();
    let old = now - Duration::days(45);

    store
        .append_readings(&[
            EntityReading::new(0, old).with("temperature", 50.0),
            EntityReading::new(0, now).with("temperature", 55.0),
        ])
        .await
        .unwrap();
    store
        .append_alerts(&[alert(0, old), alert(0, now - Duration::days(100))])
        .await
        .unwrap();

    let counts = store
        .purge_before(RetentionCutoffs {
            readings: now - Duration::days(30),
            alerts: now - Duration::days(90),
        })
        .await
        .unwrap();
    assert_eq!(counts, PurgeCounts { readings: 1, alerts: 1 });

    let remaining = AlertRepo::list_between(&pool, now - Duration::days(365), now)
        .await
        .unwrap();
    assert_eq!(remaining.len(), 1);
    assert_eq!(remaining[0].created_at, old);

    let readings = GpuReadingRepo::list_between(&pool, now - Duration::days(365), now)
        .await
        .unwrap();
    assert_eq!(readings.len(), 1);
    assert_eq!(readings[0].recorded_at, now);
}
