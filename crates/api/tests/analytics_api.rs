//! Integration tests for the analytics, thresholds, and logging endpoints.

mod common;

use axum::http::StatusCode;
use chrono::{Duration, Utc};
use common::{body_json, get, post_empty};
use sentinel_core::metrics::EntityReading;
use sentinel_core::store::MetricStore;

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

/// Seed one reading per minute for the last `n` minutes with rising
/// utilization and constant power.
async fn seed(store: &sentinel_core::store::memory::InMemoryStore, n: i64) {
    let now = Utc::now();
    let readings: Vec<EntityReading> = (0..n)
        .map(|i| {
            EntityReading::new(0, now - Duration::minutes(n - i))
                .with("utilization", (i % 100) as f64)
                .with("temperature", 50.0)
                .with("power_draw", 200.0)
                .with("memory_used", 2048.0)
                .with("memory_total", 8192.0)
        })
        .collect();
    store.append_readings(&readings).await.unwrap();
}

// ---------------------------------------------------------------------------
// Usage patterns
// ---------------------------------------------------------------------------

#[tokio::test]
async fn usage_patterns_for_recent_days() {
    let (state, store) = common::test_state();
    seed(&store, 60).await;
    let app = common::build_test_app(state);

    let response = get(app, "/api/v1/analytics/usage-patterns?days=1").await;
    assert_eq!(response.status(), StatusCode::OK);

    let json = body_json(response).await;
    let data = &json["data"];
    assert!(data["hourly_avg"]["utilization"].is_object());
    assert_eq!(data["hourly_avg"]["temperature"].as_object().unwrap().values().next().unwrap(), 50.0);
    assert_eq!(data["utilization_distribution"].as_array().unwrap().len(), 5);
    assert_eq!(data["peak_usage_times"][0]["metric"], "utilization");
}

#[tokio::test]
async fn usage_patterns_empty_store_is_empty() {
    let (state, _store) = common::test_state();
    let app = common::build_test_app(state);

    let json = body_json(get(app, "/api/v1/analytics/usage-patterns").await).await;
    assert!(json["data"]["hourly_avg"].as_object().unwrap().is_empty());
    assert!(json["data"]["utilization_distribution"].as_array().unwrap().is_empty());
}

#[tokio::test]
async fn usage_patterns_explicit_range() {
    let (state, store) = common::test_state();
    seed(&store, 10).await;
    let app = common::build_test_app(state);

    let start = (Utc::now() - Duration::hours(1)).format("%Y-%m-%dT%H:%M:%SZ");
    let end = Utc::now().format("%Y-%m-%dT%H:%M:%SZ");
    let uri = format!("/api/v1/analytics/usage-patterns?start={start}&end={end}");

    let response = get(app, &uri).await;
    assert_eq!(response.status(), StatusCode::OK);
    let json = body_json(response).await;
    assert!(json["data"]["hourly_avg"]["utilization"].is_object());
}

#[tokio::test]
async fn inverted_range_returns_400() {
    let (state, _store) = common::test_state();
    let app = common::build_test_app(state);

    let response = get(
        app,
        "/api/v1/analytics/usage-patterns?start=2024-01-02T00:00:00Z&end=2024-01-01T00:00:00Z",
    )
    .await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    assert_eq!(body_json(response).await["code"], "VALIDATION_ERROR");
}

#[tokio::test]
async fn half_open_range_returns_400() {
    let (state, _store) = common::test_state();
    let app = common::build_test_app(state);

    let response = get(
        app,
        "/api/v1/analytics/usage-patterns?start=2024-01-01T00:00:00Z",
    )
    .await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

// ---------------------------------------------------------------------------
// Anomalies, trends, efficiency
// ---------------------------------------------------------------------------

#[tokio::test]
async fn anomalies_flag_outlier() {
    let (state, store) = common::test_state();
    let now = Utc::now();
    let mut readings: Vec<EntityReading> = (0..40)
        .map(|i| {
            let value = if i % 2 == 0 { 49.0 } else { 51.0 };
            EntityReading::new(0, now - Duration::minutes(50 - i)).with("temperature", value)
        })
        .collect();
    readings.push(EntityReading::new(0, now - Duration::minutes(5)).with("temperature", 80.0));
    store.append_readings(&readings).await.unwrap();
    let app = common::build_test_app(state);

    let json = body_json(get(app, "/api/v1/analytics/anomalies?hours=2").await).await;
    let anomalies = json["data"].as_array().unwrap();
    assert_eq!(anomalies.len(), 1);
    assert_eq!(anomalies[0]["value"], 80.0);
    assert_eq!(anomalies[0]["metric"], "temperature");
}

#[tokio::test]
async fn trends_report_rising_utilization() {
    let (state, store) = common::test_state();
    seed(&store, 30).await;
    let app = common::build_test_app(state);

    let json = body_json(get(app, "/api/v1/analytics/trends?days=1").await).await;
    let utilization = &json["data"]["utilization"];
    assert_eq!(utilization["direction"], "increasing");
    assert_eq!(utilization["significant"], true);
    assert_eq!(json["data"]["temperature"]["direction"], "flat");
}

#[tokio::test]
async fn trends_days_out_of_range_returns_400() {
    let (state, _store) = common::test_state();
    let app = common::build_test_app(state);
    let response = get(app, "/api/v1/analytics/trends?days=366").await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn efficiency_ratios() {
    let (state, store) = common::test_state();
    seed(&store, 10).await;
    let app = common::build_test_app(state);

    let json = body_json(get(app, "/api/v1/analytics/efficiency?days=1").await).await;
    let memory = &json["data"]["memory_efficiency"];
    assert_eq!(memory["average"], 25.0);
    assert_eq!(memory["samples"], 10);
    assert_eq!(json["data"]["power_efficiency"]["samples"], 10);
}

// ---------------------------------------------------------------------------
// Thresholds and logging
// ---------------------------------------------------------------------------

#[tokio::test]
async fn thresholds_expose_effective_configuration() {
    let (state, _store) = common::test_state();
    let app = common::build_test_app(state);

    let json = body_json(get(app, "/api/v1/thresholds").await).await;
    let data = &json["data"];
    assert_eq!(data["severity_levels"].as_array().unwrap().len(), 3);
    assert_eq!(data["min_alert_level"]["name"], "warning");
    assert_eq!(data["thresholds"]["temperature"][1]["lower_bound"], 90.0);
    assert_eq!(data["cooldown_secs"], 300);
    assert_eq!(data["dedup_scope"], "per_severity");
}

#[tokio::test]
async fn logging_toggle_round_trip() {
    let (state, _store) = common::test_state();
    let app = common::build_test_app(state);

    let json = body_json(get(app.clone(), "/api/v1/logging/status").await).await;
    assert_eq!(json["data"]["enabled"], true);

    let json = body_json(post_empty(app.clone(), "/api/v1/logging/toggle").await).await;
    assert_eq!(json["data"]["enabled"], false);

    let json = body_json(get(app, "/api/v1/logging/status").await).await;
    assert_eq!(json["data"]["enabled"], false);
}
