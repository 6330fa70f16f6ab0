pub mod alerts;
pub mod analytics;
pub mod health;
pub mod ingest;
pub mod logging;

use axum::routing::get;
use axum::Router;

use crate::handlers;
use crate::state::AppState;

/// Build the `/api/v1` route tree.
///
/// Route hierarchy:
///
/// ```text
/// /alerts                        recent alert history
/// /analytics/usage-patterns      hourly/daily averages, peaks, distribution
/// /analytics/anomalies           z-score outliers
/// /analytics/trends              per-metric regression
/// /analytics/efficiency          power and memory ratios
/// /thresholds                    effective alerting configuration
/// /metrics                       reading ingestion (POST)
/// /metrics/history               stored readings in a window
/// /metrics/latest                newest reading per entity
/// /logging/status                sample logging state
/// /logging/toggle                flip sample logging (POST)
/// ```
pub fn api_routes() -> Router<AppState> {
    Router::new()
        .nest("/alerts", alerts::router())
        .nest("/analytics", analytics::router())
        .route("/thresholds", get(handlers::thresholds::get_thresholds))
        .nest("/metrics", ingest::router())
        .nest("/logging", logging::router())
}
