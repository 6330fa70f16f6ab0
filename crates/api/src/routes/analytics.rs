//! Route definitions for historical analytics.

use axum::routing::get;
use axum::Router;

use crate::handlers::analytics;
use crate::state::AppState;

/// Routes mounted at `/analytics`.
///
/// ```text
/// GET /usage-patterns   -> get_usage_patterns
/// GET /anomalies        -> get_anomalies
/// GET /trends           -> get_trends
/// GET /efficiency       -> get_efficiency
/// ```
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/usage-patterns", get(analytics::get_usage_patterns))
        .route("/anomalies", get(analytics::get_anomalies))
        .route("/trends", get(analytics::get_trends))
        .route("/efficiency", get(analytics::get_efficiency))
}
