use axum::routing::{get, post};
use axum::Router;

use crate::handlers::{history, ingest};
use crate::state::AppState;

/// Routes mounted at `/metrics`.
///
/// ```text
/// POST /          -> ingest_metrics
/// GET  /history   -> get_history
/// GET  /latest    -> get_latest
/// ```
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/", post(ingest::ingest_metrics))
        .route("/history", get(history::get_history))
        .route("/latest", get(history::get_latest))
}

/// Agent WebSocket, mounted at the root (not under `/api/v1`).
pub fn ws_router() -> Router<AppState> {
    Router::new().route("/ws/metrics", get(ingest::metrics_ws_handler))
}
