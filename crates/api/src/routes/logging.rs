use axum::routing::{get, post};
use axum::Router;

use crate::handlers::logging;
use crate::state::AppState;

/// Routes mounted at `/logging`.
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/status", get(logging::get_status))
        .route("/toggle", post(logging::toggle))
}
