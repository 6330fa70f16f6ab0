//! Handlers for the raw sample logging switch.
//!
//! While logging is off, readings are still evaluated for alerts but are
//! not written to the store, so analytics will not see them.

use axum::extract::State;
use axum::Json;
use serde::Serialize;

use crate::response::DataResponse;
use crate::state::AppState;

#[derive(Debug, Serialize)]
pub struct LoggingStatus {
    pub enabled: bool,
}

/// GET /api/v1/logging/status
pub async fn get_status(State(state): State<AppState>) -> Json<DataResponse<LoggingStatus>> {
    Json(DataResponse {
        data: LoggingStatus {
            enabled: state.service.sample_logging_enabled(),
        },
    })
}

/// POST /api/v1/logging/toggle
pub async fn toggle(State(state): State<AppState>) -> Json<DataResponse<LoggingStatus>> {
    let enabled = state.service.toggle_sample_logging();
    Json(DataResponse {
        data: LoggingStatus { enabled },
    })
}
