//! Handlers for recent alert history.

use axum::extract::{Query, State};
use axum::Json;
use sentinel_core::alert::AlertEvent;

use crate::error::AppResult;
use crate::query::{window, HoursParams};
use crate::response::DataResponse;
use crate::state::AppState;

/// GET /api/v1/alerts?hours=
///
/// Alerts from the last `hours` (1-168, default 24), newest first.
pub async fn list_recent_alerts(
    State(state): State<AppState>,
    Query(params): Query<HoursParams>,
) -> AppResult<Json<DataResponse<Vec<AlertEvent>>>> {
    let hours = window(params.hours, 24, 1..=168, "hours")?;
    let alerts = state.service.get_recent_alerts(hours).await?;
    Ok(Json(DataResponse { data: alerts }))
}
