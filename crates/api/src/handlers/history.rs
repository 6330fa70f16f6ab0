//! Handlers for raw reading history and the current per-entity snapshot.

use axum::extract::{Query, State};
use axum::Json;
use chrono::Utc;
use sentinel_core::metrics::{EntityReading, TimeRange};
use sentinel_core::types::Timestamp;
use serde::Deserialize;

use crate::error::{AppError, AppResult};
use crate::query::window;
use crate::response::DataResponse;
use crate::state::AppState;

/// `?start=&end=` (RFC 3339) or `?hours=`.
///
/// A missing `end` means now; a missing `start` means `hours` before `end`.
#[derive(Debug, Deserialize)]
pub struct HistoryQuery {
    pub start: Option<Timestamp>,
    pub end: Option<Timestamp>,
    pub hours: Option<i64>,
}

impl HistoryQuery {
    fn range(&self, now: Timestamp) -> AppResult<TimeRange> {
        let end = self.end.unwrap_or(now);
        match self.start {
            Some(start) => {
                if self.hours.is_some() {
                    return Err(AppError::BadRequest(
                        "hours cannot be combined with start".to_string(),
                    ));
                }
                Ok(TimeRange::new(start, end)?)
            }
            None => {
                let hours = window(self.hours, 24, 1..=168, "hours")?;
                Ok(TimeRange::hours_before(hours, end)?)
            }
        }
    }
}

/// GET /api/v1/metrics/history
///
/// Stored readings in the window, oldest first.
pub async fn get_history(
    State(state): State<AppState>,
    Query(params): Query<HistoryQuery>,
) -> AppResult<Json<DataResponse<Vec<EntityReading>>>> {
    let range = params.range(Utc::now())?;
    let readings = state.service.get_history(range).await?;
    Ok(Json(DataResponse { data: readings }))
}

/// GET /api/v1/metrics/latest
///
/// The newest reading per entity seen by this process, ordered by entity.
pub async fn get_latest(
    State(state): State<AppState>,
) -> Json<DataResponse<Vec<EntityReading>>> {
    Json(DataResponse {
        data: state.service.latest_readings(),
    })
}
