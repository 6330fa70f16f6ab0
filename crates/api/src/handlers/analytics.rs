//! Handlers for historical analytics.
//!
//! Every endpoint reads its window from the store once and computes the
//! result on demand; nothing here is cached.

use std::collections::BTreeMap;

use axum::extract::{Query, State};
use axum::Json;
use sentinel_core::analytics::{
    AnomalyRecord, EfficiencyMetrics, HistoricalStatistics, TrendResult,
};
use sentinel_core::metrics::TimeRange;
use sentinel_core::types::Timestamp;
use serde::Deserialize;

use crate::error::{AppError, AppResult};
use crate::query::{window, DaysParams, HoursParams};
use crate::response::DataResponse;
use crate::state::AppState;

// ---------------------------------------------------------------------------
// Request types
// ---------------------------------------------------------------------------

/// Either `?days=` or an explicit `?start=&end=` pair (RFC 3339).
#[derive(Debug, Deserialize)]
pub struct UsagePatternsQuery {
    pub days: Option<i64>,
    pub start: Option<Timestamp>,
    pub end: Option<Timestamp>,
}

// ---------------------------------------------------------------------------
// Handlers
// ---------------------------------------------------------------------------

/// GET /api/v1/analytics/usage-patterns
pub async fn get_usage_patterns(
    State(state): State<AppState>,
    Query(params): Query<UsagePatternsQuery>,
) -> AppResult<Json<DataResponse<HistoricalStatistics>>> {
    let stats = match (params.start, params.end) {
        (Some(start), Some(end)) => {
            if params.days.is_some() {
                return Err(AppError::BadRequest(
                    "days cannot be combined with start and end".to_string(),
                ));
            }
            let range = TimeRange::new(start, end)?;
            state.service.usage_patterns_between(range).await?
        }
        (None, None) => {
            let days = window(params.days, 7, 1..=90, "days")?;
            state.service.get_usage_patterns(days).await?
        }
        _ => {
            return Err(AppError::BadRequest(
                "start and end must be given together".to_string(),
            ))
        }
    };
    Ok(Json(DataResponse { data: stats }))
}

/// GET /api/v1/analytics/anomalies?hours=
pub async fn get_anomalies(
    State(state): State<AppState>,
    Query(params): Query<HoursParams>,
) -> AppResult<Json<DataResponse<Vec<AnomalyRecord>>>> {
    let hours = window(params.hours, 24, 1..=720, "hours")?;
    let anomalies = state.service.detect_anomalies(hours).await?;
    Ok(Json(DataResponse { data: anomalies }))
}

/// GET /api/v1/analytics/trends?days=
///
/// Metrics with fewer than three samples in the window are omitted.
pub async fn get_trends(
    State(state): State<AppState>,
    Query(params): Query<DaysParams>,
) -> AppResult<Json<DataResponse<BTreeMap<String, TrendResult>>>> {
    let days = window(params.days, 30, 1..=365, "days")?;
    let trends = state.service.analyze_trends(days).await?;
    Ok(Json(DataResponse { data: trends }))
}

/// GET /api/v1/analytics/efficiency?days=
pub async fn get_efficiency(
    State(state): State<AppState>,
    Query(params): Query<DaysParams>,
) -> AppResult<Json<DataResponse<EfficiencyMetrics>>> {
    let days = window(params.days, 7, 1..=90, "days")?;
    let metrics = state.service.efficiency_metrics(days).await?;
    Ok(Json(DataResponse { data: metrics }))
}
