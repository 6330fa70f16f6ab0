use std::collections::BTreeMap;

use axum::extract::State;
use axum::Json;
use sentinel_core::alert::SeverityLevel;
use sentinel_core::config::{DedupScope, DerivedMetric, LevelBound};
use serde::Serialize;

use crate::response::DataResponse;
use crate::state::AppState;

/// The effective alerting configuration.
#[derive(Debug, Serialize)]
pub struct ThresholdsResponse {
    pub severity_levels: Vec<SeverityLevel>,
    pub min_alert_level: SeverityLevel,
    pub thresholds: BTreeMap<String, Vec<LevelBound>>,
    pub derived_metrics: Vec<DerivedMetric>,
    pub alert_metrics: Vec<String>,
    pub cooldown_secs: u64,
    pub dedup_scope: DedupScope,
}

/// GET /api/v1/thresholds
pub async fn get_thresholds(State(state): State<AppState>) -> Json<DataResponse<ThresholdsResponse>> {
    let pipeline = state.service.pipeline();
    let config = state.service.config();

    Json(DataResponse {
        data: ThresholdsResponse {
            severity_levels: pipeline.evaluator().scale().levels().to_vec(),
            min_alert_level: pipeline.min_alert_level().clone(),
            thresholds: config.thresholds.clone(),
            derived_metrics: config.derived_metrics.clone(),
            alert_metrics: config.alert_metrics.clone(),
            cooldown_secs: config.cooldown_secs,
            dedup_scope: config.dedup_scope,
        },
    })
}
