//! Reading ingestion.
//!
//! Includes:
//! - REST endpoint for pushing a batch of readings.
//! - WebSocket endpoint for the sampler agent.
//!
//! Both paths feed the same `MonitorService`, so cooldown state is shared
//! across every connection.

use axum::extract::ws::{Message, WebSocket, WebSocketUpgrade};
use axum::extract::State;
use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::Json;
use futures::StreamExt;
use sentinel_core::alert::AlertEvent;
use sentinel_core::metric_names::MSG_TYPE_GPU_METRICS;
use sentinel_core::metrics::EntityReading;
use serde::Deserialize;

use crate::error::{AppError, AppResult};
use crate::response::DataResponse;
use crate::state::AppState;

/// Upper bound on readings accepted in one request or message.
pub const MAX_BATCH_READINGS: usize = 1024;

// ---------------------------------------------------------------------------
// Request types
// ---------------------------------------------------------------------------

/// Request body for `POST /api/v1/metrics`.
#[derive(Debug, Deserialize)]
pub struct IngestRequest {
    pub readings: Vec<EntityReading>,
}

/// Message pushed by the agent over `/ws/metrics`.
#[derive(Debug, Deserialize)]
pub struct AgentMetricsMessage {
    #[serde(rename = "type")]
    pub msg_type: String,
    pub readings: Vec<EntityReading>,
}

fn check_batch(readings: &[EntityReading]) -> AppResult<()> {
    if readings.len() > MAX_BATCH_READINGS {
        return Err(AppError::BadRequest(format!(
            "at most {MAX_BATCH_READINGS} readings per batch, got {}",
            readings.len()
        )));
    }
    Ok(())
}

// ---------------------------------------------------------------------------
// REST
// ---------------------------------------------------------------------------

/// POST /api/v1/metrics
///
/// Record a batch of readings and return the alerts it produced.
pub async fn ingest_metrics(
    State(state): State<AppState>,
    Json(body): Json<IngestRequest>,
) -> AppResult<(StatusCode, Json<DataResponse<Vec<AlertEvent>>>)> {
    check_batch(&body.readings)?;
    let alerts = state.service.ingest(&body.readings).await;
    Ok((StatusCode::CREATED, Json(DataResponse { data: alerts })))
}

// ---------------------------------------------------------------------------
// WebSocket
// ---------------------------------------------------------------------------

/// GET /ws/metrics
pub async fn metrics_ws_handler(
    ws: WebSocketUpgrade,
    State(state): State<AppState>,
) -> impl IntoResponse {
    ws.on_upgrade(move |socket| handle_metrics_socket(socket, state))
}

/// Process an agent metrics WebSocket connection.
async fn handle_metrics_socket(socket: WebSocket, state: AppState) {
    let conn_id = uuid::Uuid::new_v4().to_string();
    tracing::info!(conn_id = %conn_id, "Metrics WebSocket connected");

    let (_sink, mut stream) = socket.split();

    while let Some(result) = stream.next().await {
        match result {
            Ok(Message::Text(text)) => match process_metrics_message(&text, &state).await {
                Ok(alerts) => {
                    tracing::debug!(conn_id = %conn_id, alerts, "Metrics message processed");
                }
                Err(e) => {
                    tracing::warn!(
                        conn_id = %conn_id,
                        error = %e,
                        "Failed to process metrics message"
                    );
                }
            },
            Ok(Message::Close(_)) => break,
            Ok(_) => {} // ignore binary, ping, pong
            Err(e) => {
                tracing::debug!(conn_id = %conn_id, error = %e, "Metrics WS receive error");
                break;
            }
        }
    }

    tracing::info!(conn_id = %conn_id, "Metrics WebSocket disconnected");
}

/// Parse and ingest a single agent message. Returns the number of alerts.
pub async fn process_metrics_message(text: &str, state: &AppState) -> AppResult<usize> {
    let msg: AgentMetricsMessage = serde_json::from_str(text)
        .map_err(|e| AppError::BadRequest(format!("Invalid JSON: {e}")))?;

    if msg.msg_type != MSG_TYPE_GPU_METRICS {
        return Err(AppError::BadRequest(format!(
            "Unknown message type: {}",
            msg.msg_type
        )));
    }
    check_batch(&msg.readings)?;

    let alerts = state.service.ingest(&msg.readings).await;
    Ok(alerts.len())
}
