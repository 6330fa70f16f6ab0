//! WebSocket connection and metrics push loop.
//!
//! Connects to the backend WebSocket endpoint, periodically collects
//! GPU metrics via [`MetricsCollector`](crate::collector::MetricsCollector),
//! and pushes them as JSON.

use std::time::Duration;

use chrono::Utc;
use futures::{SinkExt, StreamExt};
use sentinel_core::metric_names::MSG_TYPE_GPU_METRICS;
use sentinel_core::metrics::EntityReading;
use sentinel_core::types::{EntityId, Timestamp};
use serde::Serialize;
use tokio_tungstenite::connect_async;
use tokio_tungstenite::tungstenite::Message;

use crate::collector::{GpuMetrics, MetricsCollector};

/// Reconnection delay after a WebSocket failure.
pub const RECONNECT_DELAY: Duration = Duration::from_secs(5);

#[derive(Debug, thiserror::Error)]
pub enum SendError {
    #[error("failed to encode metrics payload: {0}")]
    Encode(#[from] serde_json::Error),

    #[error("websocket send failed: {0}")]
    Socket(#[from] tokio_tungstenite::tungstenite::Error),
}

/// Outgoing metrics payload sent to the backend.
#[derive(Debug, Serialize)]
pub struct MetricsPayload {
    r#type: &'static str,
    readings: Vec<EntityReading>,
}

impl MetricsPayload {
    /// One reading per GPU, all stamped with the same `timestamp`.
    pub fn new(metrics: &[GpuMetrics], entity_id_base: EntityId, timestamp: Timestamp) -> Self {
        Self {
            r#type: MSG_TYPE_GPU_METRICS,
            readings: metrics
                .iter()
                .map(|m| m.to_reading(entity_id_base, timestamp))
                .collect(),
        }
    }
}

/// Run the metrics push loop indefinitely.
///
/// Reconnects with a fixed delay if the WebSocket connection drops.
pub async fn run(
    ws_url: &str,
    entity_id_base: EntityId,
    interval: Duration,
    collector: &MetricsCollector,
) {
    loop {
        tracing::info!(url = %ws_url, "Connecting to backend WebSocket");

        match connect_async(ws_url).await {
            Ok((ws_stream, _response)) => {
                tracing::info!("WebSocket connected");
                run_session(ws_stream, entity_id_base, interval, collector).await;
                tracing::warn!("WebSocket session ended, reconnecting");
            }
            Err(e) => {
                tracing::error!(error = %e, "WebSocket connection failed");
            }
        }

        tokio::time::sleep(RECONNECT_DELAY).await;
    }
}

/// Drive a single WebSocket session: push metrics on a timer and watch
/// the stream for the backend closing the connection.
async fn run_session(
    ws_stream: tokio_tungstenite::WebSocketStream<
        tokio_tungstenite::MaybeTlsStream<tokio::net::TcpStream>,
    >,
    entity_id_base: EntityId,
    interval: Duration,
    collector: &MetricsCollector,
) {
    let (mut sink, mut stream) = ws_stream.split();
    let mut ticker = tokio::time::interval(interval);

    loop {
        tokio::select! {
            _ = ticker.tick() => {
                if let Err(e) = send_metrics(&mut sink, entity_id_base, collector).await {
                    tracing::error!(error = %e, "Failed to send metrics");
                    break;
                }
            }
            msg = stream.next() => {
                match msg {
                    Some(Ok(Message::Close(frame))) => {
                        tracing::info!(?frame, "Backend closed WebSocket");
                        break;
                    }
                    Some(Ok(_)) => {} // the backend sends nothing we act on
                    Some(Err(e)) => {
                        tracing::error!(error = %e, "WebSocket receive error");
                        break;
                    }
                    None => {
                        tracing::info!("WebSocket stream exhausted");
                        break;
                    }
                }
            }
        }
    }
}

/// Collect metrics and send them as a JSON text frame.
async fn send_metrics<S>(
    sink: &mut S,
    entity_id_base: EntityId,
    collector: &MetricsCollector,
) -> Result<(), SendError>
where
    S: SinkExt<Message, Error = tokio_tungstenite::tungstenite::Error> + Unpin,
{
    let metrics = collector.collect();
    if metrics.is_empty() {
        tracing::debug!("No GPU metrics to send");
        return Ok(());
    }

    let payload = MetricsPayload::new(&metrics, entity_id_base, Utc::now());
    let json = serde_json::to_string(&payload)?;
    tracing::debug!(gpus = metrics.len(), "Sending GPU metrics");
    sink.send(Message::Text(json)).await?;
    Ok(())
}
