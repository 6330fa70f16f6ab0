//! `sentinel-agent` -- lightweight GPU metrics daemon.
//!
//! Runs on GPU hosts, collects NVIDIA GPU metrics via NVML, and pushes
//! them to the sentinel API over WebSocket.
//!
//! # Environment variables
//!
//! | Variable               | Required | Default | Description                           |
//! |------------------------|----------|---------|---------------------------------------|
//! | `BACKEND_WS_URL`       | yes      | --      | WebSocket endpoint, e.g. `ws://host:3000/ws/metrics` |
//! | `ENTITY_ID_BASE`       | no       | `0`     | Added to each GPU index to form its entity id |
//! | `METRICS_INTERVAL_SECS`| no       | `5`     | Seconds between metric pushes         |

use std::time::Duration;

use sentinel_agent::collector;
use sentinel_agent::sender;

use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

/// Default interval between metrics collection + push cycles.
const DEFAULT_INTERVAL_SECS: u64 = 5;

#[tokio::main]
async fn main() {
    dotenvy::dotenv().ok();

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "sentinel_agent=info".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let ws_url = std::env::var("BACKEND_WS_URL").unwrap_or_else(|_| {
        tracing::error!("BACKEND_WS_URL environment variable is required");
        std::process::exit(1);
    });

    let entity_id_base: i64 = match std::env::var("ENTITY_ID_BASE") {
        Ok(raw) => raw.parse().unwrap_or_else(|_| {
            tracing::error!("ENTITY_ID_BASE must be a valid integer");
            std::process::exit(1);
        }),
        Err(_) => 0,
    };

    let interval_secs: u64 = std::env::var("METRICS_INTERVAL_SECS")
        .ok()
        .and_then(|v| v.parse().ok())
        .filter(|secs| *secs > 0)
        .unwrap_or(DEFAULT_INTERVAL_SECS);

    let interval = Duration::from_secs(interval_secs);

    tracing::info!(
        entity_id_base,
        ws_url = %ws_url,
        interval_secs,
        "Starting sentinel-agent",
    );

    let collector = collector::MetricsCollector::new();

    tracing::info!(gpu_count = collector.gpu_count(), "GPU detection complete");

    sender::run(&ws_url, entity_id_base, interval, &collector).await;
}
