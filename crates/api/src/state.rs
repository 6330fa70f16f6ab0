use std::sync::Arc;

use sentinel_core::service::MonitorService;

use crate::config::ServerConfig;

/// Shared application state available to all Axum handlers via `State<AppState>`.
///
/// This is cheaply cloneable (inner data is behind `Arc`).
#[derive(Clone)]
pub struct AppState {
    /// Alerting pipeline, analytics, and the store behind them.
    pub service: Arc<MonitorService>,
    pub config: Arc<ServerConfig>,
}
