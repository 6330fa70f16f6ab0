//! Periodic cleanup of old readings and alerts.
//!
//! Deletes readings older than `reading_retention_days` and alerts older than
//! `alert_retention_days`. Runs on a fixed interval using `tokio::time::interval`.

use std::sync::Arc;
use std::time::Duration;

use chrono::Utc;
use sentinel_core::service::MonitorService;
use tokio_util::sync::CancellationToken;

/// How often the cleanup job runs.
pub const CLEANUP_INTERVAL: Duration = Duration::from_secs(3600); // 1 hour

/// Run the retention loop until `cancel` is triggered.
///
/// The first pass runs immediately.
pub async fn run(service: Arc<MonitorService>, interval: Duration, cancel: CancellationToken) {
    tracing::info!(
        reading_retention_days = service.config().reading_retention_days,
        alert_retention_days = service.config().alert_retention_days,
        interval_secs = interval.as_secs(),
        "Metrics retention job started"
    );

    let mut ticker = tokio::time::interval(interval);

    loop {
        tokio::select! {
            _ = cancel.cancelled() => {
                tracing::info!("Metrics retention job stopping");
                break;
            }
            _ = ticker.tick() => {
                match service.purge_expired(Utc::now()).await {
                    Ok(counts) => {
                        if counts.readings > 0 || counts.alerts > 0 {
                            tracing::info!(
                                readings = counts.readings,
                                alerts = counts.alerts,
                                "Metrics retention: purged old rows"
                            );
                        } else {
                            tracing::debug!("Metrics retention: no rows to purge");
                        }
                    }
                    Err(e) => {
                        tracing::error!(error = %e, "Metrics retention: cleanup failed");
                    }
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use sentinel_core::config::MonitorConfig;
    use sentinel_core::metrics::EntityReading;
    use sentinel_core::store::memory::InMemoryStore;
    use sentinel_core::store::MetricStore;

    #[tokio::test]
    async fn first_tick_purges_and_cancel_stops() {
        let store = Arc::new(InMemoryStore::new());
        let now = Utc::now();
        store
            .append_readings(&[
                EntityReading::new(0, now - chrono::Duration::days(45)),
                EntityReading::new(0, now),
            ])
            .await
            .unwrap();
        let service = Arc::new(MonitorService::new(MonitorConfig::default(), store.clone()).unwrap());

        let cancel = CancellationToken::new();
        let handle = tokio::spawn(run(service, Duration::from_secs(3600), cancel.clone()));

        // The first tick fires immediately; wait until it has run.
        for _ in 0..100 {
            if store.readings().await.len() == 1 {
                break;
            }
            tokio::time::sleep(Duration::from_millis(10)).await;
        }
        assert_eq!(store.readings().await.len(), 1);

        cancel.cancel();
        tokio::time::timeout(Duration::from_secs(1), handle)
            .await
            .unwrap()
            .unwrap();
    }
}
