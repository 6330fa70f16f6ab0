//! Repository for the `alert_history` table.

use sentinel_core::alert::AlertEvent;
use sentinel_core::types::Timestamp;
use sqlx::PgPool;

use crate::models::hardware::AlertRow;

const COLUMNS: &str = "\
    id, entity_id, metric_name, metric_value, threshold_value, \
    severity, severity_rank, created_at";

const INSERT_COLUMNS: &str = "\
    entity_id, metric_name, metric_value, threshold_value, \
    severity, severity_rank, created_at";

const PARAMS_PER_ROW: u32 = 7;

pub struct AlertRepo;

impl AlertRepo {
    /// Insert every alert of one pipeline pass in a single statement.
    pub async fn insert_batch(pool: &PgPool, alerts: &[AlertEvent]) -> Result<(), sqlx::Error> {
        if alerts.is_empty() {
            return Ok(());
        }

        let mut query = format!("INSERT INTO alert_history ({INSERT_COLUMNS}) VALUES ");
        let mut param_idx = 1u32;
        for i in 0..alerts.len() {
            if i > 0 {
                query.push_str(", ");
            }
            query.push('(');
            for j in 0..PARAMS_PER_ROW {
                if j > 0 {
                    query.push_str(", ");
                }
                query.push('$');
                query.push_str(&param_idx.to_string());
                param_idx += 1;
            }
            query.push(')');
        }

        let mut q = sqlx::query(&query);
        for a in alerts {
            q = q
                .bind(a.entity_id)
                .bind(&a.metric_name)
                .bind(a.value)
                .bind(a.threshold_crossed)
                .bind(&a.severity.name)
                .bind(i16::from(a.severity.rank))
                .bind(a.timestamp);
        }

        q.execute(pool).await?;
        Ok(())
    }

    /// Alerts created inside `[start, end]`, newest first.
    pub async fn list_between(
        pool: &PgPool,
        start: Timestamp,
        end: Timestamp,
    ) -> Result<Vec<AlertRow>, sqlx::Error> {
        let query = format!(
            "SELECT {COLUMNS} FROM alert_history \
             WHERE created_at >= $1 AND created_at <= $2 \
             ORDER BY created_at DESC, id DESC"
        );
        sqlx::query_as::<_, AlertRow>(&query)
            .bind(start)
            .bind(end)
            .fetch_all(pool)
            .await
    }

    pub async fn delete_older_than(pool: &PgPool, cutoff: Timestamp) -> Result<u64, sqlx::Error> {
        let result = sqlx::query("DELETE FROM alert_history WHERE created_at < $1")
            .bind(cutoff)
            .execute(pool)
            .await?;
        Ok(result.rows_affected())
    }
}
