//! Repository for the `gpu_readings` table (append-only time-series).

use sentinel_core::metrics::EntityReading;
use sentinel_core::types::Timestamp;
use sqlx::types::Json;
use sqlx::PgPool;

use crate::models::hardware::GpuReadingRow;

/// Column list for `gpu_readings` SELECT queries (includes `id` and `created_at`).
const COLUMNS: &str = "id, entity_id, readings, recorded_at, created_at";

/// Column list for `gpu_readings` INSERT statements (excludes auto-generated `id` and `created_at`).
const INSERT_COLUMNS: &str = "entity_id, readings, recorded_at";

const PARAMS_PER_ROW: u32 = 3;

pub struct GpuReadingRepo;

impl GpuReadingRepo {
    /// Batch-insert readings with a single multi-row INSERT.
    pub async fn insert_batch(pool: &PgPool, readings: &[EntityReading]) -> Result<(), sqlx::Error> {
        if readings.is_empty() {
            return Ok(());
        }

        let mut query = format!("INSERT INTO gpu_readings ({INSERT_COLUMNS}) VALUES ");
        let mut param_idx = 1u32;
        for i in 0..readings.len() {
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
        for r in readings {
            q = q
                .bind(r.entity_id)
                .bind(Json(&r.values))
                .bind(r.timestamp);
        }

        q.execute(pool).await?;
        Ok(())
    }

    /// Rows recorded inside `[start, end]`, oldest first, ties by entity.
    pub async fn list_between(
        pool: &PgPool,
        start: Timestamp,
        end: Timestamp,
    ) -> Result<Vec<GpuReadingRow>, sqlx::Error> {
        let query = format!(
            "SELECT {COLUMNS} FROM gpu_readings \
             WHERE recorded_at >= $1 AND recorded_at <= $2 \
             ORDER BY recorded_at ASC, entity_id ASC, id ASC"
        );
        sqlx::query_as::<_, GpuReadingRow>(&query)
            .bind(start)
            .bind(end)
            .fetch_all(pool)
            .await
    }

    /// Delete readings older than the given cutoff timestamp.
    ///
    /// Returns the number of rows deleted.
    pub async fn delete_older_than(pool: &PgPool, cutoff: Timestamp) -> Result<u64, sqlx::Error> {
        let result = sqlx::query("DELETE FROM gpu_readings WHERE recorded_at < $1")
            .bind(cutoff)
            .execute(pool)
            .await?;
        Ok(result.rows_affected())
    }
}
