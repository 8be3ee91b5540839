//! Repository for the `alerts` table.

use aquawatch_core::{Alert, AlertFilter};
use sqlx::PgPool;

use crate::models::alert::AlertRow;

/// Column list for `alerts` queries.
const COLUMNS: &str = "id, parameter, value, alert_level, severity, title, message, category, \
                       confidence, priority, urgency, remediation, timestamp, created_at";

pub struct AlertRepo;

impl AlertRepo {
    /// Insert a batch of alerts in one transaction. Alerts whose id already
    /// exists are skipped. Returns the number of rows inserted.
    pub async fn insert_batch(pool: &PgPool, alerts: &[Alert]) -> Result<u64, sqlx::Error> {
        let mut tx = pool.begin().await?;
        let mut inserted = 0;

        for alert in alerts {
            let remediation = serde_json::to_value(&alert.remediation)
                .map_err(|e| sqlx::Error::Encode(Box::new(e)))?;

            let result = sqlx::query(
                "INSERT INTO alerts \
                    (id, parameter, value, alert_level, severity, title, message, category, \
                     confidence, priority, urgency, remediation, timestamp, created_at) \
                 VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13, $14) \
                 ON CONFLICT (id) DO NOTHING",
            )
            .bind(&alert.id)
            .bind(&alert.parameter)
            .bind(alert.value)
            .bind(alert.alert_level.as_str())
            .bind(alert.severity.as_str())
            .bind(&alert.title)
            .bind(&alert.message)
            .bind(alert.category.as_str())
            .bind(alert.confidence)
            .bind(alert.priority)
            .bind(alert.urgency.as_str())
            .bind(remediation)
            .bind(alert.timestamp)
            .bind(alert.created_at)
            .execute(&mut *tx)
            .await?;

            inserted += result.rows_affected();
        }

        tx.commit().await?;
        Ok(inserted)
    }

    /// List alerts matching `filter`, highest priority first, newest first
    /// within equal priority.
    pub async fn list(pool: &PgPool, filter: &AlertFilter) -> Result<Vec<AlertRow>, sqlx::Error> {
        let query = format!(
            "SELECT {COLUMNS} FROM alerts \
             WHERE ($1::text IS NULL OR severity = $1) \
               AND ($2::text IS NULL OR lower(parameter) = $2) \
             ORDER BY priority DESC, timestamp DESC \
             LIMIT $3"
        );
        sqlx::query_as::<_, AlertRow>(&query)
            .bind(filter.severity.map(|s| s.as_str()))
            .bind(filter.parameter.as_deref().map(str::to_ascii_lowercase))
            .bind(filter.limit.map(|l| i64::try_from(l).unwrap_or(i64::MAX)))
            .fetch_all(pool)
            .await
    }

    pub async fn count(pool: &PgPool) -> Result<i64, sqlx::Error> {
        sqlx::query_scalar("SELECT COUNT(*) FROM alerts")
            .fetch_one(pool)
            .await
    }
}
