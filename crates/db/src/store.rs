//! [`AlertStore`] backed by Postgres.

use aquawatch_core::{Alert, AlertFilter, AlertStore, StoreError};
use async_trait::async_trait;

use crate::repositories::AlertRepo;
use crate::DbPool;

pub struct PgAlertStore {
    pool: DbPool,
}

impl PgAlertStore {
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }

    pub fn pool(&self) -> &DbPool {
        &self.pool
    }
}

/// Connection-level failures are "unavailable"; everything else is a
/// backend error.
pub fn store_error(err: sqlx::Error) -> StoreError {
    match err {
        sqlx::Error::PoolTimedOut | sqlx::Error::PoolClosed | sqlx::Error::Io(_) => {
            StoreError::Unavailable(err.to_string())
        }
        other => StoreError::Backend(other.to_string()),
    }
}

#[async_trait]
impl AlertStore for PgAlertStore {
    async fn save_alerts(&self, alerts: &[Alert]) -> Result<(), StoreError> {
        let inserted = AlertRepo::insert_batch(&self.pool, alerts)
            .await
            .map_err(store_error)?;
        tracing::debug!(inserted, "Saved alerts");
        Ok(())
    }

    async fn query(&self, filter: &AlertFilter) -> Result<Vec<Alert>, StoreError> {
        let rows = AlertRepo::list(&self.pool, filter)
            .await
            .map_err(store_error)?;

        rows.into_iter()
            .map(|row| Alert::try_from(row).map_err(|e| StoreError::Backend(e.to_string())))
            .collect()
    }
}
