//! Process-local alert store, used when no database is configured.

use std::sync::{PoisonError, RwLock};

use aquawatch_core::priority::sort_by_priority;
use aquawatch_core::{Alert, AlertFilter, AlertStore, StoreError};
use async_trait::async_trait;

#[derive(Debug, Default)]
pub struct InMemoryAlertStore {
    alerts: RwLock<Vec<Alert>>,
}

impl InMemoryAlertStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.alerts.read().unwrap_or_else(PoisonError::into_inner).len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Every stored alert, in insertion order.
    pub fn all(&self) -> Vec<Alert> {
        self.alerts
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }
}

#[async_trait]
impl AlertStore for InMemoryAlertStore {
    async fn save_alerts(&self, alerts: &[Alert]) -> Result<(), StoreError> {
        self.alerts
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .extend_from_slice(alerts);
        Ok(())
    }

    async fn query(&self, filter: &AlertFilter) -> Result<Vec<Alert>, StoreError> {
        let mut matched: Vec<Alert> = self
            .alerts
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .iter()
            .filter(|a| filter.matches(a))
            .cloned()
            .collect();

        sort_by_priority(&mut matched);
        if let Some(limit) = filter.limit {
            matched.truncate(limit);
        }
        Ok(matched)
    }
}
